//! Join node.
//!
//! Each input tuple is indexed by its side of the joiner chain and keeps, in
//! its store, the list of output tuples it takes part in. Each output tuple
//! keeps its two parents and its entry in each parent's list, so retracting
//! an input only visits the outputs it owns.

use std::collections::HashMap;
use std::sync::Arc;

use super::{DirtyQueue, Event, NodeStats, Side};
use crate::joiner::{JoinIndex, JoinPlan};
use crate::tuple::{Facts, JoinSlot, ListEntry, StoreValue, TupleArena, TupleId, TupleList};

// Store slots of output tuples.
const LEFT_PARENT: usize = 0;
const RIGHT_PARENT: usize = 1;

#[derive(Debug)]
pub(crate) struct JoinDef {
    pub plan: JoinPlan,
    /// Slot in the store of the left origin.
    pub left_slot: usize,
    /// Slot in the store of the right origin; differs from `left_slot` even
    /// when both sides share their origin.
    pub right_slot: usize,
}

#[derive(Debug)]
pub(crate) struct JoinNode {
    def: Arc<JoinDef>,
    store_size: usize,
    left: JoinIndex<TupleId>,
    right: JoinIndex<TupleId>,
    pub(super) queue: DirtyQueue<TupleId>,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    fn parent_slot(self) -> usize {
        match self {
            Side::Left => LEFT_PARENT,
            Side::Right => RIGHT_PARENT,
        }
    }

    /// Orders `(own, other)` as `(left, right)`.
    fn order<T>(self, own: T, other: T) -> (T, T) {
        match self {
            Side::Left => (own, other),
            Side::Right => (other, own),
        }
    }
}

impl JoinNode {
    pub fn new(def: Arc<JoinDef>, store_size: usize) -> Self {
        Self {
            def,
            store_size,
            left: JoinIndex::default(),
            right: JoinIndex::default(),
            queue: DirtyQueue::default(),
        }
    }

    fn slot(&self, side: Side) -> usize {
        match side {
            Side::Left => self.def.left_slot,
            Side::Right => self.def.right_slot,
        }
    }

    pub fn receive(&mut self, arena: &mut TupleArena, side: Side, tuple: TupleId, event: Event) {
        match event {
            Event::Insert => self.insert(arena, side, tuple),
            Event::Update => self.update(arena, side, tuple),
            Event::Retract => self.retract(arena, side, tuple),
        }
    }

    fn insert(&mut self, arena: &mut TupleArena, side: Side, tuple: TupleId) {
        let def = Arc::clone(&self.def);
        let plan = &def.plan;
        let (key, own, other) = match side {
            Side::Left => (plan.left_key(arena.facts(tuple)), &mut self.left, &self.right),
            Side::Right => (plan.right_key(arena.facts(tuple)), &mut self.right, &self.left),
        };
        let entry = own.put(&key, tuple);
        let candidates = other.candidates(&key, plan.range_op(), side == Side::Left);
        arena.set_slot(
            tuple,
            self.slot(side),
            StoreValue::Joined(Box::new(JoinSlot {
                key,
                entry,
                outs: TupleList::new(),
            })),
        );
        for candidate in candidates {
            let (left, right) = side.order(tuple, candidate);
            if plan.test(arena.facts(left), arena.facts(right)) {
                self.create_out(arena, left, right);
            }
        }
    }

    fn update(&mut self, arena: &mut TupleArena, side: Side, tuple: TupleId) {
        let def = Arc::clone(&self.def);
        let plan = &def.plan;
        let key = match side {
            Side::Left => plan.left_key(arena.facts(tuple)),
            Side::Right => plan.right_key(arena.facts(tuple)),
        };
        if joined(arena, tuple, self.slot(side)).key != key {
            self.retract(arena, side, tuple);
            self.insert(arena, side, tuple);
            return;
        }

        let outs = joined(arena, tuple, self.slot(side)).outs.to_vec();
        if !plan.has_tests() {
            for out in outs {
                self.refresh_out(arena, out);
            }
            return;
        }

        // Same key: the candidates are unchanged, the residual joiners may
        // not be.
        let other_parent = side.other().parent_slot();
        let mut existing: HashMap<TupleId, TupleId> = outs
            .into_iter()
            .map(|out| (parent_of(arena, out, other_parent).0, out))
            .collect();
        let candidates = match side {
            Side::Left => self.right.candidates(&key, plan.range_op(), true),
            Side::Right => self.left.candidates(&key, plan.range_op(), false),
        };
        for candidate in candidates {
            let (left, right) = side.order(tuple, candidate);
            let matches = plan.test(arena.facts(left), arena.facts(right));
            match (existing.remove(&candidate), matches) {
                (Some(out), true) => self.refresh_out(arena, out),
                (Some(out), false) => {
                    self.unlink(arena, out, Side::Left);
                    self.unlink(arena, out, Side::Right);
                    self.kill_out(arena, out);
                }
                (None, true) => self.create_out(arena, left, right),
                (None, false) => {}
            }
        }
        debug_assert!(existing.is_empty(), "join outputs without an indexed partner");
    }

    fn retract(&mut self, arena: &mut TupleArena, side: Side, tuple: TupleId) {
        let slot = match arena.take_slot(tuple, self.slot(side)) {
            StoreValue::Joined(slot) => slot,
            other => panic!("Impossible state: join slot holds {:?}", other),
        };
        let JoinSlot { key, entry, mut outs } = *slot;
        match side {
            Side::Left => self.left.remove(&key, entry),
            Side::Right => self.right.remove(&key, entry),
        };
        for out in outs.drain() {
            self.unlink(arena, out, side.other());
            self.kill_out(arena, out);
        }
    }

    fn create_out(&mut self, arena: &mut TupleArena, left: TupleId, right: TupleId) {
        let facts: Facts = arena
            .facts(left)
            .iter()
            .chain(arena.facts(right))
            .cloned()
            .collect();
        let out = arena.create(facts, self.store_size);
        let left_entry = joined_mut(arena, left, self.def.left_slot).outs.add(out);
        let right_entry = joined_mut(arena, right, self.def.right_slot).outs.add(out);
        arena.set_slot(
            out,
            LEFT_PARENT,
            StoreValue::Parent {
                parent: left,
                entry: left_entry,
            },
        );
        arena.set_slot(
            out,
            RIGHT_PARENT,
            StoreValue::Parent {
                parent: right,
                entry: right_entry,
            },
        );
        self.queue.push(out);
    }

    fn refresh_out(&mut self, arena: &mut TupleArena, out: TupleId) {
        let (left, _) = parent_of(arena, out, LEFT_PARENT);
        let (right, _) = parent_of(arena, out, RIGHT_PARENT);
        let facts: Facts = arena
            .facts(left)
            .iter()
            .chain(arena.facts(right))
            .cloned()
            .collect();
        arena.set_facts(out, facts);
        if arena.state_mut(out).mark_updated() {
            self.queue.push(out);
        }
    }

    /// Removes `out` from the list of its parent on `side`.
    fn unlink(&self, arena: &mut TupleArena, out: TupleId, side: Side) {
        let (parent, entry) = parent_of(arena, out, side.parent_slot());
        joined_mut(arena, parent, self.slot(side)).outs.remove(entry);
    }

    fn kill_out(&mut self, arena: &mut TupleArena, out: TupleId) {
        if arena.state_mut(out).mark_retracted() {
            self.queue.push(out);
        }
    }

    pub fn collect_stats(&self, stats: &mut NodeStats) {
        stats.indexed_tuples += self.left.len() + self.right.len();
        stats.index_buckets += self.left.bucket_count() + self.right.bucket_count();
        stats.queued += self.queue.len();
    }
}

fn joined(arena: &TupleArena, tuple: TupleId, slot: usize) -> &JoinSlot {
    match arena.slot(tuple, slot) {
        StoreValue::Joined(joined) => joined,
        other => panic!("Impossible state: join slot holds {:?}", other),
    }
}

fn joined_mut(arena: &mut TupleArena, tuple: TupleId, slot: usize) -> &mut JoinSlot {
    match arena.slot_mut(tuple, slot) {
        StoreValue::Joined(joined) => joined,
        other => panic!("Impossible state: join slot holds {:?}", other),
    }
}

fn parent_of(arena: &TupleArena, out: TupleId, slot: usize) -> (TupleId, ListEntry) {
    match arena.slot(out, slot) {
        StoreValue::Parent { parent, entry } => (*parent, *entry),
        other => panic!("Impossible state: join output slot holds {:?}", other),
    }
}
