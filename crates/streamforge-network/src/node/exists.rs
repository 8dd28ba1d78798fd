//! If-exists and if-not-exists node.
//!
//! Each left tuple gets a counter of the right tuples matching it. The left
//! tuple itself is forwarded, gated by its counter: only transitions of the
//! count between zero and non-zero change what the children see. Without
//! residual joiners the matching right tuples of a counter are exactly the
//! ones indexed under its key, so counters are adjusted through the index;
//! with residual joiners every match is recorded as a tracker linking one
//! counter and one right tuple.

use std::sync::Arc;

use slab::Slab;

use super::{DirtyQueue, Event, NodeStats, Side, StateStore};
use crate::joiner::{IndexKey, JoinIndex, JoinPlan};
use crate::tuple::{
    ExistsRightSlot, ListEntry, StoreValue, TupleArena, TupleId, TupleList, TupleState,
};

#[derive(Debug)]
pub(crate) struct ExistsDef {
    pub plan: JoinPlan,
    /// `true` for if-exists, `false` for if-not-exists.
    pub should_exist: bool,
    pub left_slot: usize,
    pub right_slot: usize,
}

#[derive(Debug)]
pub(crate) struct Counter {
    left: TupleId,
    key: IndexKey,
    entry: ListEntry,
    count: usize,
    /// State of the left tuple as seen by the children of this node.
    state: TupleState,
    trackers: TupleList<usize>,
    /// The left tuple was retracted; freed once settled.
    detached: bool,
}

#[derive(Debug)]
struct Tracker {
    counter: usize,
    counter_entry: ListEntry,
    right: TupleId,
    right_entry: ListEntry,
}

impl StateStore<usize> for Slab<Counter> {
    fn state_mut(&mut self, id: usize) -> &mut TupleState {
        &mut self[id].state
    }
}

#[derive(Debug)]
pub(crate) struct ExistsNode {
    def: Arc<ExistsDef>,
    left: JoinIndex<usize>,
    right: JoinIndex<TupleId>,
    counters: Slab<Counter>,
    trackers: Slab<Tracker>,
    queue: DirtyQueue<usize>,
}

impl ExistsNode {
    pub fn new(def: Arc<ExistsDef>) -> Self {
        Self {
            def,
            left: JoinIndex::default(),
            right: JoinIndex::default(),
            counters: Slab::new(),
            trackers: Slab::new(),
            queue: DirtyQueue::default(),
        }
    }

    pub fn receive(&mut self, arena: &mut TupleArena, side: Side, tuple: TupleId, event: Event) {
        match (side, event) {
            (Side::Left, Event::Insert) => self.insert_left(arena, tuple),
            (Side::Left, Event::Update) => self.update_left(arena, tuple),
            (Side::Left, Event::Retract) => self.retract_left(arena, tuple),
            (Side::Right, Event::Insert) => self.insert_right(arena, tuple),
            (Side::Right, Event::Update) => self.update_right(arena, tuple),
            (Side::Right, Event::Retract) => self.retract_right(arena, tuple),
        }
    }

    fn passes(&self, count: usize) -> bool {
        (count > 0) == self.def.should_exist
    }

    fn insert_left(&mut self, arena: &mut TupleArena, tuple: TupleId) {
        let key = self.def.plan.left_key(arena.facts(tuple));
        let id = self.counters.vacant_key();
        let entry = self.left.put(&key, id);
        self.counters.insert(Counter {
            left: tuple,
            key,
            entry,
            count: 0,
            state: TupleState::Dead,
            trackers: TupleList::new(),
            detached: false,
        });
        arena.set_slot(tuple, self.def.left_slot, StoreValue::Counter(id));
        self.count_matches(arena, id);
        let passes = self.passes(self.counters[id].count);
        self.set_passing(id, passes, false);
    }

    fn update_left(&mut self, arena: &mut TupleArena, tuple: TupleId) {
        let id = counter_of(arena, tuple, self.def.left_slot);
        let key = self.def.plan.left_key(arena.facts(tuple));
        let key_changed = self.counters[id].key != key;
        if key_changed || self.def.plan.has_tests() {
            self.drop_trackers(arena, id);
            if key_changed {
                let counter = &mut self.counters[id];
                self.left.remove(&counter.key, counter.entry);
                counter.entry = self.left.put(&key, id);
                counter.key = key;
            }
            self.counters[id].count = 0;
            self.count_matches(arena, id);
        }
        let passes = self.passes(self.counters[id].count);
        self.set_passing(id, passes, true);
    }

    fn retract_left(&mut self, arena: &mut TupleArena, tuple: TupleId) {
        let id = counter_of(arena, tuple, self.def.left_slot);
        arena.take_slot(tuple, self.def.left_slot);
        self.drop_trackers(arena, id);
        let counter = &mut self.counters[id];
        self.left.remove(&counter.key, counter.entry);
        counter.detached = true;
        let state = counter.state;
        match state {
            TupleState::Ok => {
                self.counters[id].state.transition(TupleState::Dying);
                self.queue.push(id);
            }
            TupleState::Updating => self.counters[id].state.transition(TupleState::Dying),
            TupleState::Creating => self.counters[id].state.transition(TupleState::Aborting),
            TupleState::Dead => {
                self.counters.remove(id);
            }
            // Already queued; freed by the flush.
            TupleState::Dying | TupleState::Aborting => {}
        }
    }

    fn insert_right(&mut self, arena: &mut TupleArena, tuple: TupleId) {
        let key = self.def.plan.right_key(arena.facts(tuple));
        let entry = self.right.put(&key, tuple);
        let candidates = self.left.candidates(&key, self.def.plan.range_op(), false);
        arena.set_slot(
            tuple,
            self.def.right_slot,
            StoreValue::ExistsRight(Box::new(ExistsRightSlot {
                key,
                entry,
                trackers: TupleList::new(),
            })),
        );
        for id in candidates {
            if self.def.plan.has_tests() {
                let left = self.counters[id].left;
                if !self.def.plan.test(arena.facts(left), arena.facts(tuple)) {
                    continue;
                }
                self.track(arena, id, tuple);
            }
            self.increment(id);
        }
    }

    fn update_right(&mut self, arena: &mut TupleArena, tuple: TupleId) {
        let key = self.def.plan.right_key(arena.facts(tuple));
        if !self.def.plan.has_tests() && exists_right(arena, tuple, self.def.right_slot).key == key
        {
            return;
        }
        self.retract_right(arena, tuple);
        self.insert_right(arena, tuple);
    }

    fn retract_right(&mut self, arena: &mut TupleArena, tuple: TupleId) {
        let slot = match arena.take_slot(tuple, self.def.right_slot) {
            StoreValue::ExistsRight(slot) => slot,
            other => panic!("Impossible state: exists right slot holds {:?}", other),
        };
        let ExistsRightSlot {
            key,
            entry,
            mut trackers,
        } = *slot;
        self.right.remove(&key, entry);
        if self.def.plan.has_tests() {
            for tracker in trackers.drain() {
                let tracker = self.trackers.remove(tracker);
                self.counters[tracker.counter]
                    .trackers
                    .remove(tracker.counter_entry);
                self.decrement(tracker.counter);
            }
        } else {
            for id in self.left.candidates(&key, self.def.plan.range_op(), false) {
                self.decrement(id);
            }
        }
    }

    // Counts the right tuples matching a counter with no matches recorded.
    fn count_matches(&mut self, arena: &mut TupleArena, id: usize) {
        let counter = &self.counters[id];
        let left = counter.left;
        let candidates = self.right.candidates(&counter.key, self.def.plan.range_op(), true);
        let mut count = 0;
        for right in candidates {
            if self.def.plan.has_tests() {
                if !self.def.plan.test(arena.facts(left), arena.facts(right)) {
                    continue;
                }
                self.track(arena, id, right);
            }
            count += 1;
        }
        self.counters[id].count = count;
    }

    fn track(&mut self, arena: &mut TupleArena, id: usize, right: TupleId) {
        let tracker = self.trackers.vacant_key();
        let counter_entry = self.counters[id].trackers.add(tracker);
        let right_entry = exists_right_mut(arena, right, self.def.right_slot)
            .trackers
            .add(tracker);
        self.trackers.insert(Tracker {
            counter: id,
            counter_entry,
            right,
            right_entry,
        });
    }

    fn drop_trackers(&mut self, arena: &mut TupleArena, id: usize) {
        for tracker in self.counters[id].trackers.drain() {
            let tracker = self.trackers.remove(tracker);
            exists_right_mut(arena, tracker.right, self.def.right_slot)
                .trackers
                .remove(tracker.right_entry);
        }
    }

    fn increment(&mut self, id: usize) {
        let counter = &mut self.counters[id];
        counter.count += 1;
        if counter.count == 1 {
            let passes = self.passes(1);
            self.set_passing(id, passes, false);
        }
    }

    fn decrement(&mut self, id: usize) {
        let counter = &mut self.counters[id];
        counter.count -= 1;
        if counter.count == 0 {
            let passes = self.passes(0);
            self.set_passing(id, passes, false);
        }
    }

    /// Moves a counter towards passing or not. `refresh` asks for an update
    /// of a tuple that keeps passing.
    fn set_passing(&mut self, id: usize, passes: bool, refresh: bool) {
        use TupleState::*;
        let state = &mut self.counters[id].state;
        let (next, push) = match (passes, *state) {
            (true, Dead) => (Creating, true),
            (true, Aborting) => (Creating, false),
            (true, Dying) => (Updating, false),
            (true, Ok) if refresh => (Updating, true),
            (true, _) => return,
            (false, Ok) => (Dying, true),
            (false, Creating) => (Aborting, false),
            (false, Updating) => (Dying, false),
            (false, _) => return,
        };
        state.transition(next);
        if push {
            self.queue.push(id);
        }
    }

    pub fn flush(&mut self) -> Vec<(TupleId, Event)> {
        let drained = self.queue.drain(&mut self.counters);
        let events = drained
            .events
            .into_iter()
            .map(|(id, event)| (self.counters[id].left, event))
            .collect();
        for id in drained.dead {
            if self.counters[id].detached {
                self.counters.remove(id);
            }
        }
        events
    }

    pub fn collect_stats(&self, stats: &mut NodeStats) {
        stats.indexed_tuples += self.left.len() + self.right.len();
        stats.index_buckets += self.left.bucket_count() + self.right.bucket_count();
        stats.counters += self.counters.len();
        stats.queued += self.queue.len();
    }
}

fn counter_of(arena: &TupleArena, tuple: TupleId, slot: usize) -> usize {
    match arena.slot(tuple, slot) {
        StoreValue::Counter(id) => *id,
        other => panic!("Impossible state: exists left slot holds {:?}", other),
    }
}

fn exists_right(arena: &TupleArena, tuple: TupleId, slot: usize) -> &ExistsRightSlot {
    match arena.slot(tuple, slot) {
        StoreValue::ExistsRight(right) => right,
        other => panic!("Impossible state: exists right slot holds {:?}", other),
    }
}

fn exists_right_mut(arena: &mut TupleArena, tuple: TupleId, slot: usize) -> &mut ExistsRightSlot {
    match arena.slot_mut(tuple, slot) {
        StoreValue::ExistsRight(right) => right,
        other => panic!("Impossible state: exists right slot holds {:?}", other),
    }
}
