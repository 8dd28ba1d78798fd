//! Map and flatten nodes: both create their own tuples from each parent
//! tuple and remember them in the parent's store.

use std::sync::Arc;

use super::{DirtyQueue, Event};
use crate::fact::Fact;
use crate::function::Function;
use crate::tuple::{Facts, StoreValue, TupleArena, TupleId};

#[derive(Debug)]
pub(crate) struct MapDef {
    /// One function per output column.
    pub mappings: Vec<Function<Fact>>,
    pub slot: usize,
}

#[derive(Debug)]
pub(crate) struct MapNode {
    def: Arc<MapDef>,
    store_size: usize,
    pub(super) queue: DirtyQueue<TupleId>,
}

impl MapNode {
    pub fn new(def: Arc<MapDef>, store_size: usize) -> Self {
        Self {
            def,
            store_size,
            queue: DirtyQueue::default(),
        }
    }

    fn map(&self, facts: &[Fact]) -> Facts {
        self.def.mappings.iter().map(|f| f.call(facts)).collect()
    }

    pub fn receive(&mut self, arena: &mut TupleArena, tuple: TupleId, event: Event) {
        let slot = self.def.slot;
        match event {
            Event::Insert => {
                let facts = self.map(arena.facts(tuple));
                let child = arena.create(facts, self.store_size);
                arena.set_slot(tuple, slot, StoreValue::Child(child));
                self.queue.push(child);
            }
            Event::Update => {
                let child = child_of(arena, tuple, slot);
                let facts = self.map(arena.facts(tuple));
                arena.set_facts(child, facts);
                if arena.state_mut(child).mark_updated() {
                    self.queue.push(child);
                }
            }
            Event::Retract => {
                let child = child_of(arena, tuple, slot);
                arena.take_slot(tuple, slot);
                if arena.state_mut(child).mark_retracted() {
                    self.queue.push(child);
                }
            }
        }
    }
}

fn child_of(arena: &TupleArena, tuple: TupleId, slot: usize) -> TupleId {
    match arena.slot(tuple, slot) {
        StoreValue::Child(child) => *child,
        other => panic!("Impossible state: map slot holds {:?}", other),
    }
}

#[derive(Debug)]
pub(crate) struct FlattenDef {
    /// Takes the last column and returns the items replacing it.
    pub flatten: Function<Vec<Fact>>,
    pub slot: usize,
}

/// Replaces the last column of each tuple by each of the items it expands
/// to, producing zero or more children.
///
/// On update, children are matched to items by position: the first items
/// update the existing children, surplus items create children and surplus
/// children are retracted.
#[derive(Debug)]
pub(crate) struct FlattenNode {
    def: Arc<FlattenDef>,
    store_size: usize,
    pub(super) queue: DirtyQueue<TupleId>,
}

impl FlattenNode {
    pub fn new(def: Arc<FlattenDef>, store_size: usize) -> Self {
        Self {
            def,
            store_size,
            queue: DirtyQueue::default(),
        }
    }

    fn expand(&self, facts: &[Fact]) -> Vec<Facts> {
        let (last, prefix) = match facts.split_last() {
            Some(split) => split,
            None => panic!("Impossible state: flattening an empty tuple"),
        };
        self.def
            .flatten
            .call(std::slice::from_ref(last))
            .into_iter()
            .map(|item| prefix.iter().cloned().chain(std::iter::once(item)).collect())
            .collect()
    }

    pub fn receive(&mut self, arena: &mut TupleArena, tuple: TupleId, event: Event) {
        let slot = self.def.slot;
        match event {
            Event::Insert => {
                let children = self
                    .expand(arena.facts(tuple))
                    .into_iter()
                    .map(|facts| {
                        let child = arena.create(facts, self.store_size);
                        self.queue.push(child);
                        child
                    })
                    .collect();
                arena.set_slot(tuple, slot, StoreValue::Children(children));
            }
            Event::Update => {
                let old = take_children(arena, tuple, slot);
                let mut items = self.expand(arena.facts(tuple)).into_iter();
                let mut children = Vec::with_capacity(old.len());
                for child in old {
                    match items.next() {
                        Some(facts) => {
                            arena.set_facts(child, facts);
                            if arena.state_mut(child).mark_updated() {
                                self.queue.push(child);
                            }
                            children.push(child);
                        }
                        None => self.retract_child(arena, child),
                    }
                }
                for facts in items {
                    let child = arena.create(facts, self.store_size);
                    self.queue.push(child);
                    children.push(child);
                }
                arena.set_slot(tuple, slot, StoreValue::Children(children));
            }
            Event::Retract => {
                for child in take_children(arena, tuple, slot) {
                    self.retract_child(arena, child);
                }
            }
        }
    }

    fn retract_child(&mut self, arena: &mut TupleArena, child: TupleId) {
        if arena.state_mut(child).mark_retracted() {
            self.queue.push(child);
        }
    }
}

fn take_children(arena: &mut TupleArena, tuple: TupleId, slot: usize) -> Vec<TupleId> {
    match arena.take_slot(tuple, slot) {
        StoreValue::Children(children) => children,
        other => panic!("Impossible state: flatten slot holds {:?}", other),
    }
}
