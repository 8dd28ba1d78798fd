use std::sync::Arc;

use super::{DirtyQueue, Event, Side};
use crate::tuple::{StoreValue, TupleArena, TupleId};

#[derive(Debug)]
pub(crate) struct ConcatDef {
    pub left_slot: usize,
    pub right_slot: usize,
}

/// Union of two streams with the same columns.
///
/// Every tuple of either parent gets a copy owned by this node, so children
/// see one stream whatever side a tuple came from. A stream concatenated
/// with itself yields every tuple twice.
#[derive(Debug)]
pub(crate) struct ConcatNode {
    def: Arc<ConcatDef>,
    store_size: usize,
    pub(super) queue: DirtyQueue<TupleId>,
}

impl ConcatNode {
    pub fn new(def: Arc<ConcatDef>, store_size: usize) -> Self {
        Self {
            def,
            store_size,
            queue: DirtyQueue::default(),
        }
    }

    pub fn receive(&mut self, arena: &mut TupleArena, side: Side, tuple: TupleId, event: Event) {
        let slot = match side {
            Side::Left => self.def.left_slot,
            Side::Right => self.def.right_slot,
        };
        match event {
            Event::Insert => {
                let facts = arena.facts(tuple).iter().cloned().collect();
                let copy = arena.create(facts, self.store_size);
                arena.set_slot(tuple, slot, StoreValue::Child(copy));
                self.queue.push(copy);
            }
            Event::Update => {
                let copy = copy_of(arena, tuple, slot);
                let facts = arena.facts(tuple).iter().cloned().collect();
                arena.set_facts(copy, facts);
                if arena.state_mut(copy).mark_updated() {
                    self.queue.push(copy);
                }
            }
            Event::Retract => {
                let copy = copy_of(arena, tuple, slot);
                arena.take_slot(tuple, slot);
                if arena.state_mut(copy).mark_retracted() {
                    self.queue.push(copy);
                }
            }
        }
    }
}

fn copy_of(arena: &TupleArena, tuple: TupleId, slot: usize) -> TupleId {
    match arena.slot(tuple, slot) {
        StoreValue::Child(copy) => *copy,
        other => panic!("Impossible state: concat slot holds {:?}", other),
    }
}
