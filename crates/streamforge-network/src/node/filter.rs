use std::sync::Arc;

use super::Event;
use crate::function::Function;
use crate::tuple::{StoreValue, TupleArena, TupleId};

#[derive(Debug)]
pub(crate) struct FilterDef {
    pub predicate: Function<bool>,
    /// Marks tuples that passed, in the store of the upstream origin.
    pub slot: usize,
}

/// Forwards the tuples matching a predicate.
///
/// | before   | now      | forwarded |
/// |----------|----------|-----------|
/// | no match | no match | nothing   |
/// | match    | no match | retract   |
/// | no match | match    | insert    |
/// | match    | match    | update    |
#[derive(Debug)]
pub(crate) struct FilterNode {
    def: Arc<FilterDef>,
}

impl FilterNode {
    pub fn new(def: Arc<FilterDef>) -> Self {
        Self { def }
    }

    pub fn receive(&mut self, arena: &mut TupleArena, tuple: TupleId, event: Event) -> Option<Event> {
        let slot = self.def.slot;
        let passed = matches!(arena.slot(tuple, slot), StoreValue::Passed);
        let passes = match event {
            Event::Retract => false,
            Event::Insert | Event::Update => self.def.predicate.call(arena.facts(tuple)),
        };
        match (passed, passes) {
            (false, false) => None,
            (true, false) => {
                arena.take_slot(tuple, slot);
                Some(Event::Retract)
            }
            (false, true) => {
                arena.set_slot(tuple, slot, StoreValue::Passed);
                Some(Event::Insert)
            }
            (true, true) => Some(Event::Update),
        }
    }
}
