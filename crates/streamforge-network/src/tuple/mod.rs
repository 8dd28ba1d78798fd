//! Tuple model.
//!
//! A tuple is a record of 1 to 4 facts flowing through the network. Only the
//! node that created a tuple (its origin) writes its facts; the store slots
//! were assigned to downstream nodes when the network was built and each
//! slot is private to the node that reserved it.

mod list;
mod store;

#[cfg(test)]
mod tests;

pub use list::{Iter, ListEntry, TupleList};
pub(crate) use store::{ExistsRightSlot, GroupMember, JoinSlot, StoreValue};

use slab::Slab;
use smallvec::SmallVec;

use crate::fact::Fact;
use crate::node::Event;

/// Maximum number of facts in a tuple.
pub const MAX_ARITY: usize = 4;

pub(crate) type Facts = SmallVec<[Fact; MAX_ARITY]>;

/// Lifecycle state of a tuple (or of an existence counter).
///
/// `Creating -> Ok -> Dying -> Dead`, with `Updating` as the transient state
/// of an `Ok` tuple whose facts changed, and `Aborting` as the state of a
/// tuple killed before it was ever propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TupleState {
    Creating,
    Ok,
    Updating,
    Dying,
    Aborting,
    Dead,
}

impl TupleState {
    /// Queued for propagation.
    pub fn is_dirty(self) -> bool {
        matches!(
            self,
            TupleState::Creating | TupleState::Updating | TupleState::Dying | TupleState::Aborting
        )
    }

    /// Alive once the current propagation completes.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            TupleState::Creating | TupleState::Ok | TupleState::Updating
        )
    }

    fn can_transition(self, to: TupleState) -> bool {
        use TupleState::*;
        matches!(
            (self, to),
            (Creating, Ok)
                | (Creating, Aborting)
                | (Ok, Updating)
                | (Ok, Dying)
                | (Updating, Ok)
                | (Updating, Dying)
                | (Dying, Dead)
                | (Aborting, Dead)
                // existence counters revive
                | (Dead, Creating)
                | (Aborting, Creating)
                | (Dying, Updating)
        )
    }

    pub(crate) fn transition(&mut self, to: TupleState) {
        debug_assert!(
            self.can_transition(to),
            "Illegal tuple state transition {:?} -> {:?}",
            self,
            to
        );
        *self = to;
    }

    /// Marks a changed tuple. Returns whether it must be queued.
    pub(crate) fn mark_updated(&mut self) -> bool {
        match *self {
            TupleState::Ok => {
                self.transition(TupleState::Updating);
                true
            }
            TupleState::Creating | TupleState::Updating => false,
            state => panic!("Impossible state: update of a {:?} tuple", state),
        }
    }

    /// Marks a killed tuple. Returns whether it must be queued.
    pub(crate) fn mark_retracted(&mut self) -> bool {
        match *self {
            TupleState::Creating => {
                self.transition(TupleState::Aborting);
                false
            }
            TupleState::Ok => {
                self.transition(TupleState::Dying);
                true
            }
            TupleState::Updating => {
                self.transition(TupleState::Dying);
                false
            }
            state => panic!("Impossible state: retract of a {:?} tuple", state),
        }
    }

    /// Finishes the propagation of a queued tuple, returning the event its
    /// children must observe.
    pub(crate) fn settle(&mut self) -> Option<Event> {
        match *self {
            TupleState::Creating => {
                self.transition(TupleState::Ok);
                Some(Event::Insert)
            }
            TupleState::Updating => {
                self.transition(TupleState::Ok);
                Some(Event::Update)
            }
            TupleState::Dying => {
                self.transition(TupleState::Dead);
                Some(Event::Retract)
            }
            TupleState::Aborting => {
                self.transition(TupleState::Dead);
                None
            }
            state => panic!("Impossible state: settling a {:?} tuple", state),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TupleId(usize);

#[derive(Debug)]
pub(crate) struct Tuple {
    facts: Facts,
    state: TupleState,
    store: Box<[StoreValue]>,
}

/// Owner of every tuple of one network.
///
/// Dead tuples are buried and only swept once the whole propagation is
/// over, so retract deliveries that arrive later can still read their slots.
#[derive(Debug, Default)]
pub(crate) struct TupleArena {
    tuples: Slab<Tuple>,
    graveyard: Vec<TupleId>,
}

impl TupleArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group outputs are created without facts; they get them when their
    /// group is first finished.
    pub fn create(&mut self, facts: Facts, store_size: usize) -> TupleId {
        debug_assert!(facts.len() <= MAX_ARITY);
        let store = (0..store_size).map(|_| StoreValue::Empty).collect();
        TupleId(self.tuples.insert(Tuple {
            facts,
            state: TupleState::Creating,
            store,
        }))
    }

    fn tuple(&self, id: TupleId) -> &Tuple {
        match self.tuples.get(id.0) {
            Some(tuple) => tuple,
            None => panic!("Impossible state: tuple {:?} was swept", id),
        }
    }

    fn tuple_mut(&mut self, id: TupleId) -> &mut Tuple {
        match self.tuples.get_mut(id.0) {
            Some(tuple) => tuple,
            None => panic!("Impossible state: tuple {:?} was swept", id),
        }
    }

    pub fn facts(&self, id: TupleId) -> &[Fact] {
        &self.tuple(id).facts
    }

    pub fn set_facts(&mut self, id: TupleId, facts: Facts) {
        self.tuple_mut(id).facts = facts;
    }

    pub fn state(&self, id: TupleId) -> TupleState {
        self.tuple(id).state
    }

    pub fn state_mut(&mut self, id: TupleId) -> &mut TupleState {
        &mut self.tuple_mut(id).state
    }

    pub fn slot(&self, id: TupleId, slot: usize) -> &StoreValue {
        &self.tuple(id).store[slot]
    }

    pub fn slot_mut(&mut self, id: TupleId, slot: usize) -> &mut StoreValue {
        &mut self.tuple_mut(id).store[slot]
    }

    pub fn set_slot(&mut self, id: TupleId, slot: usize, value: StoreValue) {
        self.tuple_mut(id).store[slot] = value;
    }

    pub fn take_slot(&mut self, id: TupleId, slot: usize) -> StoreValue {
        std::mem::take(&mut self.tuple_mut(id).store[slot])
    }

    pub fn bury(&mut self, id: TupleId) {
        debug_assert_eq!(self.state(id), TupleState::Dead);
        self.graveyard.push(id);
    }

    /// Frees every buried tuple. Returns how many were freed.
    pub fn sweep(&mut self) -> usize {
        let count = self.graveyard.len();
        for id in self.graveyard.drain(..) {
            self.tuples.remove(id.0);
        }
        count
    }

    /// Tuples currently allocated, including buried ones not yet swept.
    pub fn len(&self) -> usize {
        self.tuples.len()
    }
}
