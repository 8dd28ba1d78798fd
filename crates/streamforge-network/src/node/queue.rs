//! Dirty queues of the nodes that create (or gate) tuples.

use crate::node::Event;
use crate::tuple::{TupleArena, TupleId, TupleState};

/// Something owning the lifecycle states of the items it queues.
pub(crate) trait StateStore<I> {
    fn state_mut(&mut self, id: I) -> &mut TupleState;
}

impl StateStore<TupleId> for TupleArena {
    fn state_mut(&mut self, id: TupleId) -> &mut TupleState {
        TupleArena::state_mut(self, id)
    }
}

/// Items settled by one flush, in propagation order.
#[derive(Debug)]
pub(crate) struct Drained<I> {
    /// Events for the children, retracts first, then updates, then inserts.
    pub events: Vec<(I, Event)>,
    /// Items that reached `Dead`, including aborted ones.
    pub dead: Vec<I>,
}

/// Items waiting for the flush of their node.
///
/// An item is pushed when it becomes dirty from a clean state, so it is
/// queued at most once per flush.
#[derive(Debug)]
pub(crate) struct DirtyQueue<I> {
    items: Vec<I>,
}

impl<I> Default for DirtyQueue<I> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<I: Copy> DirtyQueue<I> {
    pub fn push(&mut self, id: I) {
        self.items.push(id);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = I> + '_ {
        self.items.iter().copied()
    }

    /// Settles every queued item.
    pub fn drain<S: StateStore<I>>(&mut self, store: &mut S) -> Drained<I> {
        let mut retracts = Vec::new();
        let mut updates = Vec::new();
        let mut inserts = Vec::new();
        let mut dead = Vec::new();
        for id in self.items.drain(..) {
            let state = store.state_mut(id);
            match state.settle() {
                Some(Event::Retract) => {
                    retracts.push((id, Event::Retract));
                    dead.push(id);
                }
                Some(Event::Update) => updates.push((id, Event::Update)),
                Some(Event::Insert) => inserts.push((id, Event::Insert)),
                None => dead.push(id),
            }
        }
        retracts.append(&mut updates);
        retracts.append(&mut inserts);
        Drained {
            events: retracts,
            dead,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::fact;
    use smallvec::smallvec;

    #[test]
    fn test_drain_orders_retract_update_insert() {
        let mut arena = TupleArena::new();
        let mut queue = DirtyQueue::default();

        let inserted = arena.create(smallvec![fact(1u8)], 0);
        let updated = arena.create(smallvec![fact(2u8)], 0);
        let retracted = arena.create(smallvec![fact(3u8)], 0);
        let aborted = arena.create(smallvec![fact(4u8)], 0);
        for id in [updated, retracted] {
            arena.state_mut(id).settle();
        }

        queue.push(inserted);
        assert!(arena.state_mut(updated).mark_updated());
        queue.push(updated);
        assert!(arena.state_mut(retracted).mark_retracted());
        queue.push(retracted);
        queue.push(aborted);
        assert!(!arena.state_mut(aborted).mark_retracted());
        assert_eq!(queue.len(), 4);

        let drained = queue.drain(&mut arena);
        assert_eq!(queue.len(), 0);
        assert_eq!(
            drained.events,
            vec![
                (retracted, Event::Retract),
                (updated, Event::Update),
                (inserted, Event::Insert),
            ]
        );
        assert_eq!(drained.dead, vec![retracted, aborted]);
        assert_eq!(arena.state(inserted), TupleState::Ok);
        assert_eq!(arena.state(aborted), TupleState::Dead);
    }
}
