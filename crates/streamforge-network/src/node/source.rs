use std::collections::HashMap;

use smallvec::smallvec;

use super::DirtyQueue;
use crate::fact::{Fact, FactHandle, FactType};
use crate::tuple::{TupleArena, TupleId};

/// Entry point of one fact type: wraps each working fact into an arity-1
/// tuple.
#[derive(Debug)]
pub(crate) struct SourceNode {
    fact_type: FactType,
    store_size: usize,
    tuples: HashMap<FactHandle, TupleId>,
    pub(super) queue: DirtyQueue<TupleId>,
}

impl SourceNode {
    pub fn new(fact_type: FactType, store_size: usize) -> Self {
        Self {
            fact_type,
            store_size,
            tuples: HashMap::new(),
            queue: DirtyQueue::default(),
        }
    }

    pub fn insert(&mut self, arena: &mut TupleArena, handle: FactHandle, fact: Fact) {
        debug_assert_eq!(FactType::of_fact(&fact), self.fact_type);
        let tuple = arena.create(smallvec![fact], self.store_size);
        if self.tuples.insert(handle, tuple).is_some() {
            panic!("Impossible state: fact {} inserted twice", handle);
        }
        self.queue.push(tuple);
    }

    pub fn update(&mut self, arena: &mut TupleArena, handle: FactHandle, fact: Fact) {
        let Some(&tuple) = self.tuples.get(&handle) else {
            panic!("Impossible state: update of unknown fact {}", handle);
        };
        arena.set_facts(tuple, smallvec![fact]);
        if arena.state_mut(tuple).mark_updated() {
            self.queue.push(tuple);
        }
    }

    pub fn retract(&mut self, arena: &mut TupleArena, handle: FactHandle) {
        let Some(tuple) = self.tuples.remove(&handle) else {
            panic!("Impossible state: retract of unknown fact {}", handle);
        };
        if arena.state_mut(tuple).mark_retracted() {
            self.queue.push(tuple);
        }
    }
}
