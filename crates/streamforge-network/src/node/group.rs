//! Group node.
//!
//! Input tuples are bucketed by their group key; every bucket owns one state
//! per collector and one output tuple. A contribution is added with
//! `accumulate` and removed with the undo token it returned, so a bucket is
//! never rebuilt. Results are only finished at flush time, for the buckets
//! whose output is dirty.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use super::{DirtyQueue, Drained, NodeStats};
use crate::collector::CollectorDef;
use crate::function::Function;
use crate::key::{GroupKey, Key};
use crate::node::Event;
use crate::tuple::{Facts, GroupMember, StoreValue, TupleArena, TupleId, TupleState};

// Store slot of output tuples holding their group key.
const GROUP_KEY: usize = 0;

#[derive(Debug)]
pub(crate) struct GroupDef {
    pub keys: Vec<Function<Key>>,
    pub collectors: Vec<CollectorDef>,
    pub slot: usize,
}

struct Bucket {
    states: Vec<Box<dyn Any + Send>>,
    count: usize,
    out: TupleId,
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("count", &self.count)
            .field("out", &self.out)
            .finish()
    }
}

#[derive(Debug)]
pub(crate) struct GroupNode {
    def: Arc<GroupDef>,
    store_size: usize,
    buckets: HashMap<GroupKey, Bucket>,
    queue: DirtyQueue<TupleId>,
}

impl GroupNode {
    pub fn new(def: Arc<GroupDef>, store_size: usize) -> Self {
        Self {
            def,
            store_size,
            buckets: HashMap::new(),
            queue: DirtyQueue::default(),
        }
    }

    pub fn receive(&mut self, arena: &mut TupleArena, tuple: TupleId, event: Event) {
        let slot = self.def.slot;
        match event {
            Event::Insert => {
                let key = self.group_key(arena, tuple);
                let undos = self.add(arena, &key, tuple);
                arena.set_slot(
                    tuple,
                    slot,
                    StoreValue::Member(Box::new(GroupMember { key, undos })),
                );
            }
            Event::Update => {
                let member = take_member(arena, tuple, slot);
                let key = self.group_key(arena, tuple);
                let undos = if member.key == key {
                    self.readd(arena, &key, member.undos, tuple)
                } else {
                    self.remove(arena, &member.key, member.undos);
                    self.add(arena, &key, tuple)
                };
                arena.set_slot(
                    tuple,
                    slot,
                    StoreValue::Member(Box::new(GroupMember { key, undos })),
                );
            }
            Event::Retract => {
                let member = take_member(arena, tuple, slot);
                self.remove(arena, &member.key, member.undos);
            }
        }
    }

    fn group_key(&self, arena: &TupleArena, tuple: TupleId) -> GroupKey {
        let facts = arena.facts(tuple);
        self.def.keys.iter().map(|key| key.call(facts)).collect()
    }

    fn add(&mut self, arena: &mut TupleArena, key: &GroupKey, tuple: TupleId) -> Vec<Box<dyn Any + Send>> {
        if !self.buckets.contains_key(key) {
            let out = arena.create(Facts::new(), self.store_size);
            arena.set_slot(out, GROUP_KEY, StoreValue::GroupKey(key.clone()));
            self.queue.push(out);
            let states = self.def.collectors.iter().map(|c| c.init()).collect();
            self.buckets.insert(
                key.clone(),
                Bucket {
                    states,
                    count: 0,
                    out,
                },
            );
        }
        let Some(bucket) = self.buckets.get_mut(key) else {
            panic!("Impossible state: no group for key {:?}", key);
        };
        if bucket.count > 0 && arena.state_mut(bucket.out).mark_updated() {
            self.queue.push(bucket.out);
        }
        bucket.count += 1;
        let facts = arena.facts(tuple);
        self.def
            .collectors
            .iter()
            .zip(bucket.states.iter_mut())
            .map(|(collector, state)| collector.accumulate(state, facts))
            .collect()
    }

    // Same group: undo and accumulate again, the bucket survives.
    fn readd(
        &mut self,
        arena: &mut TupleArena,
        key: &GroupKey,
        undos: Vec<Box<dyn Any + Send>>,
        tuple: TupleId,
    ) -> Vec<Box<dyn Any + Send>> {
        let Some(bucket) = self.buckets.get_mut(key) else {
            panic!("Impossible state: no group for key {:?}", key);
        };
        let facts = arena.facts(tuple);
        let undos = self
            .def
            .collectors
            .iter()
            .zip(bucket.states.iter_mut())
            .zip(undos)
            .map(|((collector, state), undo)| {
                collector.undo(state, undo);
                collector.accumulate(state, facts)
            })
            .collect();
        if arena.state_mut(bucket.out).mark_updated() {
            self.queue.push(bucket.out);
        }
        undos
    }

    fn remove(&mut self, arena: &mut TupleArena, key: &GroupKey, undos: Vec<Box<dyn Any + Send>>) {
        let Some(bucket) = self.buckets.get_mut(key) else {
            panic!("Impossible state: no group for key {:?}", key);
        };
        for ((collector, state), undo) in self.def.collectors.iter().zip(bucket.states.iter_mut()).zip(undos) {
            collector.undo(state, undo);
        }
        bucket.count -= 1;
        let out = bucket.out;
        let queued = if bucket.count == 0 {
            self.buckets.remove(key);
            arena.state_mut(out).mark_retracted()
        } else {
            arena.state_mut(out).mark_updated()
        };
        if queued {
            self.queue.push(out);
        }
    }

    /// Finishes the dirty groups that survive, then settles the queue.
    pub fn flush(&mut self, arena: &mut TupleArena) -> Drained<TupleId> {
        for out in self.queue.iter() {
            if !matches!(arena.state(out), TupleState::Creating | TupleState::Updating) {
                continue;
            }
            let key = match arena.slot(out, GROUP_KEY) {
                StoreValue::GroupKey(key) => key,
                other => panic!("Impossible state: group output slot holds {:?}", other),
            };
            let Some(bucket) = self.buckets.get(key) else {
                panic!("Impossible state: live group output without a group");
            };
            debug_assert_eq!(bucket.out, out);
            let facts: Facts = key
                .iter()
                .map(Key::to_fact)
                .chain(
                    self.def
                        .collectors
                        .iter()
                        .zip(&bucket.states)
                        .map(|(collector, state)| collector.finish(state)),
                )
                .collect();
            arena.set_facts(out, facts);
        }
        self.queue.drain(arena)
    }

    pub fn collect_stats(&self, stats: &mut NodeStats) {
        stats.groups += self.buckets.len();
        stats.queued += self.queue.len();
    }
}

fn take_member(arena: &mut TupleArena, tuple: TupleId, slot: usize) -> GroupMember {
    match arena.take_slot(tuple, slot) {
        StoreValue::Member(member) => *member,
        other => panic!("Impossible state: group slot holds {:?}", other),
    }
}
