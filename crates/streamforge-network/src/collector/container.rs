//! Collectors into containers, and distinct counting.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use super::{check_function, Collector};
use crate::fact::{Fact, FactType, FactValue};
use crate::function::{Function, TupleFn};

/// A multiset stored as value -> occurrences.
pub(super) trait CountedSet<K> {
    fn increment(&mut self, value: K);
    fn decrement(&mut self, value: &K);
}

impl<K: Hash + Eq> CountedSet<K> for HashMap<K, usize> {
    fn increment(&mut self, value: K) {
        *self.entry(value).or_insert(0) += 1;
    }

    fn decrement(&mut self, value: &K) {
        if let Some(count) = self.get_mut(value) {
            *count -= 1;
            if *count == 0 {
                self.remove(value);
            }
        }
    }
}

impl<K: Ord> CountedSet<K> for BTreeMap<K, usize> {
    fn increment(&mut self, value: K) {
        *self.entry(value).or_insert(0) += 1;
    }

    fn decrement(&mut self, value: &K) {
        if let Some(count) = self.get_mut(value) {
            *count -= 1;
            if *count == 0 {
                self.remove(value);
            }
        }
    }
}

/// Number of distinct mapped values of a group.
pub fn count_distinct<Args, K, F>(mapping: F) -> CountDistinct<K>
where
    K: FactValue + Hash + Eq + Clone,
    F: TupleFn<Args, K>,
{
    CountDistinct {
        mapping: mapping.into_function(),
    }
}

pub struct CountDistinct<K> {
    mapping: Function<K>,
}

impl<K> Collector for CountDistinct<K>
where
    K: FactValue + Hash + Eq + Clone,
{
    type State = HashMap<K, usize>;
    type Undo = K;
    type Result = usize;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.mapping, columns)
    }

    fn init(&self) -> HashMap<K, usize> {
        HashMap::new()
    }

    fn accumulate(&self, state: &mut HashMap<K, usize>, facts: &[Fact]) -> K {
        let value = self.mapping.call(facts);
        state.increment(value.clone());
        value
    }

    fn undo(&self, state: &mut HashMap<K, usize>, value: K) {
        state.decrement(&value);
    }

    fn finish(&self, state: &HashMap<K, usize>) -> usize {
        state.len()
    }
}

/// Mapped values of a group in contribution order.
pub fn to_list<Args, V, F>(mapping: F) -> ToList<V>
where
    V: FactValue + Clone,
    F: TupleFn<Args, V>,
{
    ToList {
        mapping: mapping.into_function(),
    }
}

pub struct ToList<V> {
    mapping: Function<V>,
}

#[derive(Debug)]
pub struct ListState<V> {
    items: BTreeMap<u64, V>,
    next: u64,
}

impl<V> Collector for ToList<V>
where
    V: FactValue + Clone,
{
    type State = ListState<V>;
    type Undo = u64;
    type Result = Vec<V>;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.mapping, columns)
    }

    fn init(&self) -> ListState<V> {
        ListState {
            items: BTreeMap::new(),
            next: 0,
        }
    }

    fn accumulate(&self, state: &mut ListState<V>, facts: &[Fact]) -> u64 {
        let seq = state.next;
        state.next += 1;
        state.items.insert(seq, self.mapping.call(facts));
        seq
    }

    fn undo(&self, state: &mut ListState<V>, seq: u64) {
        state.items.remove(&seq);
    }

    fn finish(&self, state: &ListState<V>) -> Vec<V> {
        state.items.values().cloned().collect()
    }
}

/// Distinct mapped values of a group.
pub fn to_set<Args, V, F>(mapping: F) -> ToSet<V>
where
    V: FactValue + Hash + Eq + Clone,
    F: TupleFn<Args, V>,
{
    ToSet {
        mapping: mapping.into_function(),
    }
}

pub struct ToSet<V> {
    mapping: Function<V>,
}

impl<V> Collector for ToSet<V>
where
    V: FactValue + Hash + Eq + Clone,
{
    type State = HashMap<V, usize>;
    type Undo = V;
    type Result = HashSet<V>;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.mapping, columns)
    }

    fn init(&self) -> HashMap<V, usize> {
        HashMap::new()
    }

    fn accumulate(&self, state: &mut HashMap<V, usize>, facts: &[Fact]) -> V {
        let value = self.mapping.call(facts);
        state.increment(value.clone());
        value
    }

    fn undo(&self, state: &mut HashMap<V, usize>, value: V) {
        state.decrement(&value);
    }

    fn finish(&self, state: &HashMap<V, usize>) -> HashSet<V> {
        state.keys().cloned().collect()
    }
}

/// Distinct mapped values of a group, sorted.
pub fn to_sorted_set<Args, V, F>(mapping: F) -> ToSortedSet<V>
where
    V: FactValue + Ord + Clone,
    F: TupleFn<Args, V>,
{
    ToSortedSet {
        mapping: mapping.into_function(),
    }
}

pub struct ToSortedSet<V> {
    mapping: Function<V>,
}

impl<V> Collector for ToSortedSet<V>
where
    V: FactValue + Ord + Clone,
{
    type State = BTreeMap<V, usize>;
    type Undo = V;
    type Result = BTreeSet<V>;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.mapping, columns)
    }

    fn init(&self) -> BTreeMap<V, usize> {
        BTreeMap::new()
    }

    fn accumulate(&self, state: &mut BTreeMap<V, usize>, facts: &[Fact]) -> V {
        let value = self.mapping.call(facts);
        state.increment(value.clone());
        value
    }

    fn undo(&self, state: &mut BTreeMap<V, usize>, value: V) {
        state.decrement(&value);
    }

    fn finish(&self, state: &BTreeMap<V, usize>) -> BTreeSet<V> {
        state.keys().cloned().collect()
    }
}
