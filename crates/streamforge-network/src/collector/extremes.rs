//! Min and max collectors.
//!
//! Both keep a counted multiset of the mapped values, so removing the
//! current extreme falls back to the next one without a rescan.

use std::collections::BTreeMap;

use super::container::CountedSet;
use super::{check_function, Collector};
use crate::fact::{Fact, FactType, FactValue};
use crate::function::{Function, TupleFn};

/// Smallest mapped value of a group.
pub fn min<Args, K, F>(mapping: F) -> Extreme<K>
where
    K: FactValue + Ord + Clone,
    F: TupleFn<Args, K>,
{
    Extreme {
        mapping: mapping.into_function(),
        largest: false,
    }
}

/// Largest mapped value of a group.
pub fn max<Args, K, F>(mapping: F) -> Extreme<K>
where
    K: FactValue + Ord + Clone,
    F: TupleFn<Args, K>,
{
    Extreme {
        mapping: mapping.into_function(),
        largest: true,
    }
}

pub struct Extreme<K> {
    mapping: Function<K>,
    largest: bool,
}

impl<K> Collector for Extreme<K>
where
    K: FactValue + Ord + Clone,
{
    type State = BTreeMap<K, usize>;
    type Undo = K;
    type Result = Option<K>;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.mapping, columns)
    }

    fn init(&self) -> BTreeMap<K, usize> {
        BTreeMap::new()
    }

    fn accumulate(&self, state: &mut BTreeMap<K, usize>, facts: &[Fact]) -> K {
        let value = self.mapping.call(facts);
        state.increment(value.clone());
        value
    }

    fn undo(&self, state: &mut BTreeMap<K, usize>, value: K) {
        state.decrement(&value);
    }

    fn finish(&self, state: &BTreeMap<K, usize>) -> Option<K> {
        let entry = if self.largest {
            state.last_key_value()
        } else {
            state.first_key_value()
        };
        entry.map(|(value, _)| value.clone())
    }
}
