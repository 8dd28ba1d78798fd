//! LoadBalance collector computing the unfairness of a load distribution.
//!
//! Unfairness is the square root of the sum of squared deviations of each
//! balanced item's load from the mean load. Zero means perfectly balanced.
//! The state keeps the sum and the sum of squares of the loads, so adding or
//! removing one contribution is O(1).

use std::collections::HashMap;
use std::hash::Hash;

use super::{check_function, Collector};
use crate::fact::{Fact, FactType, FactValue};
use crate::function::{Function, TupleFn};

/// Loads per balanced item and their unfairness.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalance<K: Hash + Eq> {
    loads: HashMap<K, i64>,
    unfairness: i64,
}

impl<K: Hash + Eq> LoadBalance<K> {
    pub fn loads(&self) -> &HashMap<K, i64> {
        &self.loads
    }

    /// Unfairness rounded to an integer, ready to be used as a match weight.
    #[inline]
    pub fn unfairness(&self) -> i64 {
        self.unfairness
    }
}

/// Creates a load balance collector.
///
/// # Example
///
/// ```
/// use streamforge_network::collector::{load_balance, Collector};
/// use streamforge_network::fact::fact;
///
/// #[derive(Debug)]
/// struct Shift { employee: u32 }
///
/// let balance = load_balance(|s: &Shift| s.employee, |_: &Shift| 1i64);
/// let mut state = balance.init();
/// for employee in [0, 0, 1] {
///     balance.accumulate(&mut state, &[fact(Shift { employee })]);
/// }
/// // Loads 2 and 1 around a mean of 1.5: sqrt(0.25 + 0.25) rounds to 1.
/// assert_eq!(balance.finish(&state).unfairness(), 1);
/// ```
pub fn load_balance<Args, K, F, M>(balanced: F, load: M) -> LoadBalanceCollector<K>
where
    K: FactValue + Clone + Hash + Eq,
    F: TupleFn<Args, K>,
    M: TupleFn<Args, i64>,
{
    LoadBalanceCollector {
        balanced: balanced.into_function(),
        load: load.into_function(),
    }
}

pub struct LoadBalanceCollector<K> {
    balanced: Function<K>,
    load: Function<i64>,
}

#[derive(Debug)]
pub struct LoadBalanceState<K> {
    // load and number of contributions per balanced item
    loads: HashMap<K, (i64, usize)>,
    sum: i128,
    sum_of_squares: i128,
}

impl<K: Hash + Eq> LoadBalanceState<K> {
    fn add(&mut self, key: K, diff: i64, contributions: isize) {
        let entry = self.loads.entry(key).or_insert((0, 0));
        let old = entry.0 as i128;
        entry.0 += diff;
        entry.1 = entry.1.wrapping_add_signed(contributions);
        let new = entry.0 as i128;
        self.sum += new - old;
        self.sum_of_squares += new * new - old * old;
    }

    fn unfairness(&self) -> i64 {
        let n = self.loads.len() as f64;
        if n == 0.0 {
            return 0;
        }
        let squared_deviation = self.sum_of_squares as f64 - (self.sum as f64).powi(2) / n;
        squared_deviation.max(0.0).sqrt().round() as i64
    }
}

impl<K> Collector for LoadBalanceCollector<K>
where
    K: FactValue + Clone + Hash + Eq,
{
    type State = LoadBalanceState<K>;
    type Undo = (K, i64);
    type Result = LoadBalance<K>;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.balanced, columns)?;
        check_function(&self.load, columns)
    }

    fn init(&self) -> LoadBalanceState<K> {
        LoadBalanceState {
            loads: HashMap::new(),
            sum: 0,
            sum_of_squares: 0,
        }
    }

    fn accumulate(&self, state: &mut LoadBalanceState<K>, facts: &[Fact]) -> (K, i64) {
        let key = self.balanced.call(facts);
        let load = self.load.call(facts);
        state.add(key.clone(), load, 1);
        (key, load)
    }

    fn undo(&self, state: &mut LoadBalanceState<K>, (key, load): (K, i64)) {
        state.add(key.clone(), -load, -1);
        if state.loads.get(&key).is_some_and(|&(_, n)| n == 0) {
            state.loads.remove(&key);
        }
    }

    fn finish(&self, state: &LoadBalanceState<K>) -> LoadBalance<K> {
        LoadBalance {
            loads: state
                .loads
                .iter()
                .map(|(key, &(load, _))| (key.clone(), load))
                .collect(),
            unfairness: state.unfairness(),
        }
    }
}
