//! Sum and average collectors.

use std::ops::Sub;

use num_traits::{PrimInt, Zero};

use super::{check_function, Collector};
use crate::fact::{Fact, FactType, FactValue};
use crate::function::{Function, TupleFn};

/// Sums a numeric mapping of the tuples of a group.
pub fn sum<Args, N, F>(mapping: F) -> Sum<N>
where
    N: FactValue + Copy + Zero + Sub<Output = N>,
    F: TupleFn<Args, N>,
{
    Sum {
        mapping: mapping.into_function(),
    }
}

pub struct Sum<N> {
    mapping: Function<N>,
}

impl<N> Collector for Sum<N>
where
    N: FactValue + Copy + Zero + Sub<Output = N>,
{
    type State = N;
    type Undo = N;
    type Result = N;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.mapping, columns)
    }

    fn init(&self) -> N {
        N::zero()
    }

    #[inline]
    fn accumulate(&self, state: &mut N, facts: &[Fact]) -> N {
        let value = self.mapping.call(facts);
        *state = *state + value;
        value
    }

    #[inline]
    fn undo(&self, state: &mut N, value: N) {
        *state = *state - value;
    }

    fn finish(&self, state: &N) -> N {
        *state
    }
}

/// Averages an integer mapping; `None` for an empty group.
pub fn average<Args, N, F>(mapping: F) -> Average<N>
where
    N: FactValue + PrimInt,
    F: TupleFn<Args, N>,
{
    Average {
        mapping: mapping.into_function(),
    }
}

pub struct Average<N> {
    mapping: Function<N>,
}

#[derive(Debug, Default)]
pub struct AverageState {
    sum: i128,
    count: usize,
}

impl<N> Collector for Average<N>
where
    N: FactValue + PrimInt,
{
    type State = AverageState;
    type Undo = i128;
    type Result = Option<f64>;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.mapping, columns)
    }

    fn init(&self) -> AverageState {
        AverageState::default()
    }

    fn accumulate(&self, state: &mut AverageState, facts: &[Fact]) -> i128 {
        let value = self.mapping.call(facts).to_i128().unwrap_or_default();
        state.sum += value;
        state.count += 1;
        value
    }

    fn undo(&self, state: &mut AverageState, value: i128) {
        state.sum -= value;
        state.count -= 1;
    }

    fn finish(&self, state: &AverageState) -> Option<f64> {
        (state.count > 0).then(|| state.sum as f64 / state.count as f64)
    }
}
