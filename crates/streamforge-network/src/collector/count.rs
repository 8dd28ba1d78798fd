//! Count collector.

use super::Collector;
use crate::fact::{Fact, FactType};

/// Counts the tuples of a group.
///
/// ```
/// use streamforge_network::collector::{count, Collector};
/// use streamforge_network::fact::fact;
///
/// let c = count();
/// let mut state = c.init();
/// c.accumulate(&mut state, &[fact(1u8)]);
/// c.accumulate(&mut state, &[fact(2u8)]);
/// c.undo(&mut state, ());
/// assert_eq!(c.finish(&state), 1);
/// ```
pub fn count() -> Count {
    Count
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl Collector for Count {
    type State = usize;
    type Undo = ();
    type Result = usize;

    fn check_columns(&self, _columns: &[FactType]) -> Result<(), String> {
        Ok(())
    }

    fn init(&self) -> usize {
        0
    }

    #[inline]
    fn accumulate(&self, state: &mut usize, _facts: &[Fact]) {
        *state += 1;
    }

    #[inline]
    fn undo(&self, state: &mut usize, _undo: ()) {
        *state -= 1;
    }

    fn finish(&self, state: &usize) -> usize {
        *state
    }
}
