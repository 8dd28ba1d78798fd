//! Collectors for grouping and aggregating tuples.
//!
//! A collector folds the tuples of one group into a result. Every
//! contribution returns an undo token that removes exactly that contribution
//! again, so a group never has to be recomputed from scratch.
//!
//! # Example
//!
//! ```
//! use streamforge_network::collector::{count, sum, Collector};
//! use streamforge_network::fact::fact;
//!
//! #[derive(Debug)]
//! struct Shift { hours: i64 }
//!
//! let total = sum(|s: &Shift| s.hours);
//! let mut state = total.init();
//! let first = total.accumulate(&mut state, &[fact(Shift { hours: 8 })]);
//! total.accumulate(&mut state, &[fact(Shift { hours: 4 })]);
//! assert_eq!(total.finish(&state), 12);
//!
//! total.undo(&mut state, first);
//! assert_eq!(total.finish(&state), 4);
//!
//! let shifts = count();
//! let state = shifts.init();
//! assert_eq!(shifts.finish(&state), 0);
//! ```

mod compose;
mod container;
mod count;
mod extremes;
mod load_balance;
mod sum;


pub use compose::{compose2, compose3, compose4, conditionally, Compose2, Compose3, Compose4, Conditionally};
pub use container::{count_distinct, to_list, to_set, to_sorted_set, CountDistinct, ToList, ToSet, ToSortedSet};
pub use count::{count, Count};
pub use extremes::{max, min, Extreme};
pub use load_balance::{load_balance, LoadBalance, LoadBalanceCollector};
pub use sum::{average, sum, Average, Sum};

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::fact::{Fact, FactType, FactValue};
use crate::function::Function;

/// An incremental aggregation.
///
/// `accumulate` adds the contribution of one tuple to the state and returns
/// the token that `undo` needs to take it out again.
pub trait Collector: Send + Sync + 'static {
    type State: Send + 'static;
    type Undo: Send + 'static;
    type Result: FactValue;

    /// Checks that the functions of this collector accept the columns of the
    /// grouped stream.
    fn check_columns(&self, columns: &[FactType]) -> Result<(), String>;

    fn init(&self) -> Self::State;

    fn accumulate(&self, state: &mut Self::State, facts: &[Fact]) -> Self::Undo;

    fn undo(&self, state: &mut Self::State, undo: Self::Undo);

    fn finish(&self, state: &Self::State) -> Self::Result;
}

pub(crate) fn check_function<T: 'static>(function: &Function<T>, columns: &[FactType]) -> Result<(), String> {
    if function.arg_types() == columns {
        Ok(())
    } else {
        Err(format!(
            "collector function takes {:?} but the stream has columns {:?}",
            function.arg_types(),
            columns
        ))
    }
}

type AnyBox = Box<dyn Any + Send>;

trait DynCollector: Send + Sync {
    fn check_columns(&self, columns: &[FactType]) -> Result<(), String>;
    fn init(&self) -> AnyBox;
    fn accumulate(&self, state: &mut (dyn Any + Send), facts: &[Fact]) -> AnyBox;
    fn undo(&self, state: &mut (dyn Any + Send), undo: AnyBox);
    fn finish(&self, state: &(dyn Any + Send)) -> Fact;
}

fn state_mut<S: 'static>(state: &mut (dyn Any + Send)) -> &mut S {
    match state.downcast_mut::<S>() {
        Some(state) => state,
        None => panic!("Impossible state: collector state of the wrong type"),
    }
}

impl<C: Collector> DynCollector for C {
    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        Collector::check_columns(self, columns)
    }

    fn init(&self) -> AnyBox {
        Box::new(Collector::init(self))
    }

    fn accumulate(&self, state: &mut (dyn Any + Send), facts: &[Fact]) -> AnyBox {
        Box::new(Collector::accumulate(self, state_mut::<C::State>(state), facts))
    }

    fn undo(&self, state: &mut (dyn Any + Send), undo: AnyBox) {
        match undo.downcast::<C::Undo>() {
            Ok(undo) => Collector::undo(self, state_mut::<C::State>(state), *undo),
            Err(_) => panic!("Impossible state: collector undo token of the wrong type"),
        }
    }

    fn finish(&self, state: &(dyn Any + Send)) -> Fact {
        match state.downcast_ref::<C::State>() {
            Some(state) => Arc::new(Collector::finish(self, state)),
            None => panic!("Impossible state: collector state of the wrong type"),
        }
    }
}

/// A collector with its types erased, as stored in the network.
#[derive(Clone)]
pub struct CollectorDef {
    inner: Arc<dyn DynCollector>,
    result_type: FactType,
}

impl<C: Collector> From<C> for CollectorDef {
    fn from(collector: C) -> Self {
        Self {
            inner: Arc::new(collector),
            result_type: FactType::of::<C::Result>(),
        }
    }
}

impl CollectorDef {
    pub fn result_type(&self) -> FactType {
        self.result_type
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub(crate) fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        self.inner.check_columns(columns)
    }

    pub(crate) fn init(&self) -> AnyBox {
        self.inner.init()
    }

    pub(crate) fn accumulate(&self, state: &mut AnyBox, facts: &[Fact]) -> AnyBox {
        self.inner.accumulate(&mut **state, facts)
    }

    pub(crate) fn undo(&self, state: &mut AnyBox, undo: AnyBox) {
        self.inner.undo(&mut **state, undo)
    }

    pub(crate) fn finish(&self, state: &AnyBox) -> Fact {
        self.inner.finish(&**state)
    }
}

impl fmt::Debug for CollectorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Collector -> {:?}", self.result_type)
    }
}
