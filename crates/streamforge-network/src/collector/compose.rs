//! Collector combinators.

use super::{check_function, Collector};
use crate::fact::{Fact, FactType, FactValue};
use crate::function::{Function, TupleFn};

/// Only lets tuples matching `predicate` reach `collector`.
pub fn conditionally<Args, P, C>(predicate: P, collector: C) -> Conditionally<C>
where
    P: TupleFn<Args, bool>,
    C: Collector,
{
    Conditionally {
        predicate: predicate.into_function(),
        inner: collector,
    }
}

pub struct Conditionally<C> {
    predicate: Function<bool>,
    inner: C,
}

impl<C: Collector> Collector for Conditionally<C> {
    type State = C::State;
    type Undo = Option<C::Undo>;
    type Result = C::Result;

    fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
        check_function(&self.predicate, columns)?;
        self.inner.check_columns(columns)
    }

    fn init(&self) -> C::State {
        self.inner.init()
    }

    fn accumulate(&self, state: &mut C::State, facts: &[Fact]) -> Option<C::Undo> {
        self.predicate
            .call(facts)
            .then(|| self.inner.accumulate(state, facts))
    }

    fn undo(&self, state: &mut C::State, undo: Option<C::Undo>) {
        if let Some(undo) = undo {
            self.inner.undo(state, undo);
        }
    }

    fn finish(&self, state: &C::State) -> C::Result {
        self.inner.finish(state)
    }
}

macro_rules! compose_collector {
    ($name:ident, $fn_name:ident, $doc:literal; $($c:ident $arg:ident $idx:tt),+) => {
        #[doc = $doc]
        pub fn $fn_name<$($c,)+ R, F>($($arg: $c,)+ finisher: F) -> $name<$($c,)+ F>
        where
            $($c: Collector,)+
            R: FactValue,
            F: Fn($(&$c::Result),+) -> R + Send + Sync + 'static,
        {
            $name { parts: ($($arg,)+), finisher }
        }

        pub struct $name<$($c,)+ F> {
            parts: ($($c,)+),
            finisher: F,
        }

        impl<$($c,)+ R, F> Collector for $name<$($c,)+ F>
        where
            $($c: Collector,)+
            R: FactValue,
            F: Fn($(&$c::Result),+) -> R + Send + Sync + 'static,
        {
            type State = ($($c::State,)+);
            type Undo = ($($c::Undo,)+);
            type Result = R;

            fn check_columns(&self, columns: &[FactType]) -> Result<(), String> {
                $( self.parts.$idx.check_columns(columns)?; )+
                Ok(())
            }

            fn init(&self) -> Self::State {
                ($(self.parts.$idx.init(),)+)
            }

            fn accumulate(&self, state: &mut Self::State, facts: &[Fact]) -> Self::Undo {
                ($(self.parts.$idx.accumulate(&mut state.$idx, facts),)+)
            }

            fn undo(&self, state: &mut Self::State, undo: Self::Undo) {
                $( self.parts.$idx.undo(&mut state.$idx, undo.$idx); )+
            }

            fn finish(&self, state: &Self::State) -> R {
                (self.finisher)($(&self.parts.$idx.finish(&state.$idx)),+)
            }
        }
    };
}

compose_collector!(Compose2, compose2, "Runs two collectors over one walk of the group and combines their results."; C1 c1 0, C2 c2 1);
compose_collector!(Compose3, compose3, "Runs three collectors over one walk of the group and combines their results."; C1 c1 0, C2 c2 1, C3 c3 2);
compose_collector!(Compose4, compose4, "Runs four collectors over one walk of the group and combines their results."; C1 c1 0, C2 c2 1, C3 c3 2, C4 c4 3);
