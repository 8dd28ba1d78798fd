// Constraint factory for creating streams.
//
// The factory is the entry point for the fluent constraint API.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;

use streamforge_core::PlanningId;

use super::StreamSpec;
use crate::fact::{FactType, FactValue};
use crate::joiner::{less_than, Joiner, JoinerChain};

// Entry point of the stream API.
//
// Sources of the same fact type are always shared. The factory also keeps
// the ordering joiner of each unique-pair stream, so that unique pairs of
// the same type built through one factory share their join when they are
// given the same joiners.
#[derive(Default)]
pub struct ConstraintFactory {
    pair_orderings: RefCell<HashMap<TypeId, Joiner>>,
}

impl ConstraintFactory {
    pub fn new() -> Self {
        Self::default()
    }

    // Every working fact of type `T`.
    pub fn for_each<T: FactValue>(&self) -> StreamSpec {
        StreamSpec::for_each(FactType::of::<T>())
    }

    // Every unordered pair of distinct facts of type `T` matching `joiners`,
    // as `(a, b)` with `a.planning_id() < b.planning_id()`.
    pub fn for_each_unique_pair<T>(&self, joiners: impl Into<JoinerChain>) -> StreamSpec
    where
        T: FactValue + PlanningId,
    {
        let ordering = self
            .pair_orderings
            .borrow_mut()
            .entry(TypeId::of::<T>())
            .or_insert_with(|| less_than(|t: &T| t.planning_id()))
            .clone();
        self.for_each::<T>()
            .join(self.for_each::<T>(), joiners.into().and(ordering))
    }
}

impl std::fmt::Debug for ConstraintFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintFactory").finish()
    }
}
