//! Score director: the working facts of one network and the operations a
//! search algorithm performs on them.
//!
//! Every mutation is propagated before the call returns, so scores and
//! matches are always current. A director is `Send` but not `Sync`: move it
//! to a worker thread, or [`fork`](ScoreDirector::fork) one per worker.
//!
//! # Example
//!
//! ```
//! use streamforge_config::NetworkConfig;
//! use streamforge_core::{PlanningId, SimpleScore};
//! use streamforge_network::director::ScoreDirectorFactory;
//! use streamforge_network::joiner::equal;
//! use streamforge_network::stream::ConstraintFactory;
//!
//! #[derive(Debug, Clone)]
//! struct Queen { id: u32, row: u32 }
//!
//! impl PlanningId for Queen {
//!     type Id = u32;
//!     fn planning_id(&self) -> u32 { self.id }
//! }
//!
//! let factory = ConstraintFactory::new();
//! let constraints = vec![factory
//!     .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.row))
//!     .penalize(SimpleScore::of(1))
//!     .as_constraint("Row conflict")];
//! let directors = ScoreDirectorFactory::new(constraints, &NetworkConfig::default()).unwrap();
//!
//! let mut director = directors.build_director();
//! director.insert_fact(Queen { id: 0, row: 0 });
//! let q1 = director.insert_fact(Queen { id: 1, row: 0 });
//! assert_eq!(director.calculate_score(), SimpleScore::of(-1));
//!
//! director.update_fact(q1, "row", |q: &mut Queen| q.row = 1).unwrap();
//! assert_eq!(director.calculate_score(), SimpleScore::of(0));
//! ```

mod assert;
mod factory;


pub use factory::ScoreDirectorFactory;

use std::collections::BTreeMap;
use std::sync::Arc;

use streamforge_config::EnvironmentMode;
use streamforge_core::{ConstraintRef, Result, Score, StreamForgeError};
use tracing::{debug, trace};

use crate::analysis::{
    ConstraintAnalysis, ConstraintMatchTotal, IndictmentMap, ScoreExplanation,
};
use crate::fact::{downcast, fact, Fact, FactHandle, FactType, FactValue};
use crate::network::{NetworkBlueprint, NetworkStats, NodeNetwork};

/// Owns the working facts and the network evaluating them.
#[derive(Debug)]
pub struct ScoreDirector<Sc: Score> {
    network: NodeNetwork<Sc>,
    facts: BTreeMap<FactHandle, Fact>,
    next_handle: u64,
    environment_mode: EnvironmentMode,
    matches_enabled: bool,
    /// Set while a move is checked by `assert_move_undo`, which reports
    /// corruptions itself.
    checking_move: bool,
}

impl<Sc: Score> ScoreDirector<Sc> {
    pub(crate) fn new(
        blueprint: Arc<NetworkBlueprint<Sc>>,
        environment_mode: EnvironmentMode,
        matches_enabled: bool,
    ) -> Self {
        Self {
            network: NodeNetwork::new(blueprint, matches_enabled),
            facts: BTreeMap::new(),
            next_handle: 0,
            environment_mode,
            matches_enabled,
            checking_move: false,
        }
    }

    /// Adds a working fact.
    pub fn insert_fact<T: FactValue>(&mut self, value: T) -> FactHandle {
        let handle = FactHandle(self.next_handle);
        self.next_handle += 1;
        let value = fact(value);
        self.facts.insert(handle, Arc::clone(&value));
        self.network.insert(handle, value);
        self.network.settle();
        self.after_mutation(|| format!("insert {}", handle));
        handle
    }

    /// Changes a working fact in place. The fact is copied on write, so
    /// tuples holding the previous value are never affected.
    ///
    /// # Errors
    ///
    /// Fails when `handle` is unknown or does not hold a `T`.
    pub fn update_fact<T, F>(&mut self, handle: FactHandle, variable_name: &str, mutate: F) -> Result<()>
    where
        T: FactValue + Clone,
        F: FnOnce(&mut T),
    {
        let mut value = self.fact::<T>(handle)?.clone();
        mutate(&mut value);
        trace!(event = "update_fact", handle = %handle, variable = variable_name);
        self.store(handle, fact(value));
        self.after_mutation(|| format!("update {}.{}", handle, variable_name));
        Ok(())
    }

    /// Replaces a working fact by a new value of the same type.
    pub fn replace_fact<T: FactValue>(&mut self, handle: FactHandle, value: T) -> Result<()> {
        let current = self.fact_value(handle)?;
        let expected = FactType::of_fact(current);
        if expected != FactType::of::<T>() {
            return Err(StreamForgeError::FactType {
                expected: expected.name(),
                found: std::any::type_name::<T>(),
            });
        }
        self.store(handle, fact(value));
        self.after_mutation(|| format!("replace {}", handle));
        Ok(())
    }

    fn store(&mut self, handle: FactHandle, value: Fact) {
        self.facts.insert(handle, Arc::clone(&value));
        self.network.update(handle, value);
        self.network.settle();
    }

    /// Removes a working fact, returning its last value.
    pub fn retract_fact(&mut self, handle: FactHandle) -> Result<Fact> {
        let value = self
            .facts
            .remove(&handle)
            .ok_or(StreamForgeError::UnknownFact(handle.id()))?;
        self.network.retract(handle, &value);
        self.network.settle();
        self.after_mutation(|| format!("retract {}", handle));
        Ok(value)
    }

    /// The current value of a working fact.
    pub fn fact<T: FactValue>(&self, handle: FactHandle) -> Result<&T> {
        let value = self.fact_value(handle)?;
        downcast::<T>(value).ok_or_else(|| StreamForgeError::FactType {
            expected: std::any::type_name::<T>(),
            found: (**value).type_name(),
        })
    }

    pub fn fact_value(&self, handle: FactHandle) -> Result<&Fact> {
        self.facts
            .get(&handle)
            .ok_or(StreamForgeError::UnknownFact(handle.id()))
    }

    /// Every working fact of type `T`, in insertion order.
    pub fn facts_of<T: FactValue>(&self) -> impl Iterator<Item = (FactHandle, &T)> + '_ {
        self.facts
            .iter()
            .filter_map(|(&handle, value)| downcast::<T>(value).map(|v| (handle, v)))
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// The current score.
    ///
    /// # Panics
    ///
    /// In asserted environment modes, when the score differs from a
    /// from-scratch evaluation of the same facts.
    pub fn calculate_score(&self) -> Sc {
        if self.environment_mode.is_asserted() {
            self.assert_score("calculate_score");
        }
        self.network.score()
    }

    /// Score impact, weight and matches of every constraint. Matches are
    /// only listed when the network was configured to keep them.
    pub fn constraint_match_totals(&self) -> BTreeMap<ConstraintRef, ConstraintMatchTotal<Sc>> {
        self.network
            .constraint_match_totals()
            .into_iter()
            .map(|total| (total.constraint_ref.clone(), total))
            .collect()
    }

    /// The score broken down by constraint, in constraint order.
    pub fn explain(&self) -> ScoreExplanation<Sc> {
        let analyses = self
            .network
            .constraint_match_totals()
            .into_iter()
            .map(ConstraintAnalysis::from)
            .collect();
        ScoreExplanation::new(self.network.score(), analyses)
    }

    /// The score impact of every fact taking part in a match.
    pub fn indictments(&self) -> IndictmentMap<Sc> {
        let totals = self.network.constraint_match_totals();
        IndictmentMap::from_matches(totals.iter().flat_map(|total| &total.matches))
    }

    /// An independent director over the same facts, with the same handles.
    /// The network is rebuilt from the shared blueprint; nothing is shared
    /// with `self` but the immutable facts.
    pub fn fork(&self) -> ScoreDirector<Sc> {
        let mut forked = ScoreDirector::new(
            Arc::clone(self.network.blueprint()),
            self.environment_mode,
            self.matches_enabled,
        );
        for (&handle, value) in &self.facts {
            forked.facts.insert(handle, Arc::clone(value));
            forked.network.insert(handle, Arc::clone(value));
        }
        forked.next_handle = self.next_handle;
        forked.network.settle();
        debug!(event = "fork", facts = forked.facts.len());
        forked
    }

    /// Tuples currently allocated by the network.
    pub fn live_tuple_count(&self) -> usize {
        self.network.live_tuple_count()
    }

    pub fn network_stats(&self) -> NetworkStats {
        self.network.stats()
    }

    pub fn blueprint(&self) -> &NetworkBlueprint<Sc> {
        self.network.blueprint()
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.environment_mode
    }

    fn after_mutation(&self, description: impl FnOnce() -> String) {
        if self.environment_mode.is_fully_asserted() && !self.checking_move {
            self.assert_score(&description());
        }
    }
}
