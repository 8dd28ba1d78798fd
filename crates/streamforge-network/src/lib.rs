//! Incremental constraint evaluation for StreamForge.
//!
//! Constraints are described as streams over working facts, then built into
//! a dataflow network of sources, filters, maps, joins, groups, existence
//! checks and scorers. The network keeps the score and the constraint
//! matches current as facts are inserted, updated and retracted, touching
//! only the tuples a change affects.
//!
//! - [`stream`]: the description API ([`ConstraintFactory`], [`StreamSpec`])
//! - [`joiner`] and [`collector`]: join conditions and group aggregations
//! - [`director`]: building networks and mutating their facts
//! - [`analysis`]: matches, explanations and indictments
//!
//! # Architecture
//!
//! Structurally identical sub-pipelines of different constraints are built
//! once. Every node owns private store slots in the tuples it reads, and a
//! change is propagated layer by layer: each node drains its retracts, then
//! its updates, then its inserts, so no node is visited with partial
//! upstream state.

pub mod analysis;
pub mod collector;
pub mod director;
pub mod fact;
pub mod function;
pub mod joiner;
pub mod key;
pub mod network;
pub mod stream;
pub mod tuple;
pub mod weight_overrides;

mod accumulator;
mod build;
mod node;


pub use analysis::{
    ConstraintAnalysis, ConstraintJustification, ConstraintMatchTotal, DetailedConstraintMatch,
    EntityRef, Indictment, IndictmentMap, ScoreExplanation,
};
pub use build::{MAX_COLLECTORS, MAX_GROUP_KEYS};
pub use collector::{Collector, CollectorDef};
pub use director::{ScoreDirector, ScoreDirectorFactory};
pub use fact::{fact, Fact, FactHandle, FactType, FactValue};
pub use function::{function, Function, TupleFn};
pub use joiner::{Joiner, JoinerChain};
pub use key::Key;
pub use network::{NetworkBlueprint, NetworkStats};
pub use node::{NodeKind, NodeStats};
pub use stream::{ConstraintBuilder, ConstraintDef, ConstraintFactory, Grouping, StreamSpec};
pub use tuple::{TupleList, TupleState, MAX_ARITY};
pub use weight_overrides::ConstraintWeightOverrides;
