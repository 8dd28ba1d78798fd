//! StreamForge Core - shared vocabulary of the constraint network
//!
//! This crate provides the types every other StreamForge crate speaks:
//! - Score types for representing solution quality
//! - Constraint references and impact types
//! - The `PlanningId` trait used for unique-pair joins
//! - The common error type, including score corruption reports

pub mod constraint;
pub mod domain;
pub mod error;
pub mod score;


pub use constraint::{ConstraintRef, ImpactType};
pub use domain::PlanningId;
pub use error::{ConstraintScoreDiff, CorruptionReport, Result, StreamForgeError};
pub use score::{
    BendableScore, HardMediumSoftScore, HardSoftScore, ParseableScore, Score, ScoreLevel,
    ScoreParseError, SimpleScore,
};
