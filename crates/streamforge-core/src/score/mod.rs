//! Score types for representing solution quality
//!
//! Scores are immutable values ordered level by level, highest priority
//! first. The network only ever adds, subtracts, negates and scales them.

#[macro_use]
mod macros;

mod bendable;
mod hard_medium_soft;
mod hard_soft;
mod simple;
mod traits;

#[cfg(test)]
mod tests;

pub use bendable::BendableScore;
pub use hard_medium_soft::HardMediumSoftScore;
pub use hard_soft::HardSoftScore;
pub use simple::SimpleScore;
pub use traits::{ParseableScore, Score, ScoreParseError};

/// Priority class of a score level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreLevel {
    /// Must be satisfied for feasibility
    Hard,
    Medium,
    /// Optimization objective
    Soft,
}
