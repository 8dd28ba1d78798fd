//! Error types for StreamForge

use std::fmt;

use thiserror::Error;

/// Main error type for StreamForge operations
#[derive(Debug, Error)]
pub enum StreamForgeError {
    /// The constraint graph or its configuration is invalid. Raised while
    /// building, before any fact is inserted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A fact handle that is not (or no longer) part of the working facts.
    #[error("Unknown fact handle {0}")]
    UnknownFact(u64),

    /// A fact was accessed or mutated as the wrong type.
    #[error("Fact type mismatch: expected {expected}, found {found}")]
    FactType {
        expected: &'static str,
        found: &'static str,
    },

    /// The incremental score disagrees with a from-scratch calculation.
    #[error("{0}")]
    ScoreCorruption(Box<CorruptionReport>),

    /// Invalid operation for the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for StreamForge operations
pub type Result<T> = std::result::Result<T, StreamForgeError>;

/// Score difference of one constraint between incremental and from-scratch
/// evaluation. Scores are kept in their display form so the report does not
/// depend on the score type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintScoreDiff {
    pub constraint: String,
    pub incremental: String,
    pub from_scratch: String,
}

/// Everything needed to reproduce a score corruption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorruptionReport {
    /// The move (or operation) after which the corruption was observed.
    pub move_description: String,
    pub incremental_score: String,
    pub from_scratch_score: String,
    pub constraint_diffs: Vec<ConstraintScoreDiff>,
    /// Facts as `Debug` text before the move was applied.
    pub before_move: Vec<String>,
    pub after_move: Vec<String>,
    pub after_undo: Vec<String>,
}

impl fmt::Display for CorruptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Score corruption after [{}]: incremental score {} != from-scratch score {}",
            self.move_description, self.incremental_score, self.from_scratch_score
        )?;
        for diff in &self.constraint_diffs {
            writeln!(
                f,
                "  constraint [{}]: incremental {} / from scratch {}",
                diff.constraint, diff.incremental, diff.from_scratch
            )?;
        }
        write_snapshot(f, "before move", &self.before_move)?;
        write_snapshot(f, "after move", &self.after_move)?;
        write_snapshot(f, "after undo", &self.after_undo)
    }
}

fn write_snapshot(f: &mut fmt::Formatter<'_>, label: &str, facts: &[String]) -> fmt::Result {
    if facts.is_empty() {
        return Ok(());
    }
    writeln!(f, "  facts {} ({}):", label, facts.len())?;
    for fact in facts {
        writeln!(f, "    {}", fact)?;
    }
    Ok(())
}
