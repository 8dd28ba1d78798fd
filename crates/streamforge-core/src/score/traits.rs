//! Core Score trait definition

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::{Add, Neg, Sub};

use super::ScoreLevel;

/// Core trait for all score types.
///
/// Scores are immutable, thread-safe and totally ordered; higher is better.
/// When comparing, higher-priority levels are compared first.
///
/// `Clone` rather than `Copy` is required so that scores with a runtime
/// number of levels (`BendableScore`) fit the same trait.
pub trait Score:
    Clone
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + Hash
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// A solution is feasible when no hard level is negative.
    fn is_feasible(&self) -> bool;

    /// Returns the zero score (identity element for addition).
    fn zero() -> Self;

    /// Returns the number of score levels of this value.
    fn levels_count(&self) -> usize;

    /// Returns the level values, highest priority first.
    fn to_level_numbers(&self) -> Vec<i64>;

    /// Creates a score from level numbers.
    ///
    /// # Panics
    /// Panics if the number of levels is not valid for the type.
    fn from_level_numbers(levels: &[i64]) -> Self;

    /// Multiplies every level by an integer, or returns `None` if a level
    /// overflows `i64`.
    fn checked_scale(&self, factor: i64) -> Option<Self>;

    /// Multiplies every level by an integer, exactly.
    ///
    /// This is the scalar multiplication applied to constraint weights and
    /// match weights.
    ///
    /// # Panics
    /// Panics if a level overflows `i64`.
    fn scale(&self, factor: i64) -> Self {
        match self.checked_scale(factor) {
            Some(scaled) => scaled,
            None => panic!("score {} scaled by {} overflows i64", self, factor),
        }
    }

    /// Multiplies this score by a real factor, rounding each level.
    fn multiply(&self, multiplicand: f64) -> Self;

    /// Divides this score by a real divisor, rounding each level.
    fn divide(&self, divisor: f64) -> Self;

    /// Returns the absolute value of every level.
    fn abs(&self) -> Self;

    /// Returns the label of the level at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.levels_count()`.
    fn level_label(&self, index: usize) -> ScoreLevel;

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn is_better_than(&self, other: &Self) -> bool {
        self > other
    }

    fn is_worse_than(&self, other: &Self) -> bool {
        self < other
    }

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

/// Scores that can be parsed from their string form.
pub trait ParseableScore: Score {
    /// Parses a score from a string representation.
    ///
    /// # Format
    /// - SimpleScore: "42" or "42init"
    /// - HardSoftScore: "0hard/-100soft"
    /// - HardMediumSoftScore: "0hard/0medium/-100soft"
    /// - BendableScore: "[0/-1]hard/[-10/-20]soft"
    fn parse(s: &str) -> Result<Self, ScoreParseError>;

    /// Returns the string representation accepted by `parse`.
    fn to_string_repr(&self) -> String;
}

/// Error when parsing a score from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreParseError {
    pub message: String,
}

impl std::fmt::Display for ScoreParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score parse error: {}", self.message)
    }
}

impl std::error::Error for ScoreParseError {}
