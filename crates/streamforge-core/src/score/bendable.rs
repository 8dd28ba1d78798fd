//! BendableScore - Runtime-configurable multi-level score

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Neg, Sub};

use super::traits::{ParseableScore, Score, ScoreParseError};
use super::ScoreLevel;

/// A score with a runtime number of hard and soft levels.
///
/// `Score::zero()` has no levels at all and acts as the zero of every shape:
/// it compares, adds and hashes as if padded with zeros. Any other pair of
/// scores must have identical shapes.
///
/// # Examples
///
/// ```
/// use streamforge_core::{BendableScore, Score};
///
/// let score = BendableScore::of(vec![-1, -2], vec![-10, -20, -30]);
/// assert_eq!(score.hard_levels_count(), 2);
/// assert_eq!(score.soft_levels_count(), 3);
/// assert!(!score.is_feasible());
/// assert_eq!(score.clone() + BendableScore::zero(), score);
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BendableScore {
    hard_scores: Vec<i64>,
    soft_scores: Vec<i64>,
}

impl BendableScore {
    pub fn of(hard_scores: Vec<i64>, soft_scores: Vec<i64>) -> Self {
        BendableScore {
            hard_scores,
            soft_scores,
        }
    }

    /// Creates a zero score with an explicit shape.
    pub fn zero_with_levels(hard_levels: usize, soft_levels: usize) -> Self {
        BendableScore {
            hard_scores: vec![0; hard_levels],
            soft_scores: vec![0; soft_levels],
        }
    }

    pub fn hard_levels_count(&self) -> usize {
        self.hard_scores.len()
    }

    pub fn soft_levels_count(&self) -> usize {
        self.soft_scores.len()
    }

    /// # Panics
    /// Panics if `level` is out of range.
    pub fn hard_score(&self, level: usize) -> i64 {
        self.hard_scores[level]
    }

    /// # Panics
    /// Panics if `level` is out of range.
    pub fn soft_score(&self, level: usize) -> i64 {
        self.soft_scores[level]
    }

    pub fn hard_scores(&self) -> &[i64] {
        &self.hard_scores
    }

    pub fn soft_scores(&self) -> &[i64] {
        &self.soft_scores
    }

    fn is_shapeless(&self) -> bool {
        self.hard_scores.is_empty() && self.soft_scores.is_empty()
    }

    // Combines two scores level by level, padding a shapeless operand.
    fn zip_with(&self, other: &Self, op: impl Fn(i64, i64) -> i64) -> Self {
        let (hard, soft) = self.shape_with(other);
        let level = |levels: &[i64], i: usize| levels.get(i).copied().unwrap_or(0);
        BendableScore {
            hard_scores: (0..hard)
                .map(|i| op(level(&self.hard_scores, i), level(&other.hard_scores, i)))
                .collect(),
            soft_scores: (0..soft)
                .map(|i| op(level(&self.soft_scores, i), level(&other.soft_scores, i)))
                .collect(),
        }
    }

    fn shape_with(&self, other: &Self) -> (usize, usize) {
        if self.is_shapeless() {
            return (other.hard_levels_count(), other.soft_levels_count());
        }
        if !other.is_shapeless() {
            assert!(
                self.hard_levels_count() == other.hard_levels_count()
                    && self.soft_levels_count() == other.soft_levels_count(),
                "Incompatible BendableScore shapes: {}/{} vs {}/{}",
                self.hard_levels_count(),
                self.soft_levels_count(),
                other.hard_levels_count(),
                other.soft_levels_count()
            );
        }
        (self.hard_levels_count(), self.soft_levels_count())
    }

    fn map_levels(&self, op: impl Fn(i64) -> i64) -> Self {
        BendableScore {
            hard_scores: self.hard_scores.iter().map(|&s| op(s)).collect(),
            soft_scores: self.soft_scores.iter().map(|&s| op(s)).collect(),
        }
    }
}

impl Score for BendableScore {
    fn is_feasible(&self) -> bool {
        self.hard_scores.iter().all(|&s| s >= 0)
    }

    fn zero() -> Self {
        BendableScore::default()
    }

    fn levels_count(&self) -> usize {
        self.hard_scores.len() + self.soft_scores.len()
    }

    fn to_level_numbers(&self) -> Vec<i64> {
        let mut levels = self.hard_scores.clone();
        levels.extend(self.soft_scores.iter());
        levels
    }

    /// Splits the levels evenly, the extra level (if any) going to soft.
    fn from_level_numbers(levels: &[i64]) -> Self {
        let mid = levels.len() / 2;
        BendableScore::of(levels[..mid].to_vec(), levels[mid..].to_vec())
    }

    fn checked_scale(&self, factor: i64) -> Option<Self> {
        let scale = |levels: &[i64]| -> Option<Vec<i64>> {
            levels.iter().map(|&s| s.checked_mul(factor)).collect()
        };
        Some(BendableScore {
            hard_scores: scale(&self.hard_scores)?,
            soft_scores: scale(&self.soft_scores)?,
        })
    }

    fn multiply(&self, multiplicand: f64) -> Self {
        self.map_levels(|s| (s as f64 * multiplicand).round() as i64)
    }

    fn divide(&self, divisor: f64) -> Self {
        self.map_levels(|s| (s as f64 / divisor).round() as i64)
    }

    fn abs(&self) -> Self {
        self.map_levels(i64::abs)
    }

    fn level_label(&self, index: usize) -> ScoreLevel {
        if index < self.hard_scores.len() {
            ScoreLevel::Hard
        } else if index < self.levels_count() {
            ScoreLevel::Soft
        } else {
            panic!(
                "BendableScore has {} levels, got index {}",
                self.levels_count(),
                index
            )
        }
    }
}

impl PartialEq for BendableScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BendableScore {}

// Zero levels are skipped so that a shapeless zero hashes like a shaped one.
impl Hash for BendableScore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (class, levels) in [(0u8, &self.hard_scores), (1u8, &self.soft_scores)] {
            for (index, &value) in levels.iter().enumerate() {
                if value != 0 {
                    (class, index, value).hash(state);
                }
            }
        }
    }
}

impl Ord for BendableScore {
    fn cmp(&self, other: &Self) -> Ordering {
        let difference = self.zip_with(other, |a, b| a.cmp(&b) as i64);
        difference
            .hard_scores
            .iter()
            .chain(difference.soft_scores.iter())
            .find(|&&c| c != 0)
            .map_or(Ordering::Equal, |&c| c.cmp(&0))
    }
}

impl PartialOrd for BendableScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for BendableScore {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.zip_with(&other, |a, b| a + b)
    }
}

impl Sub for BendableScore {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.zip_with(&other, |a, b| a - b)
    }
}

impl Neg for BendableScore {
    type Output = Self;

    fn neg(self) -> Self {
        self.map_levels(|s| -s)
    }
}

impl fmt::Debug for BendableScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BendableScore(hard: {:?}, soft: {:?})",
            self.hard_scores, self.soft_scores
        )
    }
}

impl fmt::Display for BendableScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |levels: &[i64]| {
            levels
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join("/")
        };
        write!(
            f,
            "[{}]hard/[{}]soft",
            join(&self.hard_scores),
            join(&self.soft_scores)
        )
    }
}

impl ParseableScore for BendableScore {
    fn parse(s: &str) -> Result<Self, ScoreParseError> {
        let s = s.trim();
        let (hard_part, soft_part) = s.split_once("hard/").ok_or_else(|| ScoreParseError {
            message: format!(
                "Invalid BendableScore format '{}': expected '[...]hard/[...]soft'",
                s
            ),
        })?;

        let hard_part = hard_part
            .trim()
            .strip_prefix('[')
            .and_then(|p| p.strip_suffix(']'))
            .ok_or_else(|| ScoreParseError {
                message: format!("Hard part '{}' must be wrapped in brackets", hard_part),
            })?;
        let soft_part = soft_part
            .trim()
            .strip_suffix("soft")
            .and_then(|p| p.strip_prefix('['))
            .and_then(|p| p.strip_suffix(']'))
            .ok_or_else(|| ScoreParseError {
                message: format!(
                    "Soft part '{}' must be wrapped in brackets and end with 'soft'",
                    soft_part
                ),
            })?;

        Ok(BendableScore::of(
            parse_levels(hard_part, "hard")?,
            parse_levels(soft_part, "soft")?,
        ))
    }

    fn to_string_repr(&self) -> String {
        self.to_string()
    }
}

fn parse_levels(part: &str, label: &str) -> Result<Vec<i64>, ScoreParseError> {
    part.split('/')
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            p.trim().parse::<i64>().map_err(|e| ScoreParseError {
                message: format!("Invalid {} score '{}': {}", label, p, e),
            })
        })
        .collect()
}
