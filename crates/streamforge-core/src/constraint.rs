//! Constraint identification.
//!
//! A constraint is identified by its package and name. Two constraints in the
//! same network must never share a full name.

use std::fmt;

/// Reference to a constraint.
///
/// # Example
///
/// ```
/// use streamforge_core::ConstraintRef;
///
/// let cr = ConstraintRef::new("queens", "Row conflict");
/// assert_eq!(cr.full_name(), "queens/Row conflict");
///
/// let bare = ConstraintRef::new("", "Row conflict");
/// assert_eq!(bare.full_name(), "Row conflict");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintRef {
    /// Package the constraint belongs to; may be empty.
    pub package: String,
    /// Name of the constraint.
    pub name: String,
}

impl ConstraintRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Splits `"package/name"` at the last `/`. A string without `/` is a bare name.
    pub fn parse(full_name: &str) -> Self {
        match full_name.rsplit_once('/') {
            Some((package, name)) => Self::new(package, name),
            None => Self::new("", full_name),
        }
    }

    /// Returns the fully qualified name.
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.package, self.name)
        }
    }
}

impl fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.package, self.name)
        }
    }
}

/// Direction of a constraint's impact on the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImpactType {
    /// Subtract from the score.
    Penalty,
    /// Add to the score.
    Reward,
}

impl ImpactType {
    /// `-1` for penalties, `1` for rewards.
    #[inline]
    pub const fn sign(self) -> i64 {
        match self {
            ImpactType::Penalty => -1,
            ImpactType::Reward => 1,
        }
    }
}
