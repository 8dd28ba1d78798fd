//! Domain traits facts may implement.

use std::fmt::Debug;
use std::hash::Hash;

/// Unique, stable identification of a fact.
///
/// Required by unique-pair streams: a pair `(a, b)` is only produced when
/// `a.planning_id() < b.planning_id()`, so every unordered pair appears once.
///
/// # Example
///
/// ```
/// use streamforge_core::PlanningId;
///
/// #[derive(Debug)]
/// struct Task {
///     id: i64,
/// }
///
/// impl PlanningId for Task {
///     type Id = i64;
///     fn planning_id(&self) -> i64 { self.id }
/// }
/// ```
pub trait PlanningId {
    /// The identifier type.
    type Id: Ord + Hash + Clone + Debug + Send + Sync + 'static;

    /// Returns the identifier. It must never change while the fact is inserted.
    fn planning_id(&self) -> Self::Id;
}
