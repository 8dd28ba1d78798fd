//! Minimal entity fixtures.

use streamforge_core::PlanningId;

/// An entity placed on a row.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowEntity {
    pub id: usize,
    pub row: i64,
}

impl RowEntity {
    pub fn new(id: usize, row: i64) -> Self {
        Self { id, row }
    }
}

impl PlanningId for RowEntity {
    type Id = usize;

    fn planning_id(&self) -> usize {
        self.id
    }
}
