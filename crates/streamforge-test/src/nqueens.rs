//! N-Queens test fixtures.
//!
//! Queens sit in fixed columns; their row is the planning variable. Two
//! queens conflict when they share a row, an ascending diagonal or a
//! descending diagonal.
//!
//! # Example
//!
//! ```
//! use streamforge_test::nqueens::{conflicts, Queen};
//!
//! let queens = Queen::with_rows(&[0, 2, 1, 3]);
//! assert_eq!(conflicts(&queens), 2);
//! ```

use streamforge_core::PlanningId;

/// A queen.
///
/// - `id`: unique identifier, also its column
/// - `column`: fixed column on the board
/// - `row`: the planning variable, `None` while unassigned
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Queen {
    pub id: i64,
    pub column: i64,
    pub row: Option<i64>,
}

impl Queen {
    pub fn new(id: i64, column: i64, row: Option<i64>) -> Self {
        Self { id, column, row }
    }

    /// Creates a queen with an assigned row.
    pub fn assigned(id: i64, column: i64, row: i64) -> Self {
        Self::new(id, column, Some(row))
    }

    pub fn unassigned(id: i64, column: i64) -> Self {
        Self::new(id, column, None)
    }

    /// Queens in columns `0..rows.len()`, at the given rows.
    pub fn with_rows(rows: &[i64]) -> Vec<Queen> {
        rows.iter()
            .enumerate()
            .map(|(i, &row)| Queen::assigned(i as i64, i as i64, row))
            .collect()
    }

    pub fn ascending_diagonal(&self) -> Option<i64> {
        self.row.map(|row| row + self.column)
    }

    pub fn descending_diagonal(&self) -> Option<i64> {
        self.row.map(|row| row - self.column)
    }
}

impl PlanningId for Queen {
    type Id = i64;

    fn planning_id(&self) -> i64 {
        self.id
    }
}

/// Number of conflicting pairs among the assigned queens, counting a pair
/// once per line it shares.
pub fn conflicts(queens: &[Queen]) -> i64 {
    let mut count = 0;
    for (i, a) in queens.iter().enumerate() {
        for b in &queens[i + 1..] {
            if a.row.is_none() || b.row.is_none() {
                continue;
            }
            if a.row == b.row {
                count += 1;
            }
            if a.ascending_diagonal() == b.ascending_diagonal() {
                count += 1;
            }
            if a.descending_diagonal() == b.descending_diagonal() {
                count += 1;
            }
        }
    }
    count
}

/// Number of conflicting pairs sharing a row.
pub fn row_conflicts(queens: &[Queen]) -> i64 {
    let mut count = 0;
    for (i, a) in queens.iter().enumerate() {
        for b in &queens[i + 1..] {
            if a.row.is_some() && a.row == b.row {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_conflicts() {
        assert_eq!(conflicts(&Queen::with_rows(&[1, 3, 0, 2])), 0);
    }

    #[test]
    fn test_unassigned_queens_never_conflict() {
        let queens = vec![Queen::unassigned(0, 0), Queen::unassigned(1, 1)];
        assert_eq!(conflicts(&queens), 0);
        assert_eq!(row_conflicts(&queens), 0);
    }

    #[test]
    fn test_row_conflicts() {
        assert_eq!(row_conflicts(&Queen::with_rows(&[0, 0, 0])), 3);
    }
}
