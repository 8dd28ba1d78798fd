//! Score corruption checks.
//!
//! The incremental score is compared with a from-scratch evaluation: a new
//! network instantiated from the same blueprint, fed with the current facts.

use std::sync::Arc;

use streamforge_core::{ConstraintScoreDiff, CorruptionReport, Result, Score, StreamForgeError};
use tracing::error;

use super::ScoreDirector;
use crate::network::NodeNetwork;

impl<Sc: Score> ScoreDirector<Sc> {
    /// Compares the incremental score with a from-scratch evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`StreamForgeError::ScoreCorruption`] on any difference, in
    /// the total or in a single constraint.
    pub fn verify_score(&self) -> Result<()> {
        match self.compare("verify_score") {
            None => Ok(()),
            Some(mut report) => {
                report.after_move = self.snapshot();
                Err(corruption(report))
            }
        }
    }

    /// Applies `do_move`, checks the score, applies `undo_move` and checks
    /// that the score is back to its value before the move. Any error of
    /// the closures is returned as is.
    ///
    /// The check runs whatever the environment mode.
    pub fn assert_move_undo<D, U>(&mut self, description: &str, do_move: D, undo_move: U) -> Result<()>
    where
        D: FnOnce(&mut Self) -> Result<()>,
        U: FnOnce(&mut Self) -> Result<()>,
    {
        self.checking_move = true;
        let checked = self.check_move_undo(description, do_move, undo_move);
        self.checking_move = false;
        checked
    }

    fn check_move_undo<D, U>(&mut self, description: &str, do_move: D, undo_move: U) -> Result<()>
    where
        D: FnOnce(&mut Self) -> Result<()>,
        U: FnOnce(&mut Self) -> Result<()>,
    {
        let before_score = self.network.score();
        let before_move = self.snapshot();

        do_move(self)?;
        if let Some(mut report) = self.compare(description) {
            report.before_move = before_move;
            report.after_move = self.snapshot();
            return Err(corruption(report));
        }
        let after_move = self.snapshot();

        undo_move(self)?;
        let undo_description = format!("undo of {}", description);
        let mut report = match self.compare(&undo_description) {
            Some(report) => report,
            None if self.network.score() == before_score => return Ok(()),
            // Consistent, but the undo did not restore the facts.
            None => CorruptionReport {
                move_description: undo_description,
                incremental_score: self.network.score().to_string(),
                from_scratch_score: before_score.to_string(),
                ..CorruptionReport::default()
            },
        };
        report.before_move = before_move;
        report.after_move = after_move;
        report.after_undo = self.snapshot();
        Err(corruption(report))
    }

    /// Panics with the corruption report if the score is corrupted.
    pub(super) fn assert_score(&self, description: &str) {
        if let Some(mut report) = self.compare(description) {
            report.after_move = self.snapshot();
            let err = corruption(report);
            panic!("{}", err);
        }
    }

    fn from_scratch(&self) -> NodeNetwork<Sc> {
        let mut network = NodeNetwork::new(Arc::clone(self.network.blueprint()), false);
        for (&handle, value) in &self.facts {
            network.insert(handle, Arc::clone(value));
        }
        network.settle();
        network
    }

    fn compare(&self, description: &str) -> Option<CorruptionReport> {
        let scratch = self.from_scratch();
        let blueprint = self.network.blueprint();
        let constraint_diffs: Vec<ConstraintScoreDiff> = (0..blueprint.constraint_count())
            .filter_map(|index| {
                let incremental = self.network.constraint_score(index);
                let from_scratch = scratch.constraint_score(index);
                (incremental != from_scratch).then(|| ConstraintScoreDiff {
                    constraint: blueprint.constraint(index).constraint_ref.full_name(),
                    incremental: incremental.to_string(),
                    from_scratch: from_scratch.to_string(),
                })
            })
            .collect();
        let incremental = self.network.score();
        let from_scratch = scratch.score();
        if incremental == from_scratch && constraint_diffs.is_empty() {
            return None;
        }
        Some(CorruptionReport {
            move_description: description.to_string(),
            incremental_score: incremental.to_string(),
            from_scratch_score: from_scratch.to_string(),
            constraint_diffs,
            ..CorruptionReport::default()
        })
    }

    fn snapshot(&self) -> Vec<String> {
        self.facts
            .iter()
            .map(|(handle, value)| format!("{} {:?}", handle, value))
            .collect()
    }
}

fn corruption(report: CorruptionReport) -> StreamForgeError {
    error!(
        event = "score_corruption",
        move_description = %report.move_description,
        incremental = %report.incremental_score,
        from_scratch = %report.from_scratch_score,
        constraints = report.constraint_diffs.len(),
    );
    StreamForgeError::ScoreCorruption(Box::new(report))
}
