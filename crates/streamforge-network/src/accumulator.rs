//! Running score of a network.
//!
//! Scorers report each match with its impact; the accumulator keeps the
//! total, the sum per constraint and, for introspection, the live matches of
//! every constraint.

use slab::Slab;
use streamforge_core::Score;

use crate::analysis::ConstraintJustification;
use crate::tuple::{ListEntry, TupleList};

#[derive(Debug)]
pub(crate) struct MatchRecord<Sc> {
    pub constraint: usize,
    pub impact: Sc,
    /// Only kept when constraint matches are enabled.
    pub justification: Option<ConstraintJustification>,
    entry: ListEntry,
}

#[derive(Debug)]
struct ConstraintScore<Sc> {
    score: Sc,
    matches: TupleList<usize>,
}

#[derive(Debug)]
pub(crate) struct ScoreAccumulator<Sc: Score> {
    total: Sc,
    constraints: Vec<ConstraintScore<Sc>>,
    matches: Slab<MatchRecord<Sc>>,
    matches_enabled: bool,
}

impl<Sc: Score> ScoreAccumulator<Sc> {
    pub fn new(constraint_count: usize, matches_enabled: bool) -> Self {
        Self {
            total: Sc::zero(),
            constraints: (0..constraint_count)
                .map(|_| ConstraintScore {
                    score: Sc::zero(),
                    matches: TupleList::new(),
                })
                .collect(),
            matches: Slab::new(),
            matches_enabled,
        }
    }

    pub fn matches_enabled(&self) -> bool {
        self.matches_enabled
    }

    /// Records a match. Returns its id.
    pub fn add(
        &mut self,
        constraint: usize,
        impact: Sc,
        justification: Option<ConstraintJustification>,
    ) -> usize {
        let id = self.matches.vacant_key();
        let scores = &mut self.constraints[constraint];
        scores.score = scores.score.clone() + impact.clone();
        self.total = self.total.clone() + impact.clone();
        let entry = scores.matches.add(id);
        self.matches.insert(MatchRecord {
            constraint,
            impact,
            justification,
            entry,
        });
        id
    }

    pub fn remove(&mut self, id: usize) {
        let record = self.matches.remove(id);
        let scores = &mut self.constraints[record.constraint];
        scores.matches.remove(record.entry);
        scores.score = scores.score.clone() - record.impact.clone();
        self.total = self.total.clone() - record.impact;
    }

    pub fn total(&self) -> &Sc {
        &self.total
    }

    pub fn constraint_score(&self, constraint: usize) -> &Sc {
        &self.constraints[constraint].score
    }

    pub fn match_count(&self, constraint: usize) -> usize {
        self.constraints[constraint].matches.len()
    }

    /// Live matches of one constraint, oldest first.
    pub fn matches(&self, constraint: usize) -> impl Iterator<Item = &MatchRecord<Sc>> + '_ {
        self.constraints[constraint]
            .matches
            .iter()
            .map(move |&id| &self.matches[id])
    }

    /// Live matches of every constraint.
    pub fn len(&self) -> usize {
        self.matches.len()
    }
}
