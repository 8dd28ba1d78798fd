use std::sync::Arc;

use streamforge_core::Score;

use super::Event;
use crate::accumulator::ScoreAccumulator;
use crate::analysis::{ConstraintJustification, EntityRef};
use crate::fact::Fact;
use crate::function::Function;
use crate::tuple::{StoreValue, TupleArena, TupleId};

#[derive(Debug)]
pub(crate) struct ScorerDef<Sc: Score> {
    /// Index of the constraint in the network.
    pub constraint: usize,
    /// Impact of a match of weight 1: the constraint weight, negated for
    /// penalties.
    pub unit_impact: Sc,
    pub match_weigher: Option<Function<i64>>,
    pub justification: Option<Function<ConstraintJustification>>,
    pub slot: usize,
}

impl<Sc: Score> ScorerDef<Sc> {
    fn impact(&self, facts: &[Fact]) -> Sc {
        match &self.match_weigher {
            Some(weigher) => self.unit_impact.scale(weigher.call(facts)),
            None => self.unit_impact.clone(),
        }
    }

    fn justify(&self, facts: &[Fact]) -> ConstraintJustification {
        match &self.justification {
            Some(justify) => justify.call(facts),
            None => ConstraintJustification::new(facts.iter().map(EntityRef::from_fact).collect()),
        }
    }
}

/// Terminal node of a constraint: turns each tuple into a match.
#[derive(Debug)]
pub(crate) struct ScorerNode<Sc: Score> {
    def: Arc<ScorerDef<Sc>>,
}

impl<Sc: Score> ScorerNode<Sc> {
    pub fn new(def: Arc<ScorerDef<Sc>>) -> Self {
        Self { def }
    }

    pub fn receive(
        &mut self,
        arena: &mut TupleArena,
        scores: &mut ScoreAccumulator<Sc>,
        tuple: TupleId,
        event: Event,
    ) {
        let slot = self.def.slot;
        if matches!(event, Event::Update | Event::Retract) {
            match arena.take_slot(tuple, slot) {
                StoreValue::Scored(id) => scores.remove(id),
                other => panic!("Impossible state: scorer slot holds {:?}", other),
            }
        }
        if matches!(event, Event::Insert | Event::Update) {
            let facts = arena.facts(tuple);
            let impact = self.def.impact(facts);
            let justification = scores
                .matches_enabled()
                .then(|| self.def.justify(facts));
            let id = scores.add(self.def.constraint, impact, justification);
            arena.set_slot(tuple, slot, StoreValue::Scored(id));
        }
    }
}
