//! Score analysis: constraint match totals, explanations and indictments.
//!
//! Matches reference the facts they involve through [`EntityRef`]s, so an
//! explanation can be inspected without knowing the fact types.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use streamforge_core::{ConstraintRef, Score};

use crate::fact::{downcast, fact, short_type_name, Fact, FactValue};

/// Reference to a fact involved in a constraint match.
#[derive(Clone)]
pub struct EntityRef {
    /// Type name of the fact.
    pub type_name: &'static str,
    /// `Debug` rendering of the fact, used for display and identity.
    pub display: String,
    entity: Fact,
}

impl EntityRef {
    pub fn new<T: FactValue + Clone>(entity: &T) -> Self {
        Self::from_fact(&fact(entity.clone()))
    }

    /// Creates an entity reference with a custom display string.
    pub fn with_display<T: FactValue + Clone>(entity: &T, display: String) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            display,
            entity: fact(entity.clone()),
        }
    }

    pub fn from_fact(fact: &Fact) -> Self {
        let value: &dyn FactValue = &**fact;
        Self {
            type_name: value.type_name(),
            display: format!("{:?}", value),
            entity: Arc::clone(fact),
        }
    }

    pub fn as_entity<T: FactValue>(&self) -> Option<&T> {
        downcast::<T>(&self.entity)
    }

    /// Returns the type name without its module path.
    pub fn short_type_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

impl Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("type", &self.short_type_name())
            .field("display", &self.display)
            .finish()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.display == other.display
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        self.display.hash(state);
    }
}

/// Why a constraint matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintJustification {
    pub entities: Vec<EntityRef>,
    pub description: String,
}

impl ConstraintJustification {
    /// Creates a justification, describing it by its entities.
    pub fn new(entities: Vec<EntityRef>) -> Self {
        let description = if entities.is_empty() {
            "No entities".to_string()
        } else {
            entities
                .iter()
                .map(|e| e.display.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        Self {
            entities,
            description,
        }
    }

    pub fn with_description(entities: Vec<EntityRef>, description: String) -> Self {
        Self {
            entities,
            description,
        }
    }
}

/// One live match with its justification.
#[derive(Debug, Clone)]
pub struct DetailedConstraintMatch<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    /// Score impact of this match.
    pub score: Sc,
    pub justification: ConstraintJustification,
}

impl<Sc: Score> DetailedConstraintMatch<Sc> {
    pub fn new(
        constraint_ref: ConstraintRef,
        score: Sc,
        justification: ConstraintJustification,
    ) -> Self {
        Self {
            constraint_ref,
            score,
            justification,
        }
    }
}

/// Impact and matches of one constraint.
///
/// `matches` is empty when constraint matches are disabled in the network
/// configuration; `match_count` is always exact.
#[derive(Debug, Clone)]
pub struct ConstraintMatchTotal<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub constraint_weight: Sc,
    pub score: Sc,
    pub match_count: usize,
    pub matches: Vec<DetailedConstraintMatch<Sc>>,
}

impl<Sc: Score> ConstraintMatchTotal<Sc> {
    pub fn name(&self) -> &str {
        &self.constraint_ref.name
    }
}

/// Per-constraint breakdown in a score explanation.
#[derive(Debug, Clone)]
pub struct ConstraintAnalysis<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    /// Constraint weight (score per match).
    pub weight: Sc,
    /// Total score from this constraint.
    pub score: Sc,
    pub matches: Vec<DetailedConstraintMatch<Sc>>,
    /// Whether the weight has a non-zero hard level.
    pub is_hard: bool,
}

impl<Sc: Score> ConstraintAnalysis<Sc> {
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn name(&self) -> &str {
        &self.constraint_ref.name
    }
}

impl<Sc: Score> From<ConstraintMatchTotal<Sc>> for ConstraintAnalysis<Sc> {
    fn from(total: ConstraintMatchTotal<Sc>) -> Self {
        let is_hard = total
            .constraint_weight
            .to_level_numbers()
            .first()
            .is_some_and(|&hard| hard != 0);
        Self {
            constraint_ref: total.constraint_ref,
            weight: total.constraint_weight,
            score: total.score,
            matches: total.matches,
            is_hard,
        }
    }
}

/// Complete score explanation with per-constraint breakdown.
#[derive(Debug, Clone)]
pub struct ScoreExplanation<Sc: Score> {
    pub score: Sc,
    pub constraint_analyses: Vec<ConstraintAnalysis<Sc>>,
}

impl<Sc: Score> ScoreExplanation<Sc> {
    pub fn new(score: Sc, constraint_analyses: Vec<ConstraintAnalysis<Sc>>) -> Self {
        Self {
            score,
            constraint_analyses,
        }
    }

    pub fn total_match_count(&self) -> usize {
        self.constraint_analyses.iter().map(|a| a.match_count()).sum()
    }

    /// Returns the constraints with a non-zero score.
    pub fn non_zero_constraints(&self) -> Vec<&ConstraintAnalysis<Sc>> {
        self.constraint_analyses
            .iter()
            .filter(|a| a.score != Sc::zero())
            .collect()
    }

    pub fn all_matches(&self) -> Vec<&DetailedConstraintMatch<Sc>> {
        self.constraint_analyses
            .iter()
            .flat_map(|a| &a.matches)
            .collect()
    }
}

/// How a single fact impacts the score.
#[derive(Debug, Clone)]
pub struct Indictment<Sc: Score> {
    pub entity: EntityRef,
    /// Sum of the impacts of the matches involving this fact.
    pub score: Sc,
    pub constraint_matches: HashMap<ConstraintRef, Vec<DetailedConstraintMatch<Sc>>>,
}

impl<Sc: Score> Indictment<Sc> {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            score: Sc::zero(),
            constraint_matches: HashMap::new(),
        }
    }

    pub fn add_match(&mut self, constraint_match: DetailedConstraintMatch<Sc>) {
        self.score = self.score.clone() + constraint_match.score.clone();
        self.constraint_matches
            .entry(constraint_match.constraint_ref.clone())
            .or_default()
            .push(constraint_match);
    }

    pub fn match_count(&self) -> usize {
        self.constraint_matches.values().map(|v| v.len()).sum::<usize>()
    }

    pub fn violated_constraints(&self) -> Vec<&ConstraintRef> {
        self.constraint_matches.keys().collect()
    }
}

/// Indictments keyed by fact.
#[derive(Debug, Clone)]
pub struct IndictmentMap<Sc: Score> {
    pub indictments: HashMap<EntityRef, Indictment<Sc>>,
}

impl<Sc: Score> IndictmentMap<Sc> {
    pub fn new() -> Self {
        Self {
            indictments: HashMap::new(),
        }
    }

    /// Builds the indictments of every entity of the given matches.
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a DetailedConstraintMatch<Sc>>) -> Self {
        let mut map = Self::new();
        for m in matches {
            for entity in &m.justification.entities {
                map.indictments
                    .entry(entity.clone())
                    .or_insert_with(|| Indictment::new(entity.clone()))
                    .add_match(m.clone());
            }
        }
        map
    }

    pub fn get(&self, entity: &EntityRef) -> Option<&Indictment<Sc>> {
        self.indictments.get(entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.indictments.keys()
    }

    /// Returns the entities sorted by score impact, worst first.
    pub fn worst_entities(&self) -> Vec<&EntityRef> {
        let mut entities: Vec<_> = self.indictments.keys().collect();
        entities.sort_by(|a, b| {
            self.indictments[*a]
                .score
                .cmp(&self.indictments[*b].score)
                .then_with(|| a.display.cmp(&b.display))
        });
        entities
    }

    pub fn len(&self) -> usize {
        self.indictments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indictments.is_empty()
    }
}

impl<Sc: Score> Default for IndictmentMap<Sc> {
    fn default() -> Self {
        Self::new()
    }
}
