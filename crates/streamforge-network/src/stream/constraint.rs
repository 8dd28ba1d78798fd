//! Constraint definitions: a stream plus what its tuples do to the score.

use std::fmt;

use streamforge_core::{ConstraintRef, ImpactType, Score};

use super::StreamSpec;
use crate::analysis::ConstraintJustification;
use crate::function::{Function, TupleFn};

/// Finishes a constraint started with `penalize` or `reward`.
pub struct ConstraintBuilder<Sc: Score> {
    stream: StreamSpec,
    impact_type: ImpactType,
    weight: Sc,
    match_weigher: Option<Function<i64>>,
    justification: Option<Function<ConstraintJustification>>,
}

impl<Sc: Score> ConstraintBuilder<Sc> {
    pub(crate) fn new(stream: StreamSpec, impact_type: ImpactType, weight: Sc) -> Self {
        Self {
            stream,
            impact_type,
            weight,
            match_weigher: None,
            justification: None,
        }
    }

    /// Multiplies the weight of each match by `weigher(tuple)`.
    pub fn with_match_weight<Args, F>(mut self, weigher: F) -> Self
    where
        F: TupleFn<Args, i64>,
    {
        self.match_weigher = Some(weigher.into_function());
        self
    }

    /// Replaces the default justification, which lists the facts of the
    /// matching tuple.
    pub fn justify_with<Args, F>(mut self, justification: F) -> Self
    where
        F: TupleFn<Args, ConstraintJustification>,
    {
        self.justification = Some(justification.into_function());
        self
    }

    pub fn as_constraint(self, name: &str) -> ConstraintDef<Sc> {
        self.as_constraint_in("", name)
    }

    pub fn as_constraint_in(self, package: &str, name: &str) -> ConstraintDef<Sc> {
        ConstraintDef {
            constraint_ref: ConstraintRef::new(package, name),
            impact_type: self.impact_type,
            weight: self.weight,
            match_weigher: self.match_weigher,
            justification: self.justification,
            stream: self.stream,
        }
    }
}

/// A complete constraint, ready to be built into a network.
#[derive(Clone)]
pub struct ConstraintDef<Sc: Score> {
    pub(crate) constraint_ref: ConstraintRef,
    pub(crate) impact_type: ImpactType,
    pub(crate) weight: Sc,
    pub(crate) match_weigher: Option<Function<i64>>,
    pub(crate) justification: Option<Function<ConstraintJustification>>,
    pub(crate) stream: StreamSpec,
}

impl<Sc: Score> ConstraintDef<Sc> {
    pub fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    pub fn impact_type(&self) -> ImpactType {
        self.impact_type
    }

    pub fn weight(&self) -> &Sc {
        &self.weight
    }

    /// The same constraint with another weight. A zero weight disables the
    /// constraint: it is still reported, but builds no nodes.
    pub fn with_weight(mut self, weight: Sc) -> Self {
        self.weight = weight;
        self
    }

    pub fn stream(&self) -> &StreamSpec {
        &self.stream
    }
}

impl<Sc: Score> fmt::Debug for ConstraintDef<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintDef")
            .field("constraint_ref", &self.constraint_ref)
            .field("impact_type", &self.impact_type)
            .field("weight", &self.weight)
            .field("stream", &self.stream)
            .finish()
    }
}
