//! Graph description: streams and constraint definitions.
//!
//! A [`StreamSpec`] is an immutable pipeline tree built with a fluent API
//! from a [`ConstraintFactory`]. Nothing is checked while describing:
//! column types, arities and joiner shapes are validated when the network is
//! built, and reported as configuration errors.
//!
//! # Example
//!
//! ```
//! use streamforge_network::joiner::equal;
//! use streamforge_network::stream::ConstraintFactory;
//! use streamforge_core::SimpleScore;
//!
//! #[derive(Debug, Clone)]
//! struct Queen { id: u32, row: u32 }
//!
//! impl streamforge_core::PlanningId for Queen {
//!     type Id = u32;
//!     fn planning_id(&self) -> u32 { self.id }
//! }
//!
//! let factory = ConstraintFactory::new();
//! let row_conflict = factory
//!     .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.row))
//!     .penalize(SimpleScore::of(1))
//!     .as_constraint("Row conflict");
//! assert_eq!(row_conflict.constraint_ref().name, "Row conflict");
//! ```

mod constraint;
mod factory;
mod grouping;


pub use constraint::{ConstraintBuilder, ConstraintDef};
pub use factory::ConstraintFactory;
pub use grouping::Grouping;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use streamforge_core::{ImpactType, Score};

use crate::collector::CollectorDef;
use crate::fact::{fact, Fact, FactType, FactValue};
use crate::function::{Function, TupleFn};
use crate::joiner::JoinerChain;
use crate::key::Key;

#[derive(Debug)]
pub(crate) enum StreamOp {
    ForEach,
    Filter {
        parent: StreamSpec,
        predicate: Function<bool>,
    },
    Join {
        left: StreamSpec,
        right: StreamSpec,
        joiners: JoinerChain,
    },
    Exists {
        left: StreamSpec,
        right: StreamSpec,
        joiners: JoinerChain,
        should_exist: bool,
    },
    Map {
        parent: StreamSpec,
        mappings: Vec<Function<Fact>>,
    },
    FlattenLast {
        parent: StreamSpec,
        flatten: Function<Vec<Fact>>,
    },
    GroupBy {
        parent: StreamSpec,
        keys: Vec<Function<Key>>,
        collectors: Vec<CollectorDef>,
    },
    Concat {
        left: StreamSpec,
        right: StreamSpec,
    },
}

#[derive(Debug)]
pub(crate) struct StreamNode {
    pub op: StreamOp,
    /// Fact types of the tuple columns of this stream.
    pub columns: Vec<FactType>,
}

/// A stream of tuples, described but not yet built.
///
/// Cloning is cheap and keeps the identity of the stream: the same
/// `StreamSpec` used in several constraints always builds into shared
/// nodes.
#[derive(Clone)]
pub struct StreamSpec {
    pub(crate) node: Arc<StreamNode>,
}

impl StreamSpec {
    fn new(op: StreamOp, columns: Vec<FactType>) -> Self {
        Self {
            node: Arc::new(StreamNode { op, columns }),
        }
    }

    pub(crate) fn for_each(fact_type: FactType) -> Self {
        Self::new(StreamOp::ForEach, vec![fact_type])
    }

    /// Fact types of the tuple columns.
    pub fn columns(&self) -> &[FactType] {
        &self.node.columns
    }

    pub fn arity(&self) -> usize {
        self.node.columns.len()
    }

    /// Keeps the tuples matching `predicate`.
    pub fn filter<Args, P>(self, predicate: P) -> StreamSpec
    where
        P: TupleFn<Args, bool>,
    {
        let columns = self.node.columns.clone();
        Self::new(
            StreamOp::Filter {
                parent: self,
                predicate: predicate.into_function(),
            },
            columns,
        )
    }

    /// Joins with `other`; output tuples carry the columns of `self`
    /// followed by the columns of `other`.
    pub fn join(self, other: StreamSpec, joiners: impl Into<JoinerChain>) -> StreamSpec {
        let columns = self
            .node
            .columns
            .iter()
            .chain(&other.node.columns)
            .copied()
            .collect();
        Self::new(
            StreamOp::Join {
                left: self,
                right: other,
                joiners: joiners.into(),
            },
            columns,
        )
    }

    /// Keeps the tuples for which at least one tuple of `other` matches.
    pub fn if_exists(self, other: StreamSpec, joiners: impl Into<JoinerChain>) -> StreamSpec {
        self.exists(other, joiners.into(), true)
    }

    /// Keeps the tuples for which no tuple of `other` matches.
    pub fn if_not_exists(self, other: StreamSpec, joiners: impl Into<JoinerChain>) -> StreamSpec {
        self.exists(other, joiners.into(), false)
    }

    fn exists(self, other: StreamSpec, joiners: JoinerChain, should_exist: bool) -> StreamSpec {
        let columns = self.node.columns.clone();
        Self::new(
            StreamOp::Exists {
                left: self,
                right: other,
                joiners,
                should_exist,
            },
            columns,
        )
    }

    fn mapped(self, mappings: Vec<(Function<Fact>, FactType)>) -> StreamSpec {
        let (mappings, columns): (Vec<_>, Vec<_>) = mappings.into_iter().unzip();
        Self::new(
            StreamOp::Map {
                parent: self,
                mappings,
            },
            columns,
        )
    }

    /// Replaces each tuple by a single-column tuple.
    pub fn map<Args, A, F>(self, mapping: F) -> StreamSpec
    where
        A: FactValue,
        F: TupleFn<Args, A>,
    {
        self.mapped(vec![column(mapping)])
    }

    pub fn map2<Args, A, B, FA, FB>(self, a: FA, b: FB) -> StreamSpec
    where
        A: FactValue,
        B: FactValue,
        FA: TupleFn<Args, A>,
        FB: TupleFn<Args, B>,
    {
        self.mapped(vec![column(a), column(b)])
    }

    pub fn map3<Args, A, B, C, FA, FB, FC>(self, a: FA, b: FB, c: FC) -> StreamSpec
    where
        A: FactValue,
        B: FactValue,
        C: FactValue,
        FA: TupleFn<Args, A>,
        FB: TupleFn<Args, B>,
        FC: TupleFn<Args, C>,
    {
        self.mapped(vec![column(a), column(b), column(c)])
    }

    #[allow(clippy::too_many_arguments)]
    pub fn map4<Args, A, B, C, D, FA, FB, FC, FD>(self, a: FA, b: FB, c: FC, d: FD) -> StreamSpec
    where
        A: FactValue,
        B: FactValue,
        C: FactValue,
        D: FactValue,
        FA: TupleFn<Args, A>,
        FB: TupleFn<Args, B>,
        FC: TupleFn<Args, C>,
        FD: TupleFn<Args, D>,
    {
        self.mapped(vec![column(a), column(b), column(c), column(d)])
    }

    /// Replaces the last column by each of the items it expands to. A tuple
    /// whose last column expands to nothing disappears.
    pub fn flatten_last<A, I, It, F>(self, flatten: F) -> StreamSpec
    where
        A: FactValue,
        I: FactValue,
        It: IntoIterator<Item = I>,
        F: Fn(&A) -> It + Send + Sync + 'static,
    {
        let mut columns = self.node.columns.clone();
        columns.pop();
        columns.push(FactType::of::<I>());
        let flatten = TupleFn::<(A,), Vec<Fact>>::into_function(move |last: &A| {
            flatten(last).into_iter().map(fact).collect::<Vec<_>>()
        });
        Self::new(
            StreamOp::FlattenLast {
                parent: self,
                flatten,
            },
            columns,
        )
    }

    /// Keeps every column and appends one computed from the whole tuple.
    pub fn expand<Args, B, F>(self, mapping: F) -> StreamSpec
    where
        B: FactValue,
        F: TupleFn<Args, B>,
    {
        let mut mappings = self.identity_columns();
        mappings.push(column(mapping));
        self.mapped(mappings)
    }

    pub fn expand2<Args, B, C, FB, FC>(self, b: FB, c: FC) -> StreamSpec
    where
        B: FactValue,
        C: FactValue,
        FB: TupleFn<Args, B>,
        FC: TupleFn<Args, C>,
    {
        let mut mappings = self.identity_columns();
        mappings.push(column(b));
        mappings.push(column(c));
        self.mapped(mappings)
    }

    fn identity_columns(&self) -> Vec<(Function<Fact>, FactType)> {
        let columns = &self.node.columns;
        (0..columns.len())
            .map(|index| {
                let copy = Function::new(columns.clone(), move |facts: &[Fact]| {
                    Arc::clone(&facts[index])
                });
                (copy, columns[index])
            })
            .collect()
    }

    /// Tuples of both streams, which must have the same columns. A tuple
    /// present in both is seen twice.
    pub fn concat(self, other: StreamSpec) -> StreamSpec {
        let columns = self.node.columns.clone();
        Self::new(
            StreamOp::Concat {
                left: self,
                right: other,
            },
            columns,
        )
    }

    /// Removes duplicate values from a single-column stream of `T`.
    ///
    /// A stream that cannot hold duplicates is returned as is: the facts of
    /// `for_each` are distinct even when their values are equal, and so are
    /// the joins, filters and groups over them.
    pub fn distinct<T>(self) -> StreamSpec
    where
        T: FactValue + Clone + Hash + Eq,
    {
        if self.guarantees_distinct() {
            self
        } else {
            self.group_by_key(|value: &T| value.clone())
        }
    }

    /// Removes duplicate pairs from a two-column stream of `A` and `B`.
    pub fn distinct2<A, B>(self) -> StreamSpec
    where
        A: FactValue + Clone + Hash + Eq,
        B: FactValue + Clone + Hash + Eq,
    {
        if self.guarantees_distinct() {
            self
        } else {
            self.group(
                Grouping::by(|a: &A, _: &B| a.clone()).and_by(|_: &A, b: &B| b.clone()),
            )
        }
    }

    fn guarantees_distinct(&self) -> bool {
        match &self.node.op {
            StreamOp::ForEach | StreamOp::GroupBy { .. } => true,
            StreamOp::Filter { parent, .. } => parent.guarantees_distinct(),
            StreamOp::Exists { left, .. } => left.guarantees_distinct(),
            StreamOp::Join { left, right, .. } => {
                left.guarantees_distinct() && right.guarantees_distinct()
            }
            StreamOp::Map { .. } | StreamOp::FlattenLast { .. } | StreamOp::Concat { .. } => false,
        }
    }

    /// Groups by one key, collecting each group.
    pub fn group_by<Args, K, F, C>(self, key: F, collector: C) -> StreamSpec
    where
        K: FactValue + Clone + Hash + Eq,
        F: TupleFn<Args, K>,
        C: Into<CollectorDef>,
    {
        self.group(Grouping::by(key).collect(collector))
    }

    /// Distinct keys, without collectors.
    pub fn group_by_key<Args, K, F>(self, key: F) -> StreamSpec
    where
        K: FactValue + Clone + Hash + Eq,
        F: TupleFn<Args, K>,
    {
        self.group(Grouping::by(key))
    }

    /// Collects the whole stream into a single group.
    pub fn group_by_all<C: Into<CollectorDef>>(self, collector: C) -> StreamSpec {
        self.group(Grouping::all().collect(collector))
    }

    /// Groups with any combination of keys and collectors. Output tuples
    /// carry the keys followed by the collector results.
    pub fn group(self, grouping: Grouping) -> StreamSpec {
        let (keys, collectors, columns) = grouping.into_parts();
        Self::new(
            StreamOp::GroupBy {
                parent: self,
                keys,
                collectors,
            },
            columns,
        )
    }

    /// Penalizes every tuple with `weight`.
    pub fn penalize<Sc: Score>(self, weight: Sc) -> ConstraintBuilder<Sc> {
        ConstraintBuilder::new(self, ImpactType::Penalty, weight)
    }

    /// Rewards every tuple with `weight`.
    pub fn reward<Sc: Score>(self, weight: Sc) -> ConstraintBuilder<Sc> {
        ConstraintBuilder::new(self, ImpactType::Reward, weight)
    }
}

fn column<Args, T: FactValue>(mapping: impl TupleFn<Args, T>) -> (Function<Fact>, FactType) {
    (mapping.into_function().map(fact), FactType::of::<T>())
}

impl fmt::Debug for StreamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.node.op {
            StreamOp::ForEach => "ForEach",
            StreamOp::Filter { .. } => "Filter",
            StreamOp::Join { .. } => "Join",
            StreamOp::Exists {
                should_exist: true, ..
            } => "IfExists",
            StreamOp::Exists { .. } => "IfNotExists",
            StreamOp::Map { .. } => "Map",
            StreamOp::FlattenLast { .. } => "FlattenLast",
            StreamOp::GroupBy { .. } => "GroupBy",
            StreamOp::Concat { .. } => "Concat",
        };
        write!(f, "{}{:?}", name, self.node.columns)
    }
}
