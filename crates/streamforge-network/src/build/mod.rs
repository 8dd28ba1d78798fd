//! Build pass: turns constraint definitions into a [`NetworkBlueprint`].
//!
//! Streams are walked bottom-up. Every node request is looked up by its
//! structural [`NodeKey`] first, so a sub-pipeline reached from several
//! constraints is built once and fans out to all its consumers. Each
//! consumer still reserves its own store slots in the tuples it reads.
//!
//! Store slots are reserved per *origin*, the node creating a tuple. Filters
//! and existence checks forward the tuples of their left parent, so their
//! consumers reserve slots in the upstream origin.

mod sharing;


pub(crate) use sharing::NodeKey;

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use smallvec::{smallvec, SmallVec};
use streamforge_core::{ConstraintRef, Result, Score, StreamForgeError};
use tracing::debug;

use crate::fact::FactType;
use crate::function::Function;
use crate::joiner::{JoinPlan, JoinerChain};
use crate::network::{BlueprintNode, ConstraintInfo, NetworkBlueprint};
use crate::node::{
    ConcatDef, Edge, ExistsDef, FilterDef, FlattenDef, GroupDef, JoinDef, MapDef, NodeDef, NodeId, NodeKind,
    ScorerDef, Side,
};
use crate::stream::{ConstraintDef, StreamOp, StreamSpec};
use crate::tuple::MAX_ARITY;

/// Maximum number of group keys.
pub const MAX_GROUP_KEYS: usize = 2;

/// Maximum number of collectors of one group node.
pub const MAX_COLLECTORS: usize = 4;

/// Builds the blueprint of a network evaluating `constraints`.
///
/// Fails with [`StreamForgeError::Config`] when two constraints share a full
/// name, or when a stream is malformed: a function attached to columns it
/// does not accept, a join producing more than four columns, or a grouping
/// outside its limits.
pub(crate) fn build<Sc: Score>(constraints: &[ConstraintDef<Sc>]) -> Result<NetworkBlueprint<Sc>> {
    let mut names = HashSet::new();
    for constraint in constraints {
        let name = constraint.constraint_ref.full_name();
        if !names.insert(name.clone()) {
            return Err(StreamForgeError::Config(format!(
                "duplicate constraint [{}]",
                name
            )));
        }
    }

    let mut builder = Builder::new();
    let mut infos = Vec::with_capacity(constraints.len());
    for (index, constraint) in constraints.iter().enumerate() {
        infos.push(ConstraintInfo {
            constraint_ref: constraint.constraint_ref.clone(),
            weight: constraint.weight.clone(),
        });
        if constraint.weight.is_zero() {
            debug!(
                event = "constraint_disabled",
                constraint = %constraint.constraint_ref,
            );
            continue;
        }
        builder
            .scorer(index, constraint)
            .map_err(|err| in_constraint(&constraint.constraint_ref, err))?;
    }
    Ok(builder.finish(infos))
}

fn in_constraint(constraint: &ConstraintRef, err: StreamForgeError) -> StreamForgeError {
    match err {
        StreamForgeError::Config(message) => {
            StreamForgeError::Config(format!("constraint [{}]: {}", constraint, message))
        }
        other => other,
    }
}

fn check_args(what: &str, actual: &[FactType], columns: &[FactType]) -> Result<()> {
    if actual == columns {
        Ok(())
    } else {
        Err(StreamForgeError::Config(format!(
            "{} takes {:?} but the stream has columns {:?}",
            what, actual, columns
        )))
    }
}

fn joiner_descriptors(joiners: &JoinerChain) -> Vec<usize> {
    let mut descriptors = vec![joiners.len()];
    for joiner in joiners.joiners() {
        descriptors.extend(joiner.ids());
    }
    descriptors
}

struct Draft<Sc: Score> {
    def: NodeDef<Sc>,
    parents: SmallVec<[(NodeId, Side); 2]>,
    /// Creates its own tuples, rather than forwarding those of its first
    /// parent.
    creates_tuples: bool,
    /// Slots the node itself keeps in the tuples it creates.
    own_slots: usize,
}

struct Builder<Sc: Score> {
    drafts: Vec<Draft<Sc>>,
    layers: Vec<usize>,
    origins: Vec<NodeId>,
    store_sizes: Vec<usize>,
    memo: HashMap<NodeKey, NodeId>,
    sources: HashMap<TypeId, NodeId>,
    reused: usize,
}

impl<Sc: Score> Builder<Sc> {
    fn new() -> Self {
        Self {
            drafts: Vec::new(),
            layers: Vec::new(),
            origins: Vec::new(),
            store_sizes: Vec::new(),
            memo: HashMap::new(),
            sources: HashMap::new(),
            reused: 0,
        }
    }

    fn push(&mut self, draft: Draft<Sc>) -> NodeId {
        let id = NodeId(self.drafts.len());
        let parent_layer = draft.parents.iter().map(|(p, _)| self.layers[p.0]).max();
        let layer = match parent_layer {
            None => 0,
            Some(layer) if draft.def.kind().is_queueing() => layer + 1,
            Some(layer) => layer,
        };
        let origin = match draft.parents.first() {
            Some(&(parent, _)) if !draft.creates_tuples => self.origins[parent.0],
            _ => id,
        };
        self.layers.push(layer);
        self.origins.push(origin);
        self.store_sizes.push(draft.own_slots);
        self.drafts.push(draft);
        id
    }

    /// Returns the node of `key`, drafting it with `make` when it does not
    /// exist yet.
    fn intern(
        &mut self,
        key: NodeKey,
        make: impl FnOnce(&mut Self) -> Draft<Sc>,
    ) -> NodeId {
        if let Some(&id) = self.memo.get(&key) {
            self.reused += 1;
            return id;
        }
        let draft = make(self);
        let id = self.push(draft);
        self.memo.insert(key, id);
        id
    }

    /// Reserves a store slot in the tuples received from `parent`.
    fn reserve(&mut self, parent: NodeId) -> usize {
        let origin = self.origins[parent.0].0;
        let slot = self.store_sizes[origin];
        self.store_sizes[origin] += 1;
        slot
    }

    fn source(&mut self, fact_type: FactType) -> NodeId {
        let id = self.intern(NodeKey::source(fact_type.type_id()), |_| Draft {
            def: NodeDef::Source(fact_type),
            parents: SmallVec::new(),
            creates_tuples: true,
            own_slots: 0,
        });
        self.sources.insert(fact_type.type_id(), id);
        id
    }

    fn node(&mut self, stream: &StreamSpec) -> Result<NodeId> {
        let columns = stream.columns();
        match &stream.node.op {
            StreamOp::ForEach => Ok(self.source(columns[0])),
            StreamOp::Filter { parent, predicate } => {
                let p = self.node(parent)?;
                check_args("filter", predicate.arg_types(), parent.columns())?;
                let key = NodeKey::derived(NodeKind::Filter, &[p], vec![predicate.id()]);
                Ok(self.intern(key, |b| {
                    let slot = b.reserve(p);
                    Draft {
                        def: NodeDef::Filter(Arc::new(FilterDef {
                            predicate: predicate.clone(),
                            slot,
                        })),
                        parents: smallvec![(p, Side::Left)],
                        creates_tuples: false,
                        own_slots: 0,
                    }
                }))
            }
            StreamOp::Join {
                left,
                right,
                joiners,
            } => {
                if columns.len() > MAX_ARITY {
                    return Err(StreamForgeError::Config(format!(
                        "join produces {} columns, at most {} are supported",
                        columns.len(),
                        MAX_ARITY
                    )));
                }
                let l = self.node(left)?;
                let r = self.node(right)?;
                let plan = JoinPlan::compile(joiners, left.columns(), right.columns())?;
                let key = NodeKey::derived(NodeKind::Join, &[l, r], joiner_descriptors(joiners));
                Ok(self.intern(key, |b| {
                    let left_slot = b.reserve(l);
                    let right_slot = b.reserve(r);
                    Draft {
                        def: NodeDef::Join(Arc::new(JoinDef {
                            plan,
                            left_slot,
                            right_slot,
                        })),
                        parents: smallvec![(l, Side::Left), (r, Side::Right)],
                        creates_tuples: true,
                        own_slots: 2,
                    }
                }))
            }
            StreamOp::Exists {
                left,
                right,
                joiners,
                should_exist,
            } => {
                let l = self.node(left)?;
                let r = self.node(right)?;
                let plan = JoinPlan::compile(joiners, left.columns(), right.columns())?;
                let kind = if *should_exist {
                    NodeKind::IfExists
                } else {
                    NodeKind::IfNotExists
                };
                let key = NodeKey::derived(kind, &[l, r], joiner_descriptors(joiners));
                Ok(self.intern(key, |b| {
                    let left_slot = b.reserve(l);
                    let right_slot = b.reserve(r);
                    Draft {
                        def: NodeDef::Exists(Arc::new(ExistsDef {
                            plan,
                            should_exist: *should_exist,
                            left_slot,
                            right_slot,
                        })),
                        parents: smallvec![(l, Side::Left), (r, Side::Right)],
                        creates_tuples: false,
                        own_slots: 0,
                    }
                }))
            }
            StreamOp::Map { parent, mappings } => {
                if mappings.is_empty() || mappings.len() > MAX_ARITY {
                    return Err(StreamForgeError::Config(format!(
                        "map needs 1 to {} mappings, got {}",
                        MAX_ARITY,
                        mappings.len()
                    )));
                }
                let p = self.node(parent)?;
                for mapping in mappings {
                    check_args("mapping", mapping.arg_types(), parent.columns())?;
                }
                let descriptors = mappings.iter().map(Function::id).collect();
                let key = NodeKey::derived(NodeKind::Map, &[p], descriptors);
                Ok(self.intern(key, |b| {
                    let slot = b.reserve(p);
                    Draft {
                        def: NodeDef::Map(Arc::new(MapDef {
                            mappings: mappings.clone(),
                            slot,
                        })),
                        parents: smallvec![(p, Side::Left)],
                        creates_tuples: true,
                        own_slots: 0,
                    }
                }))
            }
            StreamOp::FlattenLast { parent, flatten } => {
                let p = self.node(parent)?;
                let last = &parent.columns()[parent.arity() - 1..];
                check_args("flatten", flatten.arg_types(), last)?;
                let key = NodeKey::derived(NodeKind::Flatten, &[p], vec![flatten.id()]);
                Ok(self.intern(key, |b| {
                    let slot = b.reserve(p);
                    Draft {
                        def: NodeDef::Flatten(Arc::new(FlattenDef {
                            flatten: flatten.clone(),
                            slot,
                        })),
                        parents: smallvec![(p, Side::Left)],
                        creates_tuples: true,
                        own_slots: 0,
                    }
                }))
            }
            StreamOp::GroupBy {
                parent,
                keys,
                collectors,
            } => {
                if keys.len() > MAX_GROUP_KEYS || collectors.len() > MAX_COLLECTORS {
                    return Err(StreamForgeError::Config(format!(
                        "group by {} keys and {} collectors, at most {} keys and {} collectors are supported",
                        keys.len(),
                        collectors.len(),
                        MAX_GROUP_KEYS,
                        MAX_COLLECTORS
                    )));
                }
                if columns.is_empty() || columns.len() > MAX_ARITY {
                    return Err(StreamForgeError::Config(format!(
                        "group produces {} columns, 1 to {} are supported",
                        columns.len(),
                        MAX_ARITY
                    )));
                }
                let p = self.node(parent)?;
                for key in keys {
                    check_args("group key", key.arg_types(), parent.columns())?;
                }
                for collector in collectors {
                    collector
                        .check_columns(parent.columns())
                        .map_err(StreamForgeError::Config)?;
                }
                let mut descriptors: Vec<usize> = keys.iter().map(Function::id).collect();
                descriptors.push(usize::MAX);
                descriptors.extend(collectors.iter().map(|c| c.id()));
                let key = NodeKey::derived(NodeKind::Group, &[p], descriptors);
                Ok(self.intern(key, |b| {
                    let slot = b.reserve(p);
                    Draft {
                        def: NodeDef::Group(Arc::new(GroupDef {
                            keys: keys.clone(),
                            collectors: collectors.clone(),
                            slot,
                        })),
                        parents: smallvec![(p, Side::Left)],
                        creates_tuples: true,
                        own_slots: 1,
                    }
                }))
            }
            StreamOp::Concat { left, right } => {
                check_args("concat", right.columns(), left.columns())?;
                let l = self.node(left)?;
                let r = self.node(right)?;
                let key = NodeKey::derived(NodeKind::Concat, &[l, r], Vec::new());
                Ok(self.intern(key, |b| {
                    let left_slot = b.reserve(l);
                    let right_slot = b.reserve(r);
                    Draft {
                        def: NodeDef::Concat(Arc::new(ConcatDef {
                            left_slot,
                            right_slot,
                        })),
                        parents: smallvec![(l, Side::Left), (r, Side::Right)],
                        creates_tuples: true,
                        own_slots: 0,
                    }
                }))
            }
        }
    }

    /// Scorers are never shared: each belongs to exactly one constraint.
    fn scorer(&mut self, index: usize, constraint: &ConstraintDef<Sc>) -> Result<NodeId> {
        let stream = &constraint.stream;
        let p = self.node(stream)?;
        if let Some(weigher) = &constraint.match_weigher {
            check_args("match weigher", weigher.arg_types(), stream.columns())?;
        }
        if let Some(justification) = &constraint.justification {
            check_args("justification", justification.arg_types(), stream.columns())?;
        }
        let slot = self.reserve(p);
        let unit_impact = constraint.weight.scale(constraint.impact_type.sign());
        Ok(self.push(Draft {
            def: NodeDef::Scorer(Arc::new(ScorerDef {
                constraint: index,
                unit_impact,
                match_weigher: constraint.match_weigher.clone(),
                justification: constraint.justification.clone(),
                slot,
            })),
            parents: smallvec![(p, Side::Left)],
            creates_tuples: false,
            own_slots: 0,
        }))
    }

    fn finish(self, constraints: Vec<ConstraintInfo<Sc>>) -> NetworkBlueprint<Sc> {
        let layer_count = self.layers.iter().max().map_or(0, |max| max + 1);
        let mut layers: Vec<Vec<NodeId>> = vec![Vec::new(); layer_count];
        let mut children: Vec<Vec<Edge>> = vec![Vec::new(); self.drafts.len()];
        for (index, draft) in self.drafts.iter().enumerate() {
            for &(parent, side) in &draft.parents {
                children[parent.0].push(Edge {
                    child: NodeId(index),
                    side,
                });
            }
            if draft.def.kind().is_queueing() {
                layers[self.layers[index]].push(NodeId(index));
            }
        }

        let nodes: Vec<BlueprintNode<Sc>> = self
            .drafts
            .into_iter()
            .zip(children)
            .enumerate()
            .map(|(index, (draft, children))| BlueprintNode {
                def: draft.def,
                children,
                store_size: self.store_sizes[index],
            })
            .collect();

        debug!(
            event = "network_built",
            nodes = nodes.len(),
            shared = self.reused,
            layers = layers.len(),
            constraints = constraints.len(),
        );

        NetworkBlueprint::new(nodes, layers, self.sources, constraints, self.reused)
    }
}
