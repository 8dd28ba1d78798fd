//! Built networks.
//!
//! A [`NetworkBlueprint`] is the immutable result of the build pass. It is
//! shared through an `Arc` and instantiated into any number of independent
//! [`NodeNetwork`]s, one per score director. A network is mutated by a
//! single thread; parallel evaluation uses one network per worker.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use streamforge_core::{ConstraintRef, Score};
use tracing::trace;

use crate::accumulator::ScoreAccumulator;
use crate::analysis::{ConstraintJustification, ConstraintMatchTotal, DetailedConstraintMatch};
use crate::fact::{Fact, FactHandle, FactType};
use crate::node::{Edge, Event, Node, NodeDef, NodeId, NodeKind, NodeStats};
use crate::tuple::{TupleArena, TupleId};

#[derive(Debug)]
pub(crate) struct BlueprintNode<Sc: Score> {
    pub def: NodeDef<Sc>,
    pub children: Vec<Edge>,
    /// Store slots of the tuples created by this node.
    pub store_size: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct ConstraintInfo<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub weight: Sc,
}

/// The node graph of a set of constraints, after node sharing.
pub struct NetworkBlueprint<Sc: Score> {
    nodes: Vec<BlueprintNode<Sc>>,
    /// Queueing nodes of each layer, flushed in this order.
    layers: Vec<Vec<NodeId>>,
    sources: HashMap<TypeId, NodeId>,
    constraints: Vec<ConstraintInfo<Sc>>,
    shared: usize,
}

impl<Sc: Score> NetworkBlueprint<Sc> {
    pub(crate) fn new(
        nodes: Vec<BlueprintNode<Sc>>,
        layers: Vec<Vec<NodeId>>,
        sources: HashMap<TypeId, NodeId>,
        constraints: Vec<ConstraintInfo<Sc>>,
        shared: usize,
    ) -> Self {
        Self {
            nodes,
            layers,
            sources,
            constraints,
            shared,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes of one kind.
    pub fn node_count_of(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.def.kind() == kind).count()
    }

    /// How many times the build reused an existing node instead of creating
    /// a structurally identical one.
    pub fn shared_node_count(&self) -> usize {
        self.shared
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraint_refs(&self) -> impl Iterator<Item = &ConstraintRef> {
        self.constraints.iter().map(|c| &c.constraint_ref)
    }

    /// Whether facts of type `T` reach any node.
    pub fn consumes<T: 'static>(&self) -> bool {
        self.sources.contains_key(&TypeId::of::<T>())
    }

    pub(crate) fn constraint(&self, index: usize) -> &ConstraintInfo<Sc> {
        &self.constraints[index]
    }
}

impl<Sc: Score> fmt::Debug for NetworkBlueprint<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkBlueprint")
            .field("nodes", &self.nodes.len())
            .field("layers", &self.layers.len())
            .field("constraints", &self.constraints.len())
            .field("shared", &self.shared)
            .finish()
    }
}

/// Memory held by one network.
///
/// After every fact has been retracted all counters are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    /// Tuples alive in the arena.
    pub live_tuples: usize,
    pub indexed_tuples: usize,
    pub index_buckets: usize,
    pub groups: usize,
    pub counters: usize,
    pub queued: usize,
    /// Matches held by scorers.
    pub matches: usize,
}

impl NetworkStats {
    pub fn is_empty(&self) -> bool {
        *self == NetworkStats::default()
    }
}

/// A running instance of a blueprint.
#[derive(Debug)]
pub(crate) struct NodeNetwork<Sc: Score> {
    blueprint: Arc<NetworkBlueprint<Sc>>,
    nodes: Vec<Node<Sc>>,
    arena: TupleArena,
    scores: ScoreAccumulator<Sc>,
}

impl<Sc: Score> NodeNetwork<Sc> {
    pub fn new(blueprint: Arc<NetworkBlueprint<Sc>>, matches_enabled: bool) -> Self {
        let nodes = blueprint
            .nodes
            .iter()
            .map(|node| node.def.instantiate(node.store_size))
            .collect();
        let scores = ScoreAccumulator::new(blueprint.constraints.len(), matches_enabled);
        Self {
            blueprint,
            nodes,
            arena: TupleArena::new(),
            scores,
        }
    }

    pub fn blueprint(&self) -> &Arc<NetworkBlueprint<Sc>> {
        &self.blueprint
    }

    /// Queues a new fact. Facts of a type no constraint reads are ignored.
    pub fn insert(&mut self, handle: FactHandle, fact: Fact) {
        let Some(id) = self.source_id(&fact) else {
            return;
        };
        if let Node::Source(source) = &mut self.nodes[id.0] {
            source.insert(&mut self.arena, handle, fact);
        }
    }

    pub fn update(&mut self, handle: FactHandle, fact: Fact) {
        let Some(id) = self.source_id(&fact) else {
            return;
        };
        if let Node::Source(source) = &mut self.nodes[id.0] {
            source.update(&mut self.arena, handle, fact);
        }
    }

    /// `fact` is the current value of the retracted fact; it routes the
    /// retraction to its source.
    pub fn retract(&mut self, handle: FactHandle, fact: &Fact) {
        let Some(id) = self.source_id(fact) else {
            return;
        };
        if let Node::Source(source) = &mut self.nodes[id.0] {
            source.retract(&mut self.arena, handle);
        }
    }

    fn source_id(&self, fact: &Fact) -> Option<NodeId> {
        self.blueprint
            .sources
            .get(&FactType::of_fact(fact).type_id())
            .copied()
    }

    /// Propagates every queued change, layer by layer, then frees the tuples
    /// that died.
    pub fn settle(&mut self) {
        let blueprint = Arc::clone(&self.blueprint);
        let mut delivered = 0usize;
        for layer in &blueprint.layers {
            for &node in layer {
                let events = self.nodes[node.0].flush(&mut self.arena);
                for (tuple, event) in events {
                    delivered += self.deliver(&blueprint, node, tuple, event);
                }
            }
        }
        let swept = self.arena.sweep();
        if delivered > 0 {
            trace!(event = "settle", delivered, swept);
        }
    }

    /// Delivers one event to the children of `from`, following filters
    /// inline. Returns how many deliveries were made.
    fn deliver(
        &mut self,
        blueprint: &NetworkBlueprint<Sc>,
        from: NodeId,
        tuple: TupleId,
        event: Event,
    ) -> usize {
        let mut delivered = 0;
        let mut pending: Vec<(NodeId, Event)> = vec![(from, event)];
        while let Some((node, event)) = pending.pop() {
            for edge in blueprint.nodes[node.0].children.iter() {
                delivered += 1;
                let forwarded = self.nodes[edge.child.0].receive(
                    &mut self.arena,
                    &mut self.scores,
                    edge.side,
                    tuple,
                    event,
                );
                if let Some(forwarded) = forwarded {
                    pending.push((edge.child, forwarded));
                }
            }
        }
        delivered
    }

    pub fn score(&self) -> Sc {
        self.scores.total().clone()
    }

    pub fn constraint_score(&self, index: usize) -> &Sc {
        self.scores.constraint_score(index)
    }

    /// Per-constraint totals, in constraint order. Matches are only listed
    /// when the network keeps them.
    pub fn constraint_match_totals(&self) -> Vec<ConstraintMatchTotal<Sc>> {
        (0..self.blueprint.constraints.len())
            .map(|index| {
                let info = self.blueprint.constraint(index);
                let matches = self
                    .scores
                    .matches(index)
                    .filter_map(|record| {
                        let justification: &ConstraintJustification =
                            record.justification.as_ref()?;
                        Some(DetailedConstraintMatch::new(
                            info.constraint_ref.clone(),
                            record.impact.clone(),
                            justification.clone(),
                        ))
                    })
                    .collect();
                ConstraintMatchTotal {
                    constraint_ref: info.constraint_ref.clone(),
                    constraint_weight: info.weight.clone(),
                    score: self.scores.constraint_score(index).clone(),
                    match_count: self.scores.match_count(index),
                    matches,
                }
            })
            .collect()
    }

    pub fn live_tuple_count(&self) -> usize {
        self.arena.len()
    }

    pub fn stats(&self) -> NetworkStats {
        let mut nodes = NodeStats::default();
        for node in &self.nodes {
            node.collect_stats(&mut nodes);
        }
        NetworkStats {
            live_tuples: self.arena.len(),
            indexed_tuples: nodes.indexed_tuples,
            index_buckets: nodes.index_buckets,
            groups: nodes.groups,
            counters: nodes.counters,
            queued: nodes.queued,
            matches: self.scores.len(),
        }
    }
}
