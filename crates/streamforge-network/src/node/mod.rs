//! Runtime nodes of the network.
//!
//! Every node speaks the same protocol: it receives `(side, tuple, event)`
//! from a parent and either forwards the same tuple right away (filters),
//! applies the event (scorers), or records the consequences in its dirty
//! queue, which the scheduler flushes layer by layer.

mod concat;
mod exists;
mod filter;
mod group;
mod join;
mod map;
mod queue;
mod scorer;
mod source;

pub(crate) use concat::{ConcatDef, ConcatNode};
pub(crate) use exists::{ExistsDef, ExistsNode};
pub(crate) use filter::{FilterDef, FilterNode};
pub(crate) use group::{GroupDef, GroupNode};
pub(crate) use join::{JoinDef, JoinNode};
pub(crate) use map::{FlattenDef, FlattenNode, MapDef, MapNode};
pub(crate) use queue::{DirtyQueue, Drained, StateStore};
pub(crate) use scorer::{ScorerDef, ScorerNode};
pub(crate) use source::SourceNode;

use std::fmt;
use std::sync::Arc;

use streamforge_core::Score;

use crate::accumulator::ScoreAccumulator;
use crate::fact::FactType;
use crate::tuple::{TupleArena, TupleId};

/// What happened to a tuple, as observed by a child node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Event {
    Insert,
    Update,
    Retract,
}

/// Input side of a node. Single-input nodes only have a left side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A parent-to-child connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge {
    pub child: NodeId,
    pub side: Side,
}

/// Kind of a node, as reported by a built network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Source,
    Filter,
    Map,
    Flatten,
    Concat,
    Join,
    IfExists,
    IfNotExists,
    Group,
    Scorer,
}

impl NodeKind {
    /// Nodes owning a dirty queue, flushed by the scheduler in layer order.
    /// Filters and scorers run inline in the layer of their parent.
    pub fn is_queueing(self) -> bool {
        !matches!(self, NodeKind::Filter | NodeKind::Scorer)
    }
}

/// Build-time description of a node, shared by every network instantiated
/// from the same blueprint.
#[derive(Debug)]
pub(crate) enum NodeDef<Sc: Score> {
    Source(FactType),
    Filter(Arc<FilterDef>),
    Map(Arc<MapDef>),
    Flatten(Arc<FlattenDef>),
    Concat(Arc<ConcatDef>),
    Join(Arc<JoinDef>),
    Exists(Arc<ExistsDef>),
    Group(Arc<GroupDef>),
    Scorer(Arc<ScorerDef<Sc>>),
}

impl<Sc: Score> NodeDef<Sc> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeDef::Source(_) => NodeKind::Source,
            NodeDef::Filter(_) => NodeKind::Filter,
            NodeDef::Map(_) => NodeKind::Map,
            NodeDef::Flatten(_) => NodeKind::Flatten,
            NodeDef::Concat(_) => NodeKind::Concat,
            NodeDef::Join(_) => NodeKind::Join,
            NodeDef::Exists(def) if def.should_exist => NodeKind::IfExists,
            NodeDef::Exists(_) => NodeKind::IfNotExists,
            NodeDef::Group(_) => NodeKind::Group,
            NodeDef::Scorer(_) => NodeKind::Scorer,
        }
    }

    /// `store_size` is the number of store slots of the tuples this node
    /// creates.
    pub fn instantiate(&self, store_size: usize) -> Node<Sc> {
        match self {
            NodeDef::Source(fact_type) => Node::Source(SourceNode::new(*fact_type, store_size)),
            NodeDef::Filter(def) => Node::Filter(FilterNode::new(Arc::clone(def))),
            NodeDef::Map(def) => Node::Map(MapNode::new(Arc::clone(def), store_size)),
            NodeDef::Flatten(def) => Node::Flatten(FlattenNode::new(Arc::clone(def), store_size)),
            NodeDef::Concat(def) => Node::Concat(ConcatNode::new(Arc::clone(def), store_size)),
            NodeDef::Join(def) => Node::Join(JoinNode::new(Arc::clone(def), store_size)),
            NodeDef::Exists(def) => Node::Exists(ExistsNode::new(Arc::clone(def))),
            NodeDef::Group(def) => Node::Group(GroupNode::new(Arc::clone(def), store_size)),
            NodeDef::Scorer(def) => Node::Scorer(ScorerNode::new(Arc::clone(def))),
        }
    }
}

/// Memory held by the nodes of one network, for leak checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Tuples held in join and exists indexes.
    pub indexed_tuples: usize,
    /// Non-empty hash buckets of join and exists indexes.
    pub index_buckets: usize,
    /// Live groups of group nodes.
    pub groups: usize,
    /// Existence counters of exists nodes.
    pub counters: usize,
    /// Tuples waiting in dirty queues.
    pub queued: usize,
}

#[derive(Debug)]
pub(crate) enum Node<Sc: Score> {
    Source(SourceNode),
    Filter(FilterNode),
    Map(MapNode),
    Flatten(FlattenNode),
    Concat(ConcatNode),
    Join(JoinNode),
    Exists(ExistsNode),
    Group(GroupNode),
    Scorer(ScorerNode<Sc>),
}

impl<Sc: Score> Node<Sc> {
    /// Delivers one event from a parent. Returns the event to forward to the
    /// children of this node right away, for nodes that do not queue.
    pub fn receive(
        &mut self,
        arena: &mut TupleArena,
        scores: &mut ScoreAccumulator<Sc>,
        side: Side,
        tuple: TupleId,
        event: Event,
    ) -> Option<Event> {
        match self {
            Node::Filter(node) => node.receive(arena, tuple, event),
            Node::Scorer(node) => {
                node.receive(arena, scores, tuple, event);
                None
            }
            Node::Map(node) => {
                node.receive(arena, tuple, event);
                None
            }
            Node::Flatten(node) => {
                node.receive(arena, tuple, event);
                None
            }
            Node::Concat(node) => {
                node.receive(arena, side, tuple, event);
                None
            }
            Node::Join(node) => {
                node.receive(arena, side, tuple, event);
                None
            }
            Node::Exists(node) => {
                node.receive(arena, side, tuple, event);
                None
            }
            Node::Group(node) => {
                node.receive(arena, tuple, event);
                None
            }
            Node::Source(_) => panic!("Impossible state: a source node has no parent"),
        }
    }

    /// Settles the dirty queue. Returns the events for the children, in
    /// propagation order.
    pub fn flush(&mut self, arena: &mut TupleArena) -> Vec<(TupleId, Event)> {
        let drained = match self {
            Node::Source(node) => node.queue.drain(arena),
            Node::Map(node) => node.queue.drain(arena),
            Node::Flatten(node) => node.queue.drain(arena),
            Node::Concat(node) => node.queue.drain(arena),
            Node::Join(node) => node.queue.drain(arena),
            Node::Group(node) => node.flush(arena),
            Node::Exists(node) => return node.flush(),
            Node::Filter(_) | Node::Scorer(_) => return Vec::new(),
        };
        for &dead in &drained.dead {
            arena.bury(dead);
        }
        drained.events
    }

    pub fn collect_stats(&self, stats: &mut NodeStats) {
        match self {
            Node::Source(node) => stats.queued += node.queue.len(),
            Node::Map(node) => stats.queued += node.queue.len(),
            Node::Flatten(node) => stats.queued += node.queue.len(),
            Node::Concat(node) => stats.queued += node.queue.len(),
            Node::Join(node) => node.collect_stats(stats),
            Node::Exists(node) => node.collect_stats(stats),
            Node::Group(node) => node.collect_stats(stats),
            Node::Filter(_) | Node::Scorer(_) => {}
        }
    }
}
