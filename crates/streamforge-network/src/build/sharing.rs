//! Structural keys of shareable nodes.

use std::any::TypeId;

use smallvec::SmallVec;

use crate::node::{NodeId, NodeKind};

/// Two nodes with equal keys compute the same tuples and are built once.
///
/// Descriptors are the build-time identities of the user functions, joiners
/// and collectors of a node. Two closures are only considered equal when
/// one is a clone of the other, never because they look alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey {
    kind: NodeKind,
    parents: SmallVec<[NodeId; 2]>,
    descriptors: Vec<usize>,
    fact_type: Option<TypeId>,
}

impl NodeKey {
    pub fn source(fact_type: TypeId) -> Self {
        Self {
            kind: NodeKind::Source,
            parents: SmallVec::new(),
            descriptors: Vec::new(),
            fact_type: Some(fact_type),
        }
    }

    pub fn derived(kind: NodeKind, parents: &[NodeId], descriptors: Vec<usize>) -> Self {
        Self {
            kind,
            parents: parents.iter().copied().collect(),
            descriptors,
            fact_type: None,
        }
    }
}
