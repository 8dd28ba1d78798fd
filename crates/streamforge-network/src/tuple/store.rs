//! Store slot values.
//!
//! One variant per kind of private per-tuple state a node keeps.

use std::any::Any;

use super::{ListEntry, TupleId, TupleList};
use crate::joiner::IndexKey;
use crate::key::GroupKey;

#[derive(Debug, Default)]
pub(crate) enum StoreValue {
    #[default]
    Empty,
    /// The tuple passed a filter.
    Passed,
    /// Output tuple of a map node.
    Child(TupleId),
    /// Output tuples of a flatten node, in item order.
    Children(Vec<TupleId>),
    /// A join input.
    Joined(Box<JoinSlot>),
    /// A join output: its parent and its entry in the parent's out list.
    Parent { parent: TupleId, entry: ListEntry },
    /// Existence counter of an exists-node left input.
    Counter(usize),
    /// An exists-node right input.
    ExistsRight(Box<ExistsRightSlot>),
    /// A group-node input.
    Member(Box<GroupMember>),
    /// A group output.
    GroupKey(GroupKey),
    /// Match of a scorer, by match id.
    Scored(usize),
}

#[derive(Debug)]
pub(crate) struct JoinSlot {
    pub key: IndexKey,
    pub entry: ListEntry,
    pub outs: TupleList<TupleId>,
}

#[derive(Debug)]
pub(crate) struct ExistsRightSlot {
    pub key: IndexKey,
    pub entry: ListEntry,
    pub trackers: TupleList<usize>,
}

pub(crate) struct GroupMember {
    pub key: GroupKey,
    pub undos: Vec<Box<dyn Any + Send>>,
}

impl std::fmt::Debug for GroupMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupMember")
            .field("key", &self.key)
            .field("undos", &self.undos.len())
            .finish()
    }
}
