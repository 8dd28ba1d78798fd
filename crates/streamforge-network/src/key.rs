//! Type-erased index and group keys.
//!
//! Keys from different types never compare equal; ordered keys of different
//! types are ordered by type first, so a mixed index still has a total order.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::fact::{Fact, FactValue};

trait HashKey: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn HashKey) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn to_fact(&self) -> Fact;
}

impl<T> HashKey for T
where
    T: FactValue + Clone + Hash + Eq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn HashKey) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn to_fact(&self) -> Fact {
        Arc::new(self.clone())
    }
}

/// A hashable key of any type.
#[derive(Clone)]
pub struct Key(Arc<dyn HashKey>);

impl Key {
    pub fn new<T: FactValue + Clone + Hash + Eq>(value: T) -> Self {
        Key(Arc::new(value))
    }

    /// The key as a fact, used when a group key becomes a tuple column.
    pub fn to_fact(&self) -> Fact {
        self.0.to_fact()
    }

    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        let inner: &dyn HashKey = &*self.0;
        inner.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

trait OrderKey: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_cmp(&self, other: &dyn OrderKey) -> Ordering;
}

impl<T> OrderKey for T
where
    T: FactValue + Ord,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_cmp(&self, other: &dyn OrderKey) -> Ordering {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self.cmp(other),
            None => TypeId::of::<T>().cmp(&other.as_any().type_id()),
        }
    }
}

/// A totally ordered key of any type, used by range indexes.
#[derive(Clone)]
pub struct OrdKey(Arc<dyn OrderKey>);

impl OrdKey {
    pub fn new<T: FactValue + Ord>(value: T) -> Self {
        OrdKey(Arc::new(value))
    }
}

impl PartialEq for OrdKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrdKey {}

impl PartialOrd for OrdKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.dyn_cmp(&*other.0)
    }
}

impl Debug for OrdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

/// The composite key of a group: one [`Key`] per grouping function.
pub type GroupKey = SmallVec<[Key; 2]>;
