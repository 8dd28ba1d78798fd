//! Type-erased facts.
//!
//! The network never knows the concrete types of the facts flowing through
//! it. Every fact is shared as an `Arc<dyn FactValue>` and downcast only at
//! the edges, inside the user functions.

use std::any::{Any, TypeId};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Any value that can be inserted as a fact or produced by a stream.
pub trait FactValue: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Debug + Send + Sync> FactValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A shared, immutable fact.
pub type Fact = Arc<dyn FactValue>;

/// Wraps a value into a [`Fact`].
pub fn fact<T: FactValue>(value: T) -> Fact {
    Arc::new(value)
}

/// Downcasts a fact, or `None` if it is not a `T`.
pub fn downcast<T: FactValue>(fact: &Fact) -> Option<&T> {
    // Deref first: `Arc<dyn FactValue>` is itself a `FactValue`.
    let value: &dyn FactValue = &**fact;
    value.as_any().downcast_ref::<T>()
}

// Used inside erased functions, whose argument types were checked when the
// network was built.
pub(crate) fn downcast_checked<T: FactValue>(fact: &Fact) -> &T {
    match downcast::<T>(fact) {
        Some(value) => value,
        None => panic!(
            "Impossible state: fact of type {} reached a function expecting {}",
            (**fact).type_name(),
            std::any::type_name::<T>()
        ),
    }
}

/// Identity of the type of a tuple column.
#[derive(Clone, Copy)]
pub struct FactType {
    id: TypeId,
    name: &'static str,
}

impl FactType {
    pub fn of<T: FactValue>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn of_fact(fact: &Fact) -> Self {
        let value: &dyn FactValue = &**fact;
        Self {
            id: value.as_any().type_id(),
            name: value.type_name(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name without its module path.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    match base.rfind("::") {
        Some(pos) => &name[pos + 2..],
        None => name,
    }
}

impl PartialEq for FactType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FactType {}

impl std::hash::Hash for FactType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for FactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Identifies a working fact inside one score director.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactHandle(pub(crate) u64);

impl FactHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
