// Joiners for joins and existence checks.
//
// A joiner relates the columns of the left tuple to the columns of the right
// tuple. Joiners compose with `and` into a `JoinerChain`; when the network is
// built every equality joiner becomes part of a hash key, the first
// comparison joiner becomes an ordered range index, and the remaining
// joiners are evaluated left to right on each indexed candidate, stopping at
// the first mismatch.
//
// # Example
//
// ```
// use streamforge_network::joiner::{equal, less_than};
//
// #[derive(Debug)]
// struct Shift { employee: u32, start: i64 }
//
// let same_employee_later = equal(|s: &Shift| s.employee)
//     .and(less_than(|s: &Shift| s.start));
// assert_eq!(same_employee_later.len(), 2);
// ```

mod index;
mod plan;


pub(crate) use index::JoinIndex;
pub use index::IndexKey;
pub(crate) use plan::JoinPlan;

use std::hash::Hash;

use crate::fact::FactValue;
use crate::function::{Function, TupleFn};
use crate::key::{Key, OrdKey};

/// Ordering relation of a comparison joiner: `left <op> right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    pub fn test<T: Ord + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            Comparison::LessThan => left < right,
            Comparison::LessThanOrEqual => left <= right,
            Comparison::GreaterThan => left > right,
            Comparison::GreaterThanOrEqual => left >= right,
        }
    }

    /// The same relation with its operands swapped.
    pub fn flip(self) -> Self {
        match self {
            Comparison::LessThan => Comparison::GreaterThan,
            Comparison::LessThanOrEqual => Comparison::GreaterThanOrEqual,
            Comparison::GreaterThan => Comparison::LessThan,
            Comparison::GreaterThanOrEqual => Comparison::LessThanOrEqual,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum JoinerKind {
    Equal {
        left: Function<Key>,
        right: Function<Key>,
    },
    Compare {
        op: Comparison,
        left: Function<OrdKey>,
        right: Function<OrdKey>,
    },
    Filtering {
        predicate: Function<bool>,
    },
}

/// A single matching condition between left and right tuples.
#[derive(Clone, Debug)]
pub struct Joiner {
    pub(crate) kind: JoinerKind,
}

impl Joiner {
    /// Combines this joiner with another; both must match.
    pub fn and(self, other: impl Into<JoinerChain>) -> JoinerChain {
        JoinerChain::from(self).and(other)
    }

    /// Descriptor identities of the functions of this joiner.
    pub(crate) fn ids(&self) -> Vec<usize> {
        match &self.kind {
            JoinerKind::Equal { left, right } => vec![0, left.id(), right.id()],
            JoinerKind::Compare { op, left, right } => {
                vec![1 + *op as usize, left.id(), right.id()]
            }
            JoinerKind::Filtering { predicate } => vec![9, predicate.id()],
        }
    }
}

/// Joiners evaluated together, in order.
#[derive(Clone, Debug, Default)]
pub struct JoinerChain {
    joiners: Vec<Joiner>,
}

impl JoinerChain {
    /// A chain without conditions: the cartesian product.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn and(mut self, other: impl Into<JoinerChain>) -> Self {
        self.joiners.extend(other.into().joiners);
        self
    }

    pub fn len(&self) -> usize {
        self.joiners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joiners.is_empty()
    }

    pub fn joiners(&self) -> &[Joiner] {
        &self.joiners
    }
}

impl From<Joiner> for JoinerChain {
    fn from(joiner: Joiner) -> Self {
        Self {
            joiners: vec![joiner],
        }
    }
}

impl From<()> for JoinerChain {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

impl From<Vec<Joiner>> for JoinerChain {
    fn from(joiners: Vec<Joiner>) -> Self {
        Self { joiners }
    }
}

/// Matches when both sides map to equal keys, using one function for both.
pub fn equal<Args, K, F>(mapping: F) -> Joiner
where
    K: FactValue + Clone + Hash + Eq,
    F: TupleFn<Args, K>,
{
    let mapping = mapping.into_function().map(Key::new);
    Joiner {
        kind: JoinerKind::Equal {
            left: mapping.clone(),
            right: mapping,
        },
    }
}

/// Matches when `left(a) == right(b)`.
pub fn equal_bi<LArgs, RArgs, K, L, R>(left: L, right: R) -> Joiner
where
    K: FactValue + Clone + Hash + Eq,
    L: TupleFn<LArgs, K>,
    R: TupleFn<RArgs, K>,
{
    Joiner {
        kind: JoinerKind::Equal {
            left: left.into_function().map(Key::new),
            right: right.into_function().map(Key::new),
        },
    }
}

fn compare<LArgs, RArgs, K, L, R>(op: Comparison, left: L, right: R) -> Joiner
where
    K: FactValue + Ord,
    L: TupleFn<LArgs, K>,
    R: TupleFn<RArgs, K>,
{
    Joiner {
        kind: JoinerKind::Compare {
            op,
            left: left.into_function().map(OrdKey::new),
            right: right.into_function().map(OrdKey::new),
        },
    }
}

fn compare_same<Args, K, F>(op: Comparison, mapping: F) -> Joiner
where
    K: FactValue + Ord,
    F: TupleFn<Args, K>,
{
    let mapping = mapping.into_function().map(OrdKey::new);
    Joiner {
        kind: JoinerKind::Compare {
            op,
            left: mapping.clone(),
            right: mapping,
        },
    }
}

macro_rules! comparison_joiners {
    ($($same:ident, $bi:ident => $op:ident, $doc:literal;)+) => {
        $(
            #[doc = concat!("Matches when `mapping(a) ", $doc, " mapping(b)`.")]
            pub fn $same<Args, K, F>(mapping: F) -> Joiner
            where
                K: FactValue + Ord,
                F: TupleFn<Args, K>,
            {
                compare_same(Comparison::$op, mapping)
            }

            #[doc = concat!("Matches when `left(a) ", $doc, " right(b)`.")]
            pub fn $bi<LArgs, RArgs, K, L, R>(left: L, right: R) -> Joiner
            where
                K: FactValue + Ord,
                L: TupleFn<LArgs, K>,
                R: TupleFn<RArgs, K>,
            {
                compare(Comparison::$op, left, right)
            }
        )+
    };
}

comparison_joiners! {
    less_than, less_than_bi => LessThan, "<";
    less_than_or_equal, less_than_or_equal_bi => LessThanOrEqual, "<=";
    greater_than, greater_than_bi => GreaterThan, ">";
    greater_than_or_equal, greater_than_or_equal_bi => GreaterThanOrEqual, ">=";
}

/// Matches when the predicate over the left columns followed by the right
/// columns holds.
pub fn filtering<Args, F>(predicate: F) -> Joiner
where
    F: TupleFn<Args, bool>,
{
    Joiner {
        kind: JoinerKind::Filtering {
            predicate: predicate.into_function(),
        },
    }
}
