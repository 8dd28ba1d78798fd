//! Indexes of join and exists inputs.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use smallvec::SmallVec;

use super::Comparison;
use crate::key::{Key, OrdKey};
use crate::tuple::{ListEntry, TupleList};

/// Index key of one input tuple: the hashed equality part and the optional
/// ordered range part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey {
    pub(crate) equal: SmallVec<[Key; 2]>,
    pub(crate) range: Option<OrdKey>,
}

#[derive(Debug)]
enum Bucket<T> {
    Flat(TupleList<T>),
    Ordered(BTreeMap<OrdKey, TupleList<T>>),
}

impl<T> Bucket<T> {
    fn is_empty(&self) -> bool {
        match self {
            Bucket::Flat(list) => list.is_empty(),
            Bucket::Ordered(lists) => lists.is_empty(),
        }
    }
}

/// Values of one side of a join, bucketed by [`IndexKey`].
///
/// Empty lists and buckets are removed eagerly, so an index holding no value
/// holds no memory either.
#[derive(Debug)]
pub(crate) struct JoinIndex<T> {
    buckets: HashMap<SmallVec<[Key; 2]>, Bucket<T>>,
    len: usize,
}

impl<T> Default for JoinIndex<T> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            len: 0,
        }
    }
}

impl<T: Copy> JoinIndex<T> {
    pub fn put(&mut self, key: &IndexKey, value: T) -> ListEntry {
        self.len += 1;
        let bucket = self
            .buckets
            .entry(key.equal.clone())
            .or_insert_with(|| match key.range {
                Some(_) => Bucket::Ordered(BTreeMap::new()),
                None => Bucket::Flat(TupleList::new()),
            });
        match (bucket, &key.range) {
            (Bucket::Flat(list), None) => list.add(value),
            (Bucket::Ordered(lists), Some(range)) => {
                lists.entry(range.clone()).or_default().add(value)
            }
            _ => panic!("Impossible state: index key {:?} does not fit its bucket", key),
        }
    }

    pub fn remove(&mut self, key: &IndexKey, entry: ListEntry) -> T {
        let Some(bucket) = self.buckets.get_mut(&key.equal) else {
            panic!("Impossible state: no bucket for index key {:?}", key);
        };
        let value = match (&mut *bucket, &key.range) {
            (Bucket::Flat(list), None) => list.remove(entry),
            (Bucket::Ordered(lists), Some(range)) => {
                let Some(list) = lists.get_mut(range) else {
                    panic!("Impossible state: no list for index key {:?}", key);
                };
                let value = list.remove(entry);
                if list.is_empty() {
                    lists.remove(range);
                }
                value
            }
            _ => panic!("Impossible state: index key {:?} does not fit its bucket", key),
        };
        if bucket.is_empty() {
            self.buckets.remove(&key.equal);
        }
        self.len -= 1;
        value
    }

    /// Values whose key matches `lookup`, a key of the opposite side.
    ///
    /// `op` is the range comparison, always written as `left <op> right`;
    /// `lookup_is_left` tells which side `lookup` comes from.
    pub fn candidates(
        &self,
        lookup: &IndexKey,
        op: Option<Comparison>,
        lookup_is_left: bool,
    ) -> Vec<T> {
        let mut found = Vec::new();
        match (self.buckets.get(&lookup.equal), op, &lookup.range) {
            (None, _, _) => {}
            (Some(Bucket::Flat(list)), None, _) => found.extend(list.iter().copied()),
            (Some(Bucket::Ordered(lists)), Some(op), Some(range)) => {
                // Rewrite as `lookup <op> stored`.
                let op = if lookup_is_left { op } else { op.flip() };
                for list in lists.range(range_bounds(op, range)).map(|(_, list)| list) {
                    found.extend(list.iter().copied());
                }
            }
            _ => panic!("Impossible state: lookup {:?} does not fit its index", lookup),
        }
        found
    }

    /// Number of indexed values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

// Bounds of the stored keys `s` satisfying `lookup <op> s`.
fn range_bounds(op: Comparison, lookup: &OrdKey) -> (Bound<OrdKey>, Bound<OrdKey>) {
    let lookup = lookup.clone();
    match op {
        Comparison::LessThan => (Bound::Excluded(lookup), Bound::Unbounded),
        Comparison::LessThanOrEqual => (Bound::Included(lookup), Bound::Unbounded),
        Comparison::GreaterThan => (Bound::Unbounded, Bound::Excluded(lookup)),
        Comparison::GreaterThanOrEqual => (Bound::Unbounded, Bound::Included(lookup)),
    }
}
