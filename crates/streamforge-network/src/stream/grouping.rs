use std::hash::Hash;

use crate::collector::CollectorDef;
use crate::fact::{FactType, FactValue};
use crate::function::{Function, TupleFn};
use crate::key::Key;

/// Keys and collectors of a group-by.
///
/// # Example
///
/// ```
/// use streamforge_network::collector::{count, sum};
/// use streamforge_network::stream::Grouping;
///
/// #[derive(Debug)]
/// struct Shift { employee: u32, day: u32, hours: i64 }
///
/// // (employee, day, shift count, total hours)
/// let per_day = Grouping::by(|s: &Shift| s.employee)
///     .and_by(|s: &Shift| s.day)
///     .collect(count())
///     .collect(sum(|s: &Shift| s.hours));
/// assert_eq!(per_day.arity(), 4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Grouping {
    keys: Vec<(Function<Key>, FactType)>,
    collectors: Vec<CollectorDef>,
}

impl Grouping {
    /// A single group holding every tuple.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by<Args, K, F>(key: F) -> Self
    where
        K: FactValue + Clone + Hash + Eq,
        F: TupleFn<Args, K>,
    {
        Self::all().and_by(key)
    }

    pub fn and_by<Args, K, F>(mut self, key: F) -> Self
    where
        K: FactValue + Clone + Hash + Eq,
        F: TupleFn<Args, K>,
    {
        self.keys
            .push((key.into_function().map(Key::new), FactType::of::<K>()));
        self
    }

    pub fn collect<C: Into<CollectorDef>>(mut self, collector: C) -> Self {
        self.collectors.push(collector.into());
        self
    }

    /// Number of columns of the grouped tuples.
    pub fn arity(&self) -> usize {
        self.keys.len() + self.collectors.len()
    }

    pub(crate) fn into_parts(self) -> (Vec<Function<Key>>, Vec<CollectorDef>, Vec<FactType>) {
        let columns = self
            .keys
            .iter()
            .map(|(_, fact_type)| *fact_type)
            .chain(self.collectors.iter().map(CollectorDef::result_type))
            .collect();
        let keys = self.keys.into_iter().map(|(key, _)| key).collect();
        (keys, self.collectors, columns)
    }
}
