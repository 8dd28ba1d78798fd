// Runtime constraint weight configuration.
//
// Allows adjusting constraint weights without touching the constraint
// definitions: the overrides are applied once, before the network is built.

use std::collections::HashMap;
use std::fmt::Debug;

use streamforge_config::NetworkConfig;
use streamforge_core::{ParseableScore, Result, Score, StreamForgeError};

use crate::stream::ConstraintDef;

// Weights keyed by constraint full name ("package/name", or the bare name
// for constraints without a package).
#[derive(Clone)]
pub struct ConstraintWeightOverrides<Sc: Score> {
    weights: HashMap<String, Sc>,
}

impl<Sc: Score> Debug for ConstraintWeightOverrides<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintWeightOverrides")
            .field("count", &self.weights.len())
            .finish()
    }
}

impl<Sc: Score> Default for ConstraintWeightOverrides<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> ConstraintWeightOverrides<Sc> {
    pub fn new() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    // Creates overrides from an iterator of (name, weight) pairs.
    pub fn from_pairs<I, N>(iter: I) -> Self
    where
        I: IntoIterator<Item = (N, Sc)>,
        N: Into<String>,
    {
        let weights = iter.into_iter().map(|(n, w)| (n.into(), w)).collect();
        Self { weights }
    }

    pub fn put<N: Into<String>>(&mut self, name: N, weight: Sc) {
        self.weights.insert(name.into(), weight);
    }

    pub fn remove(&mut self, name: &str) -> Option<Sc> {
        self.weights.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Sc> {
        self.weights.get(name)
    }

    pub fn get_or_default(&self, name: &str, default: Sc) -> Sc {
        self.weights.get(name).cloned().unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.weights.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    // Replaces the weight of every overridden constraint. Naming a constraint
    // that is not in `constraints` is a configuration error, so that a typo
    // in a config file does not go unnoticed.
    pub fn apply(&self, constraints: Vec<ConstraintDef<Sc>>) -> Result<Vec<ConstraintDef<Sc>>> {
        let mut unknown: Vec<&String> = self
            .weights
            .keys()
            .filter(|name| {
                !constraints
                    .iter()
                    .any(|c| &c.constraint_ref().full_name() == *name)
            })
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(StreamForgeError::Config(format!(
                "weight overrides for unknown constraints {:?}",
                unknown
            )));
        }
        Ok(constraints
            .into_iter()
            .map(|c| match self.get(&c.constraint_ref().full_name()) {
                Some(weight) => c.with_weight(weight.clone()),
                None => c,
            })
            .collect())
    }
}

impl<Sc: ParseableScore> ConstraintWeightOverrides<Sc> {
    // Reads the `constraint_weights` table of a network configuration.
    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        let weights = config
            .parsed_weights::<Sc>()
            .map_err(|err| StreamForgeError::Config(err.to_string()))?;
        Ok(Self::from_pairs(weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ConstraintFactory;
    use streamforge_core::HardSoftScore;

    #[derive(Debug)]
    struct Shift;

    fn constraints() -> Vec<ConstraintDef<HardSoftScore>> {
        let factory = ConstraintFactory::new();
        vec![
            factory
                .for_each::<Shift>()
                .penalize(HardSoftScore::of_hard(1))
                .as_constraint("Overlap"),
            factory
                .for_each::<Shift>()
                .penalize(HardSoftScore::of_soft(1))
                .as_constraint_in("fairness", "Balance"),
        ]
    }

    #[test]
    fn test_apply_by_full_name() {
        let overrides =
            ConstraintWeightOverrides::from_pairs([("fairness/Balance", HardSoftScore::of_soft(5))]);
        let applied = overrides.apply(constraints()).unwrap();
        assert_eq!(*applied[0].weight(), HardSoftScore::of_hard(1));
        assert_eq!(*applied[1].weight(), HardSoftScore::of_soft(5));
    }

    #[test]
    fn test_unknown_constraint_is_rejected() {
        let mut overrides = ConstraintWeightOverrides::new();
        overrides.put("Balance", HardSoftScore::of_soft(5));
        let err = overrides.apply(constraints()).unwrap_err();
        assert!(err.to_string().contains("Balance"));
    }

    #[test]
    fn test_from_config() {
        let config = NetworkConfig::new().with_constraint_weight("Overlap", "0hard/-2soft");
        let overrides = ConstraintWeightOverrides::<HardSoftScore>::from_config(&config).unwrap();
        assert_eq!(overrides.get("Overlap"), Some(&HardSoftScore::of_soft(-2)));
        assert_eq!(
            overrides.get_or_default("Balance", HardSoftScore::zero()),
            HardSoftScore::zero()
        );
    }
}
