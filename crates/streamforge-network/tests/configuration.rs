//! Building directors from configuration files and rejecting broken
//! constraint sets before any fact is inserted.

use streamforge_config::{EnvironmentMode, NetworkConfig};
use streamforge_core::{HardSoftScore, Score, StreamForgeError};
use streamforge_network::collector::sum;
use streamforge_network::joiner::{equal, equal_bi};
use streamforge_network::{
    ConstraintDef, ConstraintFactory, ConstraintWeightOverrides, ScoreDirectorFactory,
};
use streamforge_test::{Employee, Queen, Shift};

fn constraints() -> Vec<ConstraintDef<HardSoftScore>> {
    let factory = ConstraintFactory::new();
    vec![
        factory
            .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.row))
            .penalize(HardSoftScore::of_hard(1))
            .as_constraint_in("queens", "Row conflict"),
        factory
            .for_each::<Queen>()
            .filter(|q: &Queen| q.row.is_none())
            .penalize(HardSoftScore::of_soft(1))
            .as_constraint_in("queens", "Unassigned queen"),
    ]
}

fn config_message<T: std::fmt::Debug>(result: Result<T, StreamForgeError>) -> String {
    match result {
        Err(StreamForgeError::Config(message)) => message,
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn test_weights_from_toml() {
    let config = NetworkConfig::from_toml_str(
        r#"
        environment_mode = "fast_assert"

        [constraint_weights]
        "queens/Row conflict" = "0hard/3soft"
        "#,
    )
    .unwrap();
    let factory = ScoreDirectorFactory::new(constraints(), &config).unwrap();
    assert_eq!(factory.environment_mode(), EnvironmentMode::FastAssert);

    let mut director = factory.build_director();
    director.insert_fact(Queen::assigned(0, 0, 1));
    director.insert_fact(Queen::assigned(1, 1, 1));
    director.insert_fact(Queen::unassigned(2, 2));
    assert_eq!(director.calculate_score(), HardSoftScore::of(0, -4));
}

#[test]
fn test_weights_from_yaml() {
    let config = NetworkConfig::from_yaml_str(
        r#"
constraint_match_enabled: false
constraint_weights:
  "queens/Unassigned queen": "0hard/0soft"
"#,
    )
    .unwrap();
    let factory = ScoreDirectorFactory::new(constraints(), &config).unwrap();
    // A zero weight disables the constraint: it builds no nodes at all.
    assert_eq!(factory.blueprint().constraint_count(), 2);

    let mut director = factory.build_director();
    director.insert_fact(Queen::unassigned(0, 0));
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    let totals = director.constraint_match_totals();
    assert!(totals.values().all(|t| t.matches.is_empty()));
}

#[test]
fn test_unparseable_weight() {
    let config = NetworkConfig::new().with_constraint_weight("queens/Row conflict", "lots");
    let message = config_message(ScoreDirectorFactory::new(constraints(), &config));
    assert!(message.contains("lots"), "{}", message);
}

#[test]
fn test_weight_for_unknown_constraint() {
    let config = NetworkConfig::new().with_constraint_weight("Row conflict", "-1hard/0soft");
    let message = config_message(ScoreDirectorFactory::new(constraints(), &config));
    assert!(message.contains("Row conflict"), "{}", message);
}

#[test]
fn test_programmatic_overrides() {
    let overrides =
        ConstraintWeightOverrides::from_pairs([("queens/Row conflict", HardSoftScore::of_hard(5))]);
    let factory =
        ScoreDirectorFactory::with_overrides(constraints(), &overrides, &NetworkConfig::default())
            .unwrap();
    let mut director = factory.build_director();
    director.insert_fact(Queen::assigned(0, 0, 1));
    director.insert_fact(Queen::assigned(1, 1, 1));
    assert_eq!(director.calculate_score(), HardSoftScore::of_hard(-5));
}

#[test]
fn test_duplicate_constraint_names() {
    let mut duplicated = constraints();
    duplicated.push(duplicated[0].clone());
    let message = config_message(ScoreDirectorFactory::new(duplicated, &NetworkConfig::default()));
    assert!(message.contains("queens/Row conflict"), "{}", message);
}

#[test]
fn test_joiner_of_the_wrong_type() {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Shift>()
        .join(
            factory.for_each::<Employee>(),
            equal_bi(|e: &Employee| e.id, |s: &Shift| s.id),
        )
        .penalize(HardSoftScore::of_hard(1))
        .as_constraint("Backwards joiner")];
    let message = config_message(ScoreDirectorFactory::new(constraints, &NetworkConfig::default()));
    assert!(message.starts_with("constraint [Backwards joiner]"), "{}", message);
}

#[test]
fn test_collector_of_the_wrong_type() {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Shift>()
        .group_by(|s: &Shift| s.day, sum(|q: &Queen| q.column))
        .penalize(HardSoftScore::of_soft(1))
        .as_constraint("Mixed up collector")];
    let message = config_message(ScoreDirectorFactory::new(constraints, &NetworkConfig::default()));
    assert!(message.contains("collector"), "{}", message);
}
