//! Tests for network configuration.

use super::*;
use streamforge_core::{HardSoftScore, SimpleScore};

#[test]
fn test_defaults() {
    let config = NetworkConfig::from_toml_str("").unwrap();
    assert_eq!(config, NetworkConfig::default());
    assert_eq!(config.environment_mode, EnvironmentMode::NonReproducible);
    assert!(config.constraint_match_enabled);
    assert!(config.constraint_weights.is_empty());
}

#[test]
fn test_toml_parsing() {
    let toml = r#"
        environment_mode = "reproducible"
        constraint_match_enabled = false

        [constraint_weights]
        "Row conflict" = "-3"
    "#;

    let config = NetworkConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert!(!config.constraint_match_enabled);
    let weights = config.parsed_weights::<SimpleScore>().unwrap();
    assert_eq!(weights.get("Row conflict"), Some(&SimpleScore::of(-3)));
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        environment_mode: fast_assert
        constraint_weights:
          shifts/Overlap: -1hard/0soft
    "#;

    let config = NetworkConfig::from_yaml_str(yaml).unwrap();
    assert!(config.environment_mode.is_asserted());
    assert!(!config.environment_mode.is_fully_asserted());
    let weights = config.parsed_weights::<HardSoftScore>().unwrap();
    assert_eq!(weights["shifts/Overlap"], HardSoftScore::of(-1, 0));
}

#[test]
fn test_invalid_weight() {
    let config = NetworkConfig::new().with_constraint_weight("Overlap", "heavy");
    let err = config.parsed_weights::<HardSoftScore>().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("Overlap")));
}

#[test]
fn test_builder() {
    let config = NetworkConfig::new()
        .with_environment_mode(EnvironmentMode::FullAssert)
        .with_constraint_match_enabled(false);
    assert!(config.environment_mode.is_fully_asserted());
    assert!(!config.constraint_match_enabled);
}

#[test]
fn test_missing_file() {
    let err = NetworkConfig::load("/nonexistent/network.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
