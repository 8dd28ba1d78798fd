//! Score director factory.

use std::sync::Arc;

use streamforge_config::{EnvironmentMode, NetworkConfig};
use streamforge_core::{ParseableScore, Result, Score};
use tracing::debug;

use super::ScoreDirector;
use crate::build::build;
use crate::network::NetworkBlueprint;
use crate::stream::ConstraintDef;
use crate::weight_overrides::ConstraintWeightOverrides;

/// Builds the network of a constraint set once and hands out directors
/// running independent instances of it.
///
/// The factory is `Send + Sync`: share it between worker threads and give
/// every worker its own director.
pub struct ScoreDirectorFactory<Sc: Score> {
    blueprint: Arc<NetworkBlueprint<Sc>>,
    environment_mode: EnvironmentMode,
    constraint_match_enabled: bool,
}

impl<Sc: ParseableScore> ScoreDirectorFactory<Sc> {
    /// Applies the weight overrides of `config`, then builds the network.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a weight cannot be parsed, names
    /// an unknown constraint, or when the constraints do not build.
    pub fn new(constraints: Vec<ConstraintDef<Sc>>, config: &NetworkConfig) -> Result<Self> {
        let overrides = ConstraintWeightOverrides::from_config(config)?;
        Self::with_overrides(constraints, &overrides, config)
    }
}

impl<Sc: Score> ScoreDirectorFactory<Sc> {
    /// Like [`ScoreDirectorFactory::new`], with programmatic overrides. The
    /// weights of `config` are ignored.
    pub fn with_overrides(
        constraints: Vec<ConstraintDef<Sc>>,
        overrides: &ConstraintWeightOverrides<Sc>,
        config: &NetworkConfig,
    ) -> Result<Self> {
        let constraints = overrides.apply(constraints)?;
        let blueprint = build(&constraints)?;
        debug!(
            event = "factory_created",
            environment_mode = ?config.environment_mode,
            constraint_match_enabled = config.constraint_match_enabled,
            overrides = overrides.len(),
        );
        Ok(Self {
            blueprint: Arc::new(blueprint),
            environment_mode: config.environment_mode,
            constraint_match_enabled: config.constraint_match_enabled,
        })
    }

    /// A director over an empty set of facts.
    pub fn build_director(&self) -> ScoreDirector<Sc> {
        ScoreDirector::new(
            Arc::clone(&self.blueprint),
            self.environment_mode,
            self.constraint_match_enabled,
        )
    }

    pub fn blueprint(&self) -> &NetworkBlueprint<Sc> {
        &self.blueprint
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.environment_mode
    }
}

impl<Sc: Score> Clone for ScoreDirectorFactory<Sc> {
    fn clone(&self) -> Self {
        Self {
            blueprint: Arc::clone(&self.blueprint),
            environment_mode: self.environment_mode,
            constraint_match_enabled: self.constraint_match_enabled,
        }
    }
}

impl<Sc: Score> std::fmt::Debug for ScoreDirectorFactory<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreDirectorFactory")
            .field("blueprint", &self.blueprint)
            .field("environment_mode", &self.environment_mode)
            .finish()
    }
}
