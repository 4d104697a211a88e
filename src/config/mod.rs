//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `TRAIT_COMPASS` prefix and nested values use double underscores as
//! separators. Every value has a default matching the shipped instrument
//! design, so an empty environment yields a working engine.
//!
//! # Example
//!
//! ```no_run
//! use trait_compass::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Administering {} items", config.engine.target_total);
//! ```

mod engine;
mod error;
mod stages;

pub use engine::{ClinicalGate, EngineConfig, SkipThreshold, DEFAULT_TARGET_TOTAL};
pub use error::{ConfigError, ValidationError};
pub use stages::{StagePolicy, StagesConfig, TerminalStagePolicy};

use serde::{Deserialize, Serialize};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine-wide tunables (target total, skip bar, clinical gates).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-stage advancement thresholds and batch bounds.
    #[serde(default)]
    pub stages: StagesConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variable Format
    ///
    /// - `TRAIT_COMPASS__ENGINE__TARGET_TOTAL=80` -> `engine.target_total = 80`
    /// - `TRAIT_COMPASS__STAGES__STAGE2__NEXT_STAGE_AT=45` ->
    ///   `stages.stage2.next_stage_at = 45`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        // Defaults first, so a partial environment override of a nested
        // section still deserializes.
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(
                config::Environment::default()
                    .prefix("TRAIT_COMPASS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.stages.validate(self.engine.target_total)?;
        Ok(())
    }
}
