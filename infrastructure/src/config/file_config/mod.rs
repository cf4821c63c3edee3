//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod consensus;
mod logging;
mod output;
mod panel;
mod provider;

pub use consensus::FileConsensusConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use panel::FilePanelConfig;
pub use provider::FileProviderConfig;

use panel_application::DeliberationParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Upper bound accepted for every sampling temperature
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("panel.max_rounds must be at least 1")]
    NoDiscussionRounds,

    #[error("provider.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("provider.model cannot be empty")]
    EmptyModelName,

    #[error("{field} must be within [0, 2], got {value}")]
    TemperatureOutOfRange { field: &'static str, value: f64 },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Session shape and member-turn sampling
    pub panel: FilePanelConfig,
    /// Consensus engine settings
    pub consensus: FileConsensusConfig,
    /// Generation endpoint
    pub provider: FileProviderConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Reject values no session could run with. Stops at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.panel.max_rounds == 0 {
            return Err(ConfigValidationError::NoDiscussionRounds);
        }
        if self.provider.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.provider.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }

        let temperatures = [
            ("panel.discussion_temperature", self.panel.discussion_temperature),
            ("consensus.scoring_temperature", self.consensus.scoring_temperature),
            ("consensus.synthesis_temperature", self.consensus.synthesis_temperature),
        ];
        for (field, value) in temperatures {
            if !(0.0..=MAX_TEMPERATURE).contains(&value) {
                return Err(ConfigValidationError::TemperatureOutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Runtime knobs for the use cases
    pub fn to_params(&self) -> DeliberationParams {
        DeliberationParams {
            max_rounds: self.panel.max_rounds,
            enable_rebuttals: self.panel.enable_rebuttals,
            require_consensus: self.panel.require_consensus,
            time_budget: self.panel.time_budget_seconds.map(Duration::from_secs),
            discussion_temperature: self.panel.discussion_temperature,
            scoring_temperature: self.consensus.scoring_temperature,
            synthesis_temperature: self.consensus.synthesis_temperature,
            detailed_consensus: self.consensus.detailed,
        }
    }
}
