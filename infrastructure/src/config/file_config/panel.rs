//! Panel configuration from TOML (`[panel]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [panel]
//! max_rounds = 3
//! enable_rebuttals = true
//! require_consensus = true
//! time_budget_seconds = 600
//! discussion_temperature = 0.7
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePanelConfig {
    /// Discussion rounds per session (at least 1)
    pub max_rounds: u32,
    pub enable_rebuttals: bool,
    pub require_consensus: bool,
    /// Recorded on each session; the CLI enforces it
    pub time_budget_seconds: Option<u64>,
    /// Sampling temperature for member turns
    pub discussion_temperature: f64,
}

impl Default for FilePanelConfig {
    fn default() -> Self {
        Self {
            max_rounds: 2,
            enable_rebuttals: true,
            require_consensus: true,
            time_budget_seconds: None,
            discussion_temperature: 0.7,
        }
    }
}
