//! Consensus configuration from TOML (`[consensus]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    /// Run the agreement/divergence/theme extractions and keep claim details
    pub detailed: bool,
    pub scoring_temperature: f64,
    pub synthesis_temperature: f64,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        Self {
            detailed: true,
            scoring_temperature: 0.2,
            synthesis_temperature: 0.4,
        }
    }
}
