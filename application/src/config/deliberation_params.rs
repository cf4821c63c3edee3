//! Deliberation parameters: runtime knobs for the panel use cases.
//!
//! [`DeliberationParams`] is resolved once from configuration files and CLI
//! flags, then handed to [`AssemblePanelUseCase`](crate::use_cases::assemble_panel::AssemblePanelUseCase),
//! [`PanelOrchestrator`](crate::use_cases::run_panel::PanelOrchestrator) and
//! [`ConsensusEngine`](crate::use_cases::analyze_consensus::ConsensusEngine).
//!
//! | Field | Used by |
//! |-------|---------|
//! | `max_rounds`, `enable_rebuttals`, `require_consensus`, `time_budget` | assembly (copied into the panel configuration) |
//! | `discussion_temperature` | orchestrator (member turns) |
//! | `scoring_temperature`, `synthesis_temperature`, `detailed_consensus` | consensus engine |

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationParams {
    pub max_rounds: u32,
    pub enable_rebuttals: bool,
    pub require_consensus: bool,
    /// Recorded on the panel configuration; enforcing it is up to the caller.
    pub time_budget: Option<Duration>,
    pub discussion_temperature: f64,
    pub scoring_temperature: f64,
    pub synthesis_temperature: f64,
    /// Run the agreement / divergence / theme extractions and keep claim details.
    pub detailed_consensus: bool,
}

impl Default for DeliberationParams {
    fn default() -> Self {
        Self {
            max_rounds: 2,
            enable_rebuttals: true,
            require_consensus: true,
            time_budget: None,
            discussion_temperature: 0.7,
            scoring_temperature: 0.2,
            synthesis_temperature: 0.4,
            detailed_consensus: true,
        }
    }
}

impl DeliberationParams {
    // ==================== Builder Methods ====================

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_rebuttals(mut self, enabled: bool) -> Self {
        self.enable_rebuttals = enabled;
        self
    }

    pub fn with_consensus(mut self, required: bool) -> Self {
        self.require_consensus = required;
        self
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_detailed_consensus(mut self, detailed: bool) -> Self {
        self.detailed_consensus = detailed;
        self
    }
}
