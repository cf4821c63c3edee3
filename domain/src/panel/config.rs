//! Panel configuration (one per session)

use super::member::PanelMember;
use super::template::PanelTemplate;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// How a roster compares with a template's member bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFit {
    Within,
    BelowMinimum { min: usize, actual: usize },
    AboveMaximum { max: usize, actual: usize },
}

/// Everything a session needs to run: topic, ordered roster and flags.
///
/// A configuration is consumed by exactly one session; starting another
/// deliberation always means building a new configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfiguration {
    pub topic: String,
    /// Speaking order within every phase
    pub members: Vec<PanelMember>,
    pub max_rounds: u32,
    pub enable_rebuttals: bool,
    pub require_consensus: bool,
    /// Caller-side time budget; recorded here, enforced by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget: Option<Duration>,
    /// Template the roster was assembled from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_key: Option<String>,
}

impl PanelConfiguration {
    pub fn new(topic: impl Into<String>, members: Vec<PanelMember>) -> Self {
        Self {
            topic: topic.into(),
            members,
            max_rounds: 2,
            enable_rebuttals: true,
            require_consensus: true,
            time_budget: None,
            template_key: None,
        }
    }

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

    pub fn with_template_key(mut self, key: impl Into<String>) -> Self {
        self.template_key = Some(key.into());
        self
    }

    pub fn member(&self, id: &str) -> Option<&PanelMember> {
        self.members.iter().find(|m| m.id() == id)
    }

    /// Reject configurations a session cannot run.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.topic.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "panel topic cannot be empty".to_string(),
            ));
        }
        if self.members.is_empty() {
            return Err(DomainError::EmptyRoster);
        }
        if self.max_rounds == 0 {
            return Err(DomainError::NoDiscussionRounds);
        }
        let mut seen = HashSet::new();
        for member in &self.members {
            if !seen.insert(member.id()) {
                return Err(DomainError::DuplicateMember(member.id().to_string()));
            }
        }
        Ok(())
    }

    pub fn roster_fit(&self, template: &PanelTemplate) -> RosterFit {
        let actual = self.members.len();
        if actual < template.min_members {
            RosterFit::BelowMinimum {
                min: template.min_members,
                actual,
            }
        } else if actual > template.max_members {
            RosterFit::AboveMaximum {
                max: template.max_members,
                actual,
            }
        } else {
            RosterFit::Within
        }
    }
}
