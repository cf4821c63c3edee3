//! Domain error types

use crate::session::phase::PanelPhase;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Panel roster is empty")]
    EmptyRoster,

    #[error("Panel roster has {actual} members, template allows at most {max}")]
    RosterTooLarge { max: usize, actual: usize },

    #[error("Duplicate panel member id: {0}")]
    DuplicateMember(String),

    #[error("Unknown panel member: {0}")]
    UnknownMember(String),

    #[error("max_rounds must be at least 1")]
    NoDiscussionRounds,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid template '{key}': {reason}")]
    InvalidTemplate { key: String, reason: String },

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: PanelPhase, to: PanelPhase },

    #[error("No utterances can be recorded during {0}")]
    SilentPhase(PanelPhase),

    #[error("Member {0} has not given an opening statement")]
    MissingOpeningStatement(String),

    #[error("All discussion rounds have been used ({0})")]
    RoundsExhausted(u32),

    #[error("Session is already complete")]
    SessionComplete,
}

impl DomainError {
    /// Whether this error comes from a bad panel configuration
    /// (as opposed to a misuse of a running session).
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyRoster
                | DomainError::RosterTooLarge { .. }
                | DomainError::DuplicateMember(_)
                | DomainError::NoDiscussionRounds
                | DomainError::InvalidQuestion(_)
                | DomainError::InvalidTemplate { .. }
        )
    }
}
