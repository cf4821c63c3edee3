//! Panel event stream
//!
//! A session emits these in chronological order; the `type` tag matches the
//! event names consumers subscribe to (`phase_change`, `member_speaking`,
//! `statement`, ...).

use super::entities::SessionId;
use super::phase::PanelPhase;
use crate::consensus::types::ConsensusResult;
use crate::panel::member::PanelMember;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    PhaseChange {
        phase: PanelPhase,
    },
    MemberSpeaking {
        member_id: String,
        member_name: String,
    },
    Statement {
        member_id: String,
        member_name: String,
        content: String,
    },
    Discussion {
        member_id: String,
        member_name: String,
        round: u32,
        content: String,
    },
    Rebuttal {
        member_id: String,
        member_name: String,
        content: String,
    },
    RoundStart {
        round: u32,
    },
    Consensus {
        result: Box<ConsensusResult>,
    },
    Complete {
        session_id: SessionId,
    },
    Error {
        message: String,
    },
}

impl PanelEvent {
    pub fn member_speaking(member: &PanelMember) -> Self {
        PanelEvent::MemberSpeaking {
            member_id: member.id().to_string(),
            member_name: member.name().to_string(),
        }
    }

    /// Content event for an utterance spoken in `phase`.
    /// `None` for phases in which members do not speak.
    pub fn utterance(
        phase: PanelPhase,
        member: &PanelMember,
        round: u32,
        content: impl Into<String>,
    ) -> Option<Self> {
        let member_id = member.id().to_string();
        let member_name = member.name().to_string();
        let content = content.into();
        match phase {
            PanelPhase::OpeningStatements => Some(PanelEvent::Statement {
                member_id,
                member_name,
                content,
            }),
            PanelPhase::Discussion => Some(PanelEvent::Discussion {
                member_id,
                member_name,
                round,
                content,
            }),
            PanelPhase::Rebuttals => Some(PanelEvent::Rebuttal {
                member_id,
                member_name,
                content,
            }),
            _ => None,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            PanelEvent::PhaseChange { .. } => "phase_change",
            PanelEvent::MemberSpeaking { .. } => "member_speaking",
            PanelEvent::Statement { .. } => "statement",
            PanelEvent::Discussion { .. } => "discussion",
            PanelEvent::Rebuttal { .. } => "rebuttal",
            PanelEvent::RoundStart { .. } => "round_start",
            PanelEvent::Consensus { .. } => "consensus",
            PanelEvent::Complete { .. } => "complete",
            PanelEvent::Error { .. } => "error",
        }
    }

    /// Whether the stream ends after this event
    pub fn is_terminal(&self) -> bool {
        matches!(self, PanelEvent::Complete { .. } | PanelEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> PanelMember {
        PanelMember::new("econ", "Dr. Econ", "Economist", "persona")
    }

    #[test]
    fn test_serialized_tag_matches_event_type() {
        let events = vec![
            PanelEvent::PhaseChange {
                phase: PanelPhase::Rebuttals,
            },
            PanelEvent::member_speaking(&member()),
            PanelEvent::RoundStart { round: 2 },
            PanelEvent::Complete {
                session_id: SessionId::new("s-1"),
            },
            PanelEvent::Error {
                message: "boom".to_string(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }

    #[test]
    fn test_phase_change_payload() {
        let json = serde_json::to_value(PanelEvent::PhaseChange {
            phase: PanelPhase::OpeningStatements,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "phase_change", "phase": "opening_statements"})
        );
    }

    #[test]
    fn test_utterance_event_per_phase() {
        let member = member();
        assert_eq!(
            PanelEvent::utterance(PanelPhase::OpeningStatements, &member, 0, "hi")
                .map(|e| e.event_type()),
            Some("statement")
        );
        assert_eq!(
            PanelEvent::utterance(PanelPhase::Discussion, &member, 2, "hi"),
            Some(PanelEvent::Discussion {
                member_id: "econ".to_string(),
                member_name: "Dr. Econ".to_string(),
                round: 2,
                content: "hi".to_string(),
            })
        );
        assert_eq!(
            PanelEvent::utterance(PanelPhase::Rebuttals, &member, 0, "hi").map(|e| e.event_type()),
            Some("rebuttal")
        );
        assert!(PanelEvent::utterance(PanelPhase::Closing, &member, 0, "hi").is_none());
    }

    #[test]
    fn test_terminal_events() {
        assert!(PanelEvent::Error { message: String::new() }.is_terminal());
        assert!(!PanelEvent::RoundStart { round: 1 }.is_terminal());
    }
}
