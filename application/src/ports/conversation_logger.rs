//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording a panel's
//! transcript (session start, every utterance, consensus, outcome) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! deliberation in a machine-readable format (JSONL).

use panel_domain::{ConsensusResult, PanelSession, SessionId, Utterance};
use serde_json::{Value, json};

/// A structured conversation event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. Adapters add the timestamp.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "panel_started", "utterance", "consensus").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn panel_started(session: &PanelSession) -> Self {
        let config = session.config();
        let members: Vec<Value> = config
            .members
            .iter()
            .map(|m| json!({"id": m.id(), "name": m.name(), "role": m.role()}))
            .collect();
        Self::new(
            "panel_started",
            json!({
                "session_id": session.id(),
                "topic": config.topic,
                "template": config.template_key,
                "members": members,
                "max_rounds": config.max_rounds,
                "enable_rebuttals": config.enable_rebuttals,
                "require_consensus": config.require_consensus,
            }),
        )
    }

    pub fn utterance(session_id: &SessionId, member_id: &str, utterance: &Utterance) -> Self {
        Self::new(
            "utterance",
            json!({
                "session_id": session_id,
                "member_id": member_id,
                "phase": utterance.phase,
                "round": utterance.round,
                "sequence": utterance.sequence,
                "content": utterance.content,
            }),
        )
    }

    pub fn consensus(session_id: &SessionId, result: &ConsensusResult) -> Self {
        Self::new(
            "consensus",
            json!({
                "session_id": session_id,
                "result": result,
            }),
        )
    }

    pub fn panel_completed(session: &PanelSession) -> Self {
        Self::new(
            "panel_completed",
            json!({
                "session_id": session.id(),
                "utterances": session.utterance_count(),
                "consensus_level": session.consensus().map(|c| c.level),
                "composite": session.consensus().map(|c| c.composite),
            }),
        )
    }

    pub fn panel_failed(session_id: &SessionId, error: &str) -> Self {
        Self::new(
            "panel_failed",
            json!({
                "session_id": session_id,
                "error": error,
            }),
        )
    }
}

/// Port for logging conversation events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// The `log` method is synchronous and non-fallible; a failed write never
/// disturbs the panel.
pub trait ConversationLogger: Send + Sync {
    /// Record a conversation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
