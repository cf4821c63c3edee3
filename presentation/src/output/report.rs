//! Serializable view of a finished session (`--output json`)

use panel_domain::{ConsensusResult, PanelPhase, PanelSession};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PanelReport<'a> {
    pub session_id: &'a str,
    pub topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<&'a str>,
    pub members: Vec<MemberEntry<'a>>,
    pub transcript: Vec<TranscriptLine<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus: Option<&'a ConsensusResult>,
}

#[derive(Debug, Serialize)]
pub struct MemberEntry<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub expertise: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptLine<'a> {
    pub sequence: u64,
    pub member_id: &'a str,
    pub member_name: &'a str,
    pub phase: PanelPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    pub content: &'a str,
}

impl<'a> PanelReport<'a> {
    pub fn from_session(session: &'a PanelSession) -> Self {
        let config = session.config();
        let members = config
            .members
            .iter()
            .map(|m| MemberEntry {
                id: m.id(),
                name: m.name(),
                role: m.role(),
                expertise: m.expertise().iter().map(|t| t.as_str()).collect(),
            })
            .collect();
        let transcript = session
            .transcript()
            .into_iter()
            .map(|entry| TranscriptLine {
                sequence: entry.utterance.sequence,
                member_id: entry.member.id(),
                member_name: entry.member.name(),
                phase: entry.utterance.phase,
                round: entry.utterance.round,
                content: &entry.utterance.content,
            })
            .collect();

        Self {
            session_id: session.id().as_str(),
            topic: &config.topic,
            template: config.template_key.as_deref(),
            members,
            transcript,
            consensus: session.consensus(),
        }
    }
}
