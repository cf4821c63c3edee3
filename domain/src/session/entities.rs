//! Panel session entities

use super::phase::{PanelPhase, PhaseFlags};
use crate::consensus::parsing::{extract_citations, parse_self_confidence};
use crate::consensus::types::{ConsensusResult, MemberResponse};
use crate::core::error::DomainError;
use crate::panel::config::PanelConfiguration;
use crate::panel::member::PanelMember;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of one panel session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One generated contribution by one member. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub phase: PanelPhase,
    /// Discussion round, for discussion utterances only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    /// Position in the session-wide speaking order
    pub sequence: u64,
    pub content: String,
}

impl Utterance {
    /// Short tag used when quoting this utterance back to the panel
    pub fn phase_label(&self) -> String {
        match (self.phase, self.round) {
            (PanelPhase::Discussion, Some(round)) => format!("discussion round {round}"),
            (phase, _) => phase.display_name().to_lowercase(),
        }
    }
}

/// An utterance together with the member who spoke it
#[derive(Debug, Clone, Copy)]
pub struct TranscriptEntry<'a> {
    pub member: &'a PanelMember,
    pub utterance: &'a Utterance,
}

/// One deliberation (Entity)
///
/// Owned by the single task driving it. Phase changes go through
/// [`advance_to`](Self::advance_to), which only accepts the transition the
/// configured flags allow, so the phase sequence can never move backwards.
#[derive(Debug, Clone, Serialize)]
pub struct PanelSession {
    id: SessionId,
    config: PanelConfiguration,
    phase: PanelPhase,
    round: u32,
    utterances: BTreeMap<String, Vec<Utterance>>,
    next_sequence: u64,
    consensus: Option<ConsensusResult>,
    completed: bool,
}

impl PanelSession {
    pub fn new(id: SessionId, config: PanelConfiguration) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            phase: PanelPhase::Init,
            round: 0,
            utterances: BTreeMap::new(),
            next_sequence: 0,
            consensus: None,
            completed: false,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &PanelConfiguration {
        &self.config
    }

    pub fn members(&self) -> &[PanelMember] {
        &self.config.members
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    /// Current discussion round; 0 before the first round starts
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn consensus(&self) -> Option<&ConsensusResult> {
        self.consensus.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn flags(&self) -> PhaseFlags {
        PhaseFlags::new(self.config.enable_rebuttals, self.config.require_consensus)
    }

    /// Phase that follows the current one under this session's flags
    pub fn next_phase(&self) -> Option<PanelPhase> {
        self.phase.next(self.flags())
    }

    /// Move to `to`, which must be the next phase in the plan.
    pub fn advance_to(&mut self, to: PanelPhase) -> Result<(), DomainError> {
        if self.completed {
            return Err(DomainError::SessionComplete);
        }
        if self.next_phase() != Some(to) {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        if to == PanelPhase::Discussion
            && let Some(silent) = self
                .config
                .members
                .iter()
                .find(|m| !self.has_spoken_in(m.id(), PanelPhase::OpeningStatements))
        {
            return Err(DomainError::MissingOpeningStatement(silent.id().to_string()));
        }
        self.phase = to;
        Ok(())
    }

    /// Start the next discussion round and return its 1-based index.
    pub fn begin_round(&mut self) -> Result<u32, DomainError> {
        if self.phase != PanelPhase::Discussion {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: PanelPhase::Discussion,
            });
        }
        if self.round >= self.config.max_rounds {
            return Err(DomainError::RoundsExhausted(self.config.max_rounds));
        }
        self.round += 1;
        Ok(self.round)
    }

    /// Append a member's contribution to the current phase.
    pub fn record(
        &mut self,
        member_id: &str,
        content: impl Into<String>,
    ) -> Result<&Utterance, DomainError> {
        if self.completed {
            return Err(DomainError::SessionComplete);
        }
        if !self.phase.is_speaking_phase() {
            return Err(DomainError::SilentPhase(self.phase));
        }
        if self.config.member(member_id).is_none() {
            return Err(DomainError::UnknownMember(member_id.to_string()));
        }

        let utterance = Utterance {
            phase: self.phase,
            round: (self.phase == PanelPhase::Discussion).then_some(self.round),
            sequence: self.next_sequence,
            content: content.into(),
        };
        self.next_sequence += 1;

        let history = self.utterances.entry(member_id.to_string()).or_default();
        history.push(utterance);
        Ok(&history[history.len() - 1])
    }

    pub fn set_consensus(&mut self, result: ConsensusResult) {
        self.consensus = Some(result);
    }

    /// Mark the session finished. Only valid once `Closing` is reached.
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.phase != PanelPhase::Closing {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: PanelPhase::Closing,
            });
        }
        self.completed = true;
        Ok(())
    }

    fn has_spoken_in(&self, member_id: &str, phase: PanelPhase) -> bool {
        self.utterances
            .get(member_id)
            .is_some_and(|history| history.iter().any(|u| u.phase == phase))
    }

    /// Ordered utterances of one member
    pub fn history(&self, member_id: &str) -> &[Utterance] {
        self.utterances
            .get(member_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn utterance_count(&self) -> usize {
        self.utterances.values().map(Vec::len).sum()
    }

    /// Every utterance in speaking order
    pub fn transcript(&self) -> Vec<TranscriptEntry<'_>> {
        let mut entries: Vec<_> = self
            .config
            .members
            .iter()
            .flat_map(|member| {
                self.history(member.id())
                    .iter()
                    .map(move |utterance| TranscriptEntry { member, utterance })
            })
            .collect();
        entries.sort_by_key(|entry| entry.utterance.sequence);
        entries
    }

    /// Per-member summary handed to consensus analysis.
    ///
    /// Content joins every contribution under its phase label; confidence is
    /// the most recent one the member stated; citations are the union across
    /// contributions. Members who never spoke are left out.
    pub fn member_responses(&self) -> Vec<MemberResponse> {
        self.config
            .members
            .iter()
            .filter_map(|member| {
                let history = self.history(member.id());
                if history.is_empty() {
                    return None;
                }
                let content = history
                    .iter()
                    .map(|u| format!("[{}]\n{}", u.phase_label(), u.content.trim()))
                    .collect::<Vec<_>>()
                    .join("\n\n");

                let mut citations: Vec<String> = Vec::new();
                for citation in history.iter().flat_map(|u| extract_citations(&u.content)) {
                    if !citations.contains(&citation) {
                        citations.push(citation);
                    }
                }

                let mut response = MemberResponse::new(member.id(), member.name(), content)
                    .with_citations(citations);
                response.confidence = history
                    .iter()
                    .rev()
                    .find_map(|u| parse_self_confidence(&u.content));
                Some(response)
            })
            .collect()
    }
}
