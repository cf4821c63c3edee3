//! Consensus value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SIMILARITY_WEIGHT: f64 = 0.30;
pub const CLAIM_OVERLAP_WEIGHT: f64 = 0.30;
pub const RECOMMENDATION_WEIGHT: f64 = 0.25;
pub const EVIDENCE_WEIGHT: f64 = 0.15;

pub const HIGH_CONSENSUS_THRESHOLD: f64 = 0.80;
pub const MEDIUM_CONSENSUS_THRESHOLD: f64 = 0.50;

/// Self-reported confidence assumed when a member states none
pub const DEFAULT_SELF_CONFIDENCE: f64 = 0.7;

/// Value a sub-score degrades to when its analysis fails
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Cap for agreement points, divergent points and key themes
pub const MAX_LIST_ITEMS: usize = 5;

pub const NO_DATA_RECOMMENDATION: &str =
    "No expert responses were available, so no recommendation can be made.";

pub const FALLBACK_RECOMMENDATION: &str = "Detailed consensus analysis was unavailable. \
     Review the individual expert contributions and weigh them by their stated confidence.";

/// Clamp into [0, 1]; NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One member's complete contribution, as handed to the consensus engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberResponse {
    pub member_id: String,
    pub member_name: String,
    pub content: String,
    /// Self-reported confidence, if the member stated one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
}

impl MemberResponse {
    pub fn new(
        member_id: impl Into<String>,
        member_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            member_name: member_name.into(),
            content: content.into(),
            confidence: None,
            citations: Vec::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_citations(mut self, citations: Vec<String>) -> Self {
        self.citations = citations;
        self
    }

    /// Stated confidence clamped into [0, 1], or the default when absent
    pub fn self_confidence(&self) -> f64 {
        self.confidence
            .map(clamp_unit)
            .unwrap_or(DEFAULT_SELF_CONFIDENCE)
    }
}

/// Discretized consensus level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusLevel {
    High,
    Medium,
    Low,
}

impl ConsensusLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CONSENSUS_THRESHOLD {
            ConsensusLevel::High
        } else if score >= MEDIUM_CONSENSUS_THRESHOLD {
            ConsensusLevel::Medium
        } else {
            ConsensusLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusLevel::High => "high",
            ConsensusLevel::Medium => "medium",
            ConsensusLevel::Low => "low",
        }
    }
}

impl std::fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The four agreement dimensions, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusScores {
    pub semantic_similarity: f64,
    pub claim_overlap: f64,
    pub recommendation_alignment: f64,
    pub evidence_overlap: f64,
}

impl ConsensusScores {
    pub fn new(
        semantic_similarity: f64,
        claim_overlap: f64,
        recommendation_alignment: f64,
        evidence_overlap: f64,
    ) -> Self {
        Self {
            semantic_similarity: clamp_unit(semantic_similarity),
            claim_overlap: clamp_unit(claim_overlap),
            recommendation_alignment: clamp_unit(recommendation_alignment),
            evidence_overlap: clamp_unit(evidence_overlap),
        }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Weighted sum, rounded to 12 decimal places so that equal
    /// sub-scores give back exactly that score at the level thresholds.
    pub fn composite(&self) -> f64 {
        let sum = SIMILARITY_WEIGHT * self.semantic_similarity
            + CLAIM_OVERLAP_WEIGHT * self.claim_overlap
            + RECOMMENDATION_WEIGHT * self.recommendation_alignment
            + EVIDENCE_WEIGHT * self.evidence_overlap;
        clamp_unit((sum * 1e12).round() / 1e12)
    }
}

/// Which bucket a claim fell into when claims were compared across members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStance {
    Agreed,
    Unique,
    Conflicting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedClaim {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    pub stance: ClaimStance,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
}

/// Categorical action a recommendation calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Proceed,
    Caution,
    Stop,
    Investigate,
    Other,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Proceed => "proceed",
            ActionType::Caution => "caution",
            ActionType::Stop => "stop",
            ActionType::Investigate => "investigate",
            ActionType::Other => "other",
        }
    }

    /// Lenient label parsing; anything unrecognized is `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "proceed" | "go" | "approve" | "adopt" => ActionType::Proceed,
            "caution" | "proceed_with_caution" | "conditional" => ActionType::Caution,
            "stop" | "reject" | "avoid" | "halt" => ActionType::Stop,
            "investigate" | "research" | "study" | "defer" => ActionType::Investigate,
            _ => ActionType::Other,
        }
    }

    /// Keyword classification of free text. Checked from the most to the
    /// least restrictive action so "do not proceed" reads as `Stop`.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        const STOP: &[&str] = &[
            "do not proceed",
            "should not",
            "avoid",
            "stop",
            "discontinue",
            "reject",
            "contraindicated",
        ];
        const INVESTIGATE: &[&str] = &[
            "investigate",
            "further research",
            "more data",
            "further study",
            "pilot",
            "evaluate further",
        ];
        const CAUTION: &[&str] = &["caution", "carefully", "monitor", "with care", "conditional"];
        const PROCEED: &[&str] = &["proceed", "recommend", "adopt", "go ahead", "approve"];

        let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
        if hit(STOP) {
            ActionType::Stop
        } else if hit(INVESTIGATE) {
            ActionType::Investigate
        } else if hit(CAUTION) {
            ActionType::Caution
        } else if hit(PROCEED) {
            ActionType::Proceed
        } else {
            ActionType::Other
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" | "urgent" | "critical" => Priority::High,
            "low" | "minor" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecommendation {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    pub action: ActionType,
    pub priority: Priority,
}

/// How a result was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusSource {
    /// Four scored dimensions from two or more responses
    Weighted,
    /// Exactly one response
    Trivial,
    /// No responses
    Empty,
    /// The analysis pipeline failed; derived from self-reported confidence only
    Fallback,
}

/// Outcome of one consensus pass. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub scores: ConsensusScores,
    pub composite: f64,
    pub level: ConsensusLevel,
    pub agreement_points: Vec<String>,
    pub divergent_points: Vec<String>,
    pub key_themes: Vec<String>,
    pub recommendation: String,
    /// Member name -> their (truncated) position
    pub dissenting_opinions: BTreeMap<String, String>,
    /// How much the analysis itself can be trusted, distinct from `composite`
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ExtractedClaim>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<ExtractedRecommendation>,
    pub response_count: usize,
    pub source: ConsensusSource,
}

impl ConsensusResult {
    pub fn has_dissent(&self) -> bool {
        !self.dissenting_opinions.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.source == ConsensusSource::Fallback
    }
}
