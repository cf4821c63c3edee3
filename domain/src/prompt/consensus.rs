//! Prompts for consensus analysis
//!
//! Every analysis prompt starts with a `[analysis: <task>]` line naming the
//! [`AnalysisTask`], and asks for a JSON reply that the functions in
//! [`crate::consensus::parsing`] read.

use crate::consensus::types::{ConsensusLevel, MemberResponse};
use crate::core::string::truncate;

/// Characters of each member's content quoted in the synthesis prompt
const SUMMARY_CHARS: usize = 600;

/// One generation-backed step of the consensus pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisTask {
    SemanticSimilarity,
    ClaimOverlap,
    RecommendationAlignment,
    EvidenceOverlap,
    AgreementPoints,
    DivergentPoints,
    KeyThemes,
    Synthesis,
}

impl AnalysisTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisTask::SemanticSimilarity => "semantic_similarity",
            AnalysisTask::ClaimOverlap => "claim_overlap",
            AnalysisTask::RecommendationAlignment => "recommendation_alignment",
            AnalysisTask::EvidenceOverlap => "evidence_overlap",
            AnalysisTask::AgreementPoints => "agreement_points",
            AnalysisTask::DivergentPoints => "divergent_points",
            AnalysisTask::KeyThemes => "key_themes",
            AnalysisTask::Synthesis => "synthesis",
        }
    }

    /// First line of every prompt for this task
    pub fn tag(&self) -> String {
        format!("[analysis: {}]", self.as_str())
    }
}

impl std::fmt::Display for AnalysisTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Templates for the analyst that scores a finished panel
pub struct ConsensusPromptTemplate;

impl ConsensusPromptTemplate {
    pub fn analyst_system() -> &'static str {
        r#"You are an impartial analyst measuring agreement within an expert panel.
You never add opinions of your own. You judge only what the experts actually wrote.
When asked for JSON, reply with JSON only, no commentary."#
    }

    pub fn format_responses(responses: &[MemberResponse]) -> String {
        responses
            .iter()
            .map(|r| {
                format!(
                    "--- {} (stated confidence {:.2}) ---\n{}",
                    r.member_name,
                    r.self_confidence(),
                    r.content.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn framed(task: AnalysisTask, question: &str, responses: &[MemberResponse], ask: &str) -> String {
        format!(
            "{tag}\nQuestion: {question}\n\nExpert responses:\n{body}\n\n{ask}",
            tag = task.tag(),
            body = Self::format_responses(responses),
        )
    }

    pub fn semantic_similarity(question: &str, responses: &[MemberResponse]) -> String {
        Self::framed(
            AnalysisTask::SemanticSimilarity,
            question,
            responses,
            r#"How similar are these responses in their conclusions and reasoning?
0 means they reach unrelated or opposite conclusions, 1 means they say the same thing.
Reply as JSON: {"score": <0..1>, "rationale": "<one sentence>"}"#,
        )
    }

    pub fn claim_overlap(question: &str, responses: &[MemberResponse]) -> String {
        Self::framed(
            AnalysisTask::ClaimOverlap,
            question,
            responses,
            r#"Extract the factual claims the experts make and sort them:
- agreed: made by two or more experts without contradiction
- unique: made by a single expert and not contested
- conflicting: contradicted by another expert
Then rate how much the experts' claims overlap, from 0 to 1.
Reply as JSON:
{"agreed": [{"claim": "...", "members": ["..."], "confidence": <0..1>, "evidence": ["..."]}],
 "unique": [{"claim": "...", "member": "..."}],
 "conflicting": [{"claim": "...", "members": ["..."]}],
 "overlap": <0..1>}"#,
        )
    }

    pub fn recommendation_alignment(question: &str, responses: &[MemberResponse]) -> String {
        Self::framed(
            AnalysisTask::RecommendationAlignment,
            question,
            responses,
            r#"Extract each expert's final recommendation. Classify its action as one of
proceed, caution, stop, investigate, other, and its priority as high, medium or low.
Then rate how well the recommendations align, from 0 to 1, and summarize how they relate.
Reply as JSON:
{"recommendations": [{"member": "...", "recommendation": "...", "action": "...", "priority": "..."}],
 "alignment": <0..1>,
 "summary": "<one or two sentences>"}"#,
        )
    }

    pub fn evidence_overlap(question: &str, responses: &[MemberResponse]) -> String {
        Self::framed(
            AnalysisTask::EvidenceOverlap,
            question,
            responses,
            r#"How much do the experts rely on the same evidence, sources, data or precedents?
0 means entirely different evidence bases, 1 means the same evidence throughout.
Reply as JSON: {"score": <0..1>, "rationale": "<one sentence>"}"#,
        )
    }

    pub fn agreement_points(question: &str, responses: &[MemberResponse]) -> String {
        Self::framed(
            AnalysisTask::AgreementPoints,
            question,
            responses,
            r#"List up to 5 specific points on which the experts agree.
Reply as a JSON array of short strings."#,
        )
    }

    pub fn divergent_points(question: &str, responses: &[MemberResponse]) -> String {
        Self::framed(
            AnalysisTask::DivergentPoints,
            question,
            responses,
            r#"List up to 5 specific points on which the experts disagree, naming who holds which side.
Reply as a JSON array of short strings."#,
        )
    }

    pub fn key_themes(question: &str, responses: &[MemberResponse]) -> String {
        Self::framed(
            AnalysisTask::KeyThemes,
            question,
            responses,
            r#"List up to 5 themes that recur across the responses, as short noun phrases.
Reply as a JSON array of strings."#,
        )
    }

    pub fn synthesis_system() -> &'static str {
        r#"You are the moderator of an expert panel writing its final recommendation.
Represent the panel faithfully: state the majority view, keep minority concerns visible,
and match your certainty to the level of agreement you are given."#
    }

    pub fn synthesis(
        question: &str,
        responses: &[MemberResponse],
        level: ConsensusLevel,
        alignment_narrative: Option<&str>,
    ) -> String {
        let mut prompt = format!(
            "{}\nQuestion: {question}\n\nExpert summaries:\n",
            AnalysisTask::Synthesis.tag()
        );
        for response in responses {
            prompt.push_str(&format!(
                "\n- {}: {}\n",
                response.member_name,
                truncate(&response.content, SUMMARY_CHARS)
            ));
        }
        prompt.push_str(&format!("\nLevel of consensus: {level}\n"));
        if let Some(narrative) = alignment_narrative {
            prompt.push_str(&format!("How the recommendations relate: {narrative}\n"));
        }
        prompt.push_str(
            r#"
Write the panel's recommendation in one or two short paragraphs, ready to show to the person who asked.
If consensus is low, say plainly that the experts disagree and what the decision hinges on."#,
        );
        prompt
    }
}
