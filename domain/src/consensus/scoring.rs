//! Local consensus math: no generation calls, no I/O.
//!
//! Everything here is deterministic over its inputs so the engine's
//! boundary cases and fallbacks can be tested exhaustively.

use super::types::{
    ActionType, ConsensusLevel, ConsensusResult, ConsensusScores, ConsensusSource,
    ExtractedClaim, ExtractedRecommendation, FALLBACK_RECOMMENDATION, MAX_LIST_ITEMS,
    MemberResponse, NO_DATA_RECOMMENDATION, clamp_unit,
};
use crate::core::string::truncate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Characters of a single member's content used as a trivial recommendation
pub const TRIVIAL_RECOMMENDATION_CHARS: usize = 500;

/// Characters of a dissenter's content kept in `dissenting_opinions`
pub const DISSENT_EXCERPT_CHARS: usize = 200;

pub const DISSENT_CONFIDENCE_FLOOR: f64 = 0.6;
pub const DISSENT_MARGIN: f64 = 0.2;

const CLAIM_EPSILON: f64 = 1e-6;

impl ConsensusResult {
    /// Build a result from scored dimensions. Composite, level, dissent and
    /// analysis confidence are all derived here so they stay consistent.
    pub fn from_scores(
        scores: ConsensusScores,
        responses: &[MemberResponse],
        source: ConsensusSource,
    ) -> Self {
        let composite = scores.composite();
        Self {
            scores,
            composite,
            level: ConsensusLevel::from_score(composite),
            agreement_points: Vec::new(),
            divergent_points: Vec::new(),
            key_themes: Vec::new(),
            recommendation: String::new(),
            dissenting_opinions: detect_dissent(responses, composite),
            confidence: analysis_confidence(responses, composite),
            claims: Vec::new(),
            recommendations: Vec::new(),
            response_count: responses.len(),
            source,
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_agreement_points(mut self, mut points: Vec<String>) -> Self {
        points.truncate(MAX_LIST_ITEMS);
        self.agreement_points = points;
        self
    }

    pub fn with_divergent_points(mut self, mut points: Vec<String>) -> Self {
        points.truncate(MAX_LIST_ITEMS);
        self.divergent_points = points;
        self
    }

    pub fn with_key_themes(mut self, mut themes: Vec<String>) -> Self {
        themes.truncate(MAX_LIST_ITEMS);
        self.key_themes = themes;
        self
    }

    pub fn with_claims(mut self, claims: Vec<ExtractedClaim>) -> Self {
        self.claims = claims;
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<ExtractedRecommendation>) -> Self {
        self.recommendations = recommendations;
        self
    }
}

/// Result for a panel that produced nothing.
pub fn empty_result() -> ConsensusResult {
    ConsensusResult::from_scores(ConsensusScores::uniform(0.0), &[], ConsensusSource::Empty)
        .with_recommendation(NO_DATA_RECOMMENDATION)
}

/// A single voice agrees with itself.
pub fn trivial_result(response: &MemberResponse) -> ConsensusResult {
    let responses = std::slice::from_ref(response);
    let mut result = ConsensusResult::from_scores(
        ConsensusScores::uniform(1.0),
        responses,
        ConsensusSource::Trivial,
    )
    .with_recommendation(truncate(&response.content, TRIVIAL_RECOMMENDATION_CHARS));
    result.confidence = response.self_confidence();
    result
}

/// Consensus from self-reported confidence alone, used when the analysis
/// pipeline cannot run. Every dimension is set to the mean confidence so the
/// composite still equals the weighted sum.
pub fn fallback_consensus(responses: &[MemberResponse]) -> ConsensusResult {
    match responses {
        [] => empty_result(),
        _ => ConsensusResult::from_scores(
            ConsensusScores::uniform(mean_confidence(responses)),
            responses,
            ConsensusSource::Fallback,
        )
        .with_recommendation(FALLBACK_RECOMMENDATION),
    }
}

fn mean_confidence(responses: &[MemberResponse]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    responses.iter().map(|r| r.self_confidence()).sum::<f64>() / responses.len() as f64
}

fn confidence_variance(responses: &[MemberResponse]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let mean = mean_confidence(responses);
    responses
        .iter()
        .map(|r| (r.self_confidence() - mean).powi(2))
        .sum::<f64>()
        / responses.len() as f64
}

/// How far the analysis itself can be trusted:
/// panel size, stated confidence, agreement among confidences, and composite.
pub fn analysis_confidence(responses: &[MemberResponse], composite: f64) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let coverage = (responses.len() as f64 / 5.0).min(1.0);
    let stability = 1.0 - confidence_variance(responses).min(0.5);
    clamp_unit(
        0.3 * coverage
            + 0.3 * mean_confidence(responses)
            + 0.2 * stability
            + 0.2 * clamp_unit(composite),
    )
}

/// Members whose confidence is low outright or low relative to the group.
///
/// Keyed by display name; a name shared by more than one response is
/// qualified with the member id so every dissenter keeps its own entry.
pub fn detect_dissent(responses: &[MemberResponse], composite: f64) -> BTreeMap<String, String> {
    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for r in responses {
        *name_counts.entry(r.member_name.as_str()).or_default() += 1;
    }
    responses
        .iter()
        .filter(|r| is_dissenter(r.self_confidence(), composite))
        .map(|r| {
            let key = if name_counts.get(r.member_name.as_str()).copied().unwrap_or(0) > 1 {
                format!("{} ({})", r.member_name, r.member_id)
            } else {
                r.member_name.clone()
            };
            (key, truncate(&r.content, DISSENT_EXCERPT_CHARS))
        })
        .collect()
}

pub fn is_dissenter(confidence: f64, composite: f64) -> bool {
    confidence < DISSENT_CONFIDENCE_FLOOR || confidence < composite - DISSENT_MARGIN
}

fn citation_set(citations: &[String]) -> BTreeSet<String> {
    citations
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// |a ∩ b| / |a ∪ b| over normalized citations; `None` when both are empty.
pub fn jaccard(a: &[String], b: &[String]) -> Option<f64> {
    let a = citation_set(a);
    let b = citation_set(b);
    let union = a.union(&b).count();
    if union == 0 {
        return None;
    }
    Some(a.intersection(&b).count() as f64 / union as f64)
}

/// Mean pairwise citation Jaccard. `None` if no member cited anything,
/// in which case evidence overlap has to be estimated another way.
pub fn citation_overlap(responses: &[MemberResponse]) -> Option<f64> {
    if responses.iter().all(|r| citation_set(&r.citations).is_empty()) {
        return None;
    }
    let mut pairs = Vec::new();
    for (i, left) in responses.iter().enumerate() {
        for right in &responses[i + 1..] {
            if let Some(score) = jaccard(&left.citations, &right.citations) {
                pairs.push(score);
            }
        }
    }
    if pairs.is_empty() {
        return None;
    }
    Some(pairs.iter().sum::<f64>() / pairs.len() as f64)
}

/// Fraction of recommendations sharing the most common action type.
pub fn alignment_from_actions(actions: &[ActionType]) -> Option<f64> {
    if actions.is_empty() {
        return None;
    }
    let mut counts: HashMap<ActionType, usize> = HashMap::new();
    for action in actions {
        *counts.entry(*action).or_default() += 1;
    }
    let top = counts.values().copied().max().unwrap_or(0);
    Some(top as f64 / actions.len() as f64)
}

pub fn claim_overlap_from_counts(agreed: usize, conflicting: usize) -> f64 {
    clamp_unit(agreed as f64 / (agreed as f64 + conflicting as f64 + CLAIM_EPSILON))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(name: &str, confidence: f64) -> MemberResponse {
        MemberResponse::new(name.to_lowercase(), name, format!("{name} says something"))
            .with_confidence(confidence)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_result() {
        let result = empty_result();
        assert_eq!(result.composite, 0.0);
        assert_eq!(result.level, ConsensusLevel::Low);
        assert_eq!(result.recommendation, NO_DATA_RECOMMENDATION);
        assert_eq!(result.scores, ConsensusScores::uniform(0.0));
        assert_eq!(result.response_count, 0);
        assert_eq!(result.source, ConsensusSource::Empty);
    }

    #[test]
    fn test_trivial_result() {
        let long = MemberResponse::new("a", "Alice", "x".repeat(800)).with_confidence(0.9);
        let result = trivial_result(&long);
        assert_eq!(result.composite, 1.0);
        assert_eq!(result.level, ConsensusLevel::High);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.recommendation.chars().count(), TRIVIAL_RECOMMENDATION_CHARS);
        assert!(result.dissenting_opinions.is_empty());

        let unsure = MemberResponse::new("a", "Alice", "maybe");
        assert_eq!(trivial_result(&unsure).confidence, 0.7);
    }

    #[test]
    fn test_fallback_keeps_composite_invariant() {
        let responses = vec![response("A", 0.9), response("B", 0.8)];
        let result = fallback_consensus(&responses);
        assert!((result.composite - 0.85).abs() < 1e-9);
        assert!((result.composite - result.scores.composite()).abs() < 1e-12);
        assert_eq!(result.level, ConsensusLevel::High);
        assert_eq!(result.source, ConsensusSource::Fallback);
        assert_eq!(result.recommendation, FALLBACK_RECOMMENDATION);
    }

    #[test]
    fn test_fallback_with_no_responses_is_empty() {
        assert_eq!(fallback_consensus(&[]).source, ConsensusSource::Empty);
    }

    #[test]
    fn test_dissent_rule() {
        let responses = vec![
            response("Low", 0.5),
            response("Relative", 0.65),
            response("Steady", 0.9),
        ];
        let dissent = detect_dissent(&responses, 0.9);
        assert!(dissent.contains_key("Low"));
        assert!(dissent.contains_key("Relative"));
        assert!(!dissent.contains_key("Steady"));

        let dissent = detect_dissent(&responses, 0.5);
        assert_eq!(dissent.keys().collect::<Vec<_>>(), vec!["Low"]);
    }

    #[test]
    fn test_dissent_keeps_members_sharing_a_name() {
        let responses = vec![
            MemberResponse::new("smith-cardio", "Dr. Smith", "Too risky").with_confidence(0.3),
            MemberResponse::new("smith-endo", "Dr. Smith", "Unclear").with_confidence(0.2),
            MemberResponse::new("lee", "Dr. Lee", "Proceed").with_confidence(0.9),
        ];
        let dissent = detect_dissent(&responses, 0.5);
        assert_eq!(dissent.len(), 2);
        assert_eq!(dissent["Dr. Smith (smith-cardio)"], "Too risky");
        assert_eq!(dissent["Dr. Smith (smith-endo)"], "Unclear");
    }

    #[test]
    fn test_dissent_excerpt_truncated() {
        let long = MemberResponse::new("a", "A", "y".repeat(500)).with_confidence(0.1);
        let dissent = detect_dissent(&[long], 0.5);
        assert_eq!(dissent["A"].chars().count(), DISSENT_EXCERPT_CHARS);
    }

    #[test]
    fn test_analysis_confidence_formula() {
        let responses = vec![response("A", 0.8), response("B", 0.8)];
        // 0.3*0.4 + 0.3*0.8 + 0.2*1.0 + 0.2*0.5
        let expected = 0.12 + 0.24 + 0.2 + 0.1;
        assert!((analysis_confidence(&responses, 0.5) - expected).abs() < 1e-9);
        assert_eq!(analysis_confidence(&[], 0.5), 0.0);
    }

    #[test]
    fn test_analysis_confidence_drops_with_composite() {
        let responses = vec![response("A", 0.8), response("B", 0.6)];
        assert!(analysis_confidence(&responses, 0.5) < analysis_confidence(&responses, 0.9));
    }

    #[test]
    fn test_jaccard() {
        let a = strings(&["PubMed 123", "NEJM 2020"]);
        let b = strings(&["pubmed 123", "Lancet"]);
        assert!((jaccard(&a, &b).unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(jaccard(&[], &[]), None);
        assert_eq!(jaccard(&a, &[]), Some(0.0));
    }

    #[test]
    fn test_citation_overlap() {
        let responses = vec![
            response("A", 0.8).with_citations(strings(&["s1", "s2"])),
            response("B", 0.8).with_citations(strings(&["s1", "s2"])),
            response("C", 0.8),
        ];
        // pairs: (A,B)=1.0, (A,C)=0.0, (B,C)=0.0
        assert!((citation_overlap(&responses).unwrap() - 1.0 / 3.0).abs() < 1e-9);

        let uncited = vec![response("A", 0.8), response("B", 0.8)];
        assert_eq!(citation_overlap(&uncited), None);
    }

    #[test]
    fn test_alignment_from_actions() {
        use ActionType::*;
        assert_eq!(alignment_from_actions(&[]), None);
        assert_eq!(alignment_from_actions(&[Proceed, Proceed, Stop, Caution]), Some(0.5));
        assert_eq!(alignment_from_actions(&[Stop, Stop]), Some(1.0));
    }

    #[test]
    fn test_claim_overlap_from_counts() {
        assert!((claim_overlap_from_counts(3, 1) - 0.75).abs() < 1e-5);
        assert_eq!(claim_overlap_from_counts(0, 0), 0.0);
        assert!(claim_overlap_from_counts(4, 0) > 0.999);
    }

    #[test]
    fn test_list_caps() {
        let many: Vec<String> = (0..9).map(|i| format!("point {i}")).collect();
        let result = empty_result()
            .with_agreement_points(many.clone())
            .with_divergent_points(many.clone())
            .with_key_themes(many);
        assert_eq!(result.agreement_points.len(), MAX_LIST_ITEMS);
        assert_eq!(result.divergent_points.len(), MAX_LIST_ITEMS);
        assert_eq!(result.key_themes.len(), MAX_LIST_ITEMS);
    }
}
