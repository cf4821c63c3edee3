//! Analyze Consensus use case
//!
//! Scores a finished panel. The four agreement dimensions are independent
//! generation calls launched together; each one degrades to its own
//! fallback, so a single failed call never aborts the analysis. If the
//! pipeline as a whole fails, the result is computed from self-reported
//! confidence alone. Callers always get a well-formed [`ConsensusResult`].

use crate::config::DeliberationParams;
use crate::ports::llm_gateway::{GenerationRequest, LlmGateway};
use crate::ports::usage::{NoUsageTracking, UsageTracker};
use crate::use_cases::shared::generate_tracked;
use futures::FutureExt;
use panel_domain::consensus::{
    ClaimAnalysis, ClaimStance, MAX_LIST_ITEMS, NEUTRAL_SCORE, RecommendationAnalysis,
    alignment_from_actions, citation_overlap, claim_overlap_from_counts, empty_result,
    fallback_consensus, parse_claim_analysis, parse_line_items, parse_recommendation_analysis,
    parse_unit_score, trivial_result,
};
use panel_domain::core::string::truncate;
use panel_domain::{
    ActionType, AnalysisTask, ConsensusLevel, ConsensusPromptTemplate, ConsensusResult,
    ConsensusScores, ConsensusSource, MemberResponse,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Internal failure of the weighted pipeline. Never returned to callers;
/// it routes the analysis to [`fallback_consensus`].
#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Analysis produced a non-finite {0}")]
    NonFinite(&'static str),
}

/// Use case for computing consensus over member responses
pub struct ConsensusEngine<G: LlmGateway + ?Sized + 'static> {
    gateway: Arc<G>,
    usage: Arc<dyn UsageTracker>,
    scoring_temperature: f64,
    synthesis_temperature: f64,
}

impl<G: LlmGateway + ?Sized + 'static> Clone for ConsensusEngine<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            usage: Arc::clone(&self.usage),
            scoring_temperature: self.scoring_temperature,
            synthesis_temperature: self.synthesis_temperature,
        }
    }
}

impl<G: LlmGateway + ?Sized + 'static> ConsensusEngine<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        let defaults = DeliberationParams::default();
        Self {
            gateway,
            usage: Arc::new(NoUsageTracking),
            scoring_temperature: defaults.scoring_temperature,
            synthesis_temperature: defaults.synthesis_temperature,
        }
    }

    pub fn with_params(mut self, params: &DeliberationParams) -> Self {
        self.scoring_temperature = params.scoring_temperature;
        self.synthesis_temperature = params.synthesis_temperature;
        self
    }

    pub fn with_usage_tracker(mut self, usage: Arc<dyn UsageTracker>) -> Self {
        self.usage = usage;
        self
    }

    /// Consensus over `responses` to `question`.
    ///
    /// Zero responses give the empty result and one response the trivial
    /// result, without any generation call. With `detailed` unset the
    /// agreement / divergence / theme extractions are skipped and claim and
    /// recommendation details are left out.
    pub async fn analyze(
        &self,
        question: &str,
        responses: &[MemberResponse],
        detailed: bool,
    ) -> ConsensusResult {
        match responses {
            [] => {
                debug!("No responses to analyze");
                return empty_result();
            }
            [single] => {
                debug!("Single response, trivial consensus");
                return trivial_result(single);
            }
            _ => {}
        }

        info!("Analyzing consensus across {} responses", responses.len());
        let pipeline = self.weighted(question, responses, detailed);
        match AssertUnwindSafe(pipeline).catch_unwind().await {
            Ok(Ok(result)) => {
                info!(
                    composite = result.composite,
                    level = %result.level,
                    dissenters = result.dissenting_opinions.len(),
                    "Consensus computed"
                );
                result
            }
            Ok(Err(e)) => {
                warn!("Consensus pipeline failed, using confidence fallback: {}", e);
                fallback_consensus(responses)
            }
            Err(_) => {
                warn!("Consensus pipeline panicked, using confidence fallback");
                fallback_consensus(responses)
            }
        }
    }

    async fn weighted(
        &self,
        question: &str,
        responses: &[MemberResponse],
        detailed: bool,
    ) -> Result<ConsensusResult, ConsensusError> {
        let supporting = |task: AnalysisTask| async move {
            if detailed {
                self.line_items(task, question, responses).await
            } else {
                Vec::new()
            }
        };

        let (
            similarity,
            (claim_overlap, claims),
            (alignment, recommendations),
            evidence,
            agreement,
            divergent,
            themes,
        ) = tokio::join!(
            self.semantic_similarity(question, responses),
            self.claim_overlap(question, responses),
            self.recommendation_alignment(question, responses),
            self.evidence_overlap(question, responses),
            supporting(AnalysisTask::AgreementPoints),
            supporting(AnalysisTask::DivergentPoints),
            supporting(AnalysisTask::KeyThemes),
        );

        let scores = ConsensusScores::new(similarity, claim_overlap, alignment, evidence);
        debug!(
            similarity = scores.semantic_similarity,
            claim_overlap = scores.claim_overlap,
            alignment = scores.recommendation_alignment,
            evidence = scores.evidence_overlap,
            "Sub-scores"
        );

        let mut result = ConsensusResult::from_scores(scores, responses, ConsensusSource::Weighted)
            .with_agreement_points(agreement)
            .with_divergent_points(divergent)
            .with_key_themes(themes);
        if !result.composite.is_finite() {
            return Err(ConsensusError::NonFinite("composite"));
        }
        if !result.confidence.is_finite() {
            return Err(ConsensusError::NonFinite("analysis confidence"));
        }

        let recommendation = self
            .synthesize(
                question,
                responses,
                result.level,
                recommendations.narrative.as_deref(),
            )
            .await;
        result = result.with_recommendation(recommendation);

        if detailed {
            result = result
                .with_claims(claims.claims)
                .with_recommendations(recommendations.recommendations);
        }
        Ok(result)
    }

    fn scoring_request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest::new(prompt)
            .with_system_prompt(ConsensusPromptTemplate::analyst_system())
            .with_temperature(self.scoring_temperature)
    }

    /// Reply for one analysis task, or `None` if the call failed.
    async fn ask(&self, task: AnalysisTask, prompt: String) -> Option<String> {
        let request = self.scoring_request(prompt);
        match generate_tracked(self.gateway.as_ref(), self.usage.as_ref(), task.as_str(), &request)
            .await
        {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(task = %task, "Analysis call failed: {}", e);
                None
            }
        }
    }

    /// A single-number analysis; 0.5 when the call fails or no number parses.
    async fn unit_score(&self, task: AnalysisTask, prompt: String) -> f64 {
        match self.ask(task, prompt).await {
            Some(reply) => parse_unit_score(&reply).unwrap_or_else(|| {
                debug!(task = %task, "No score in reply, using neutral score");
                NEUTRAL_SCORE
            }),
            None => NEUTRAL_SCORE,
        }
    }

    async fn semantic_similarity(&self, question: &str, responses: &[MemberResponse]) -> f64 {
        let prompt = ConsensusPromptTemplate::semantic_similarity(question, responses);
        self.unit_score(AnalysisTask::SemanticSimilarity, prompt)
            .await
    }

    /// Stated overlap, else agreed / (agreed + conflicting). A reply with
    /// neither a number nor any claims counts as a failed call.
    async fn claim_overlap(
        &self,
        question: &str,
        responses: &[MemberResponse],
    ) -> (f64, ClaimAnalysis) {
        let prompt = ConsensusPromptTemplate::claim_overlap(question, responses);
        let Some(reply) = self.ask(AnalysisTask::ClaimOverlap, prompt).await else {
            return (NEUTRAL_SCORE, ClaimAnalysis::default());
        };
        let analysis = parse_claim_analysis(&reply);
        let score = match analysis.overlap {
            Some(overlap) => overlap,
            None if analysis.claims.is_empty() => NEUTRAL_SCORE,
            None => claim_overlap_from_counts(
                analysis.count(ClaimStance::Agreed),
                analysis.count(ClaimStance::Conflicting),
            ),
        };
        (score, analysis)
    }

    /// Stated alignment, else the share of the most common action type,
    /// classifying the responses locally when no recommendations parsed.
    async fn recommendation_alignment(
        &self,
        question: &str,
        responses: &[MemberResponse],
    ) -> (f64, RecommendationAnalysis) {
        let prompt = ConsensusPromptTemplate::recommendation_alignment(question, responses);
        let Some(reply) = self
            .ask(AnalysisTask::RecommendationAlignment, prompt)
            .await
        else {
            return (NEUTRAL_SCORE, RecommendationAnalysis::default());
        };
        let analysis = parse_recommendation_analysis(&reply);
        let score = analysis
            .alignment
            .or_else(|| alignment_from_actions(&analysis.actions()))
            .or_else(|| {
                let local: Vec<ActionType> = responses
                    .iter()
                    .map(|r| ActionType::classify(&r.content))
                    .collect();
                alignment_from_actions(&local)
            })
            .unwrap_or(NEUTRAL_SCORE);
        (score, analysis)
    }

    /// Citation Jaccard when members cited sources, otherwise a generated estimate.
    async fn evidence_overlap(&self, question: &str, responses: &[MemberResponse]) -> f64 {
        if let Some(overlap) = citation_overlap(responses) {
            debug!(overlap, "Evidence overlap from citations");
            return overlap;
        }
        let prompt = ConsensusPromptTemplate::evidence_overlap(question, responses);
        self.unit_score(AnalysisTask::EvidenceOverlap, prompt).await
    }

    async fn line_items(
        &self,
        task: AnalysisTask,
        question: &str,
        responses: &[MemberResponse],
    ) -> Vec<String> {
        let prompt = match task {
            AnalysisTask::AgreementPoints => {
                ConsensusPromptTemplate::agreement_points(question, responses)
            }
            AnalysisTask::DivergentPoints => {
                ConsensusPromptTemplate::divergent_points(question, responses)
            }
            _ => ConsensusPromptTemplate::key_themes(question, responses),
        };
        self.ask(task, prompt)
            .await
            .map(|reply| parse_line_items(&reply, MAX_LIST_ITEMS))
            .unwrap_or_default()
    }

    async fn synthesize(
        &self,
        question: &str,
        responses: &[MemberResponse],
        level: ConsensusLevel,
        narrative: Option<&str>,
    ) -> String {
        let request = GenerationRequest::new(ConsensusPromptTemplate::synthesis(
            question, responses, level, narrative,
        ))
        .with_system_prompt(ConsensusPromptTemplate::synthesis_system())
        .with_temperature(self.synthesis_temperature);

        let task = AnalysisTask::Synthesis;
        match generate_tracked(self.gateway.as_ref(), self.usage.as_ref(), task.as_str(), &request)
            .await
        {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => local_recommendation(level, responses),
            Err(e) => {
                warn!("Synthesis failed, using most confident position: {}", e);
                local_recommendation(level, responses)
            }
        }
    }
}

/// Recommendation built without generation: the most confident member's position.
fn local_recommendation(level: ConsensusLevel, responses: &[MemberResponse]) -> String {
    let most_confident = responses.iter().max_by(|a, b| {
        a.self_confidence()
            .partial_cmp(&b.self_confidence())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    match most_confident {
        Some(response) => format!(
            "The panel reached {level} consensus. Most confident position ({}): {}",
            response.member_name,
            truncate(&response.content, 300)
        ),
        None => format!("The panel reached {level} consensus."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    /// Answers each analysis task from a fixed table, keyed by the task tag
    /// on the first line of the prompt. Tasks missing from the table fail.
    struct ScriptedAnalyst {
        replies: HashMap<&'static str, String>,
        calls: Mutex<Vec<String>>,
        panic_on: Option<&'static str>,
    }

    impl ScriptedAnalyst {
        fn new(replies: &[(&'static str, &str)]) -> Self {
            Self {
                replies: replies
                    .iter()
                    .map(|(task, reply)| (*task, reply.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
                panic_on: None,
            }
        }

        fn panicking_on(mut self, task: &'static str) -> Self {
            self.panic_on = Some(task);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn task_of(prompt: &str) -> String {
        prompt
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("[analysis: "))
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or("unknown")
            .to_string()
    }

    #[async_trait]
    impl LlmGateway for ScriptedAnalyst {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
            let task = task_of(&request.prompt);
            self.calls.lock().unwrap().push(task.clone());
            if self.panic_on == Some(task.as_str()) {
                panic!("analyst crashed");
            }
            self.replies
                .get(task.as_str())
                .cloned()
                .ok_or_else(|| GatewayError::RequestFailed(format!("no reply for {task}")))
        }
    }

    fn agreeing_replies() -> Vec<(&'static str, &'static str)> {
        vec![
            ("semantic_similarity", r#"{"score": 0.9}"#),
            (
                "claim_overlap",
                r#"{"agreed": [{"claim": "Metformin first", "members": ["A", "B"]}], "unique": [], "conflicting": [], "overlap": 0.9}"#,
            ),
            (
                "recommendation_alignment",
                r#"{"recommendations": [{"member": "A", "recommendation": "Start metformin", "action": "proceed"}, {"member": "B", "recommendation": "Start metformin", "action": "proceed"}], "alignment": 0.95, "summary": "Both say start."}"#,
            ),
            ("evidence_overlap", r#"{"score": 0.8}"#),
            ("agreement_points", r#"["Start metformin"]"#),
            ("divergent_points", "[]"),
            ("key_themes", r#"["first-line therapy", "safety"]"#),
            ("synthesis", "Start metformin."),
        ]
    }

    fn two_agreeing() -> Vec<MemberResponse> {
        vec![
            MemberResponse::new("a", "A", "Start metformin.").with_confidence(0.9),
            MemberResponse::new("b", "B", "Start metformin now.").with_confidence(0.9),
        ]
    }

    fn engine(analyst: ScriptedAnalyst) -> (Arc<ScriptedAnalyst>, ConsensusEngine<ScriptedAnalyst>) {
        let analyst = Arc::new(analyst);
        (Arc::clone(&analyst), ConsensusEngine::new(analyst))
    }

    fn assert_well_formed(result: &ConsensusResult) {
        for score in [
            result.scores.semantic_similarity,
            result.scores.claim_overlap,
            result.scores.recommendation_alignment,
            result.scores.evidence_overlap,
            result.composite,
            result.confidence,
        ] {
            assert!((0.0..=1.0).contains(&score), "{score} out of range");
        }
        assert!((result.composite - result.scores.composite()).abs() < 1e-9);
        assert!(result.agreement_points.len() <= MAX_LIST_ITEMS);
        assert!(result.divergent_points.len() <= MAX_LIST_ITEMS);
        assert!(result.key_themes.len() <= MAX_LIST_ITEMS);
    }

    #[tokio::test]
    async fn test_no_responses() {
        let (analyst, engine) = engine(ScriptedAnalyst::new(&[]));
        let result = engine.analyze("Q", &[], true).await;
        assert_eq!(result.composite, 0.0);
        assert_eq!(result.level, ConsensusLevel::Low);
        assert_eq!(result.source, ConsensusSource::Empty);
        assert!(analyst.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_response_is_trivial() {
        let (analyst, engine) = engine(ScriptedAnalyst::new(&[]));
        let response = MemberResponse::new("a", "A", "Go.").with_confidence(0.85);
        let result = engine.analyze("Q", &[response], true).await;
        assert_eq!(result.composite, 1.0);
        assert_eq!(result.level, ConsensusLevel::High);
        assert_eq!(result.confidence, 0.85);
        assert!(analyst.calls().is_empty());
    }

    #[tokio::test]
    async fn test_agreeing_panel_is_high_without_dissent() {
        let (_, engine) = engine(ScriptedAnalyst::new(&agreeing_replies()));
        let result = engine.analyze("Q", &two_agreeing(), true).await;

        assert_well_formed(&result);
        assert!(result.composite >= 0.80, "composite {}", result.composite);
        assert_eq!(result.level, ConsensusLevel::High);
        assert!(result.dissenting_opinions.is_empty());
        assert_eq!(result.recommendation, "Start metformin.");
        assert_eq!(result.agreement_points, vec!["Start metformin"]);
        assert_eq!(result.key_themes.len(), 2);
        assert_eq!(result.claims.len(), 1);
        assert_eq!(result.recommendations.len(), 2);
        assert_eq!(result.source, ConsensusSource::Weighted);
    }

    #[tokio::test]
    async fn test_opposed_panel_is_low() {
        let replies = vec![
            ("semantic_similarity", r#"{"score": 0.5}"#),
            ("claim_overlap", r#"{"agreed": [], "conflicting": ["X"], "overlap": 0.4}"#),
            ("recommendation_alignment", r#"{"recommendations": [], "alignment": 0.2}"#),
            ("evidence_overlap", r#"{"score": 0.3}"#),
            ("synthesis", "The experts disagree."),
        ];
        let (_, engine) = engine(ScriptedAnalyst::new(&replies));
        let result = engine.analyze("Q", &two_agreeing(), false).await;

        assert!((result.composite - 0.365).abs() < 1e-9);
        assert_eq!(result.level, ConsensusLevel::Low);
    }

    #[tokio::test]
    async fn test_failed_sub_analysis_defaults_to_neutral() {
        let mut replies = agreeing_replies();
        replies.retain(|(task, _)| *task != "semantic_similarity");

        let (_, full_engine) = engine(ScriptedAnalyst::new(&agreeing_replies()));
        let full = full_engine.analyze("Q", &two_agreeing(), true).await;

        let (_, engine) = engine(ScriptedAnalyst::new(&replies));
        let degraded = engine.analyze("Q", &two_agreeing(), true).await;

        assert_well_formed(&degraded);
        assert_eq!(degraded.scores.semantic_similarity, NEUTRAL_SCORE);
        assert_eq!(degraded.scores.claim_overlap, 0.9);
        assert_eq!(degraded.source, ConsensusSource::Weighted);
        assert!(degraded.confidence < full.confidence);
    }

    #[tokio::test]
    async fn test_every_call_failing_still_returns_result() {
        let (_, engine) = engine(ScriptedAnalyst::new(&[]));
        let result = engine.analyze("Q", &two_agreeing(), true).await;

        assert_well_formed(&result);
        assert_eq!(result.scores, ConsensusScores::uniform(NEUTRAL_SCORE));
        assert_eq!(result.level, ConsensusLevel::Medium);
        assert!(result.recommendation.contains("Most confident position"));
        assert!(result.agreement_points.is_empty());
    }

    #[tokio::test]
    async fn test_panic_routes_to_fallback() {
        let analyst = ScriptedAnalyst::new(&agreeing_replies()).panicking_on("claim_overlap");
        let (_, engine) = engine(analyst);
        let result = engine.analyze("Q", &two_agreeing(), true).await;

        assert_eq!(result.source, ConsensusSource::Fallback);
        assert!((result.composite - 0.9).abs() < 1e-9);
        assert_well_formed(&result);
    }

    #[tokio::test]
    async fn test_unparseable_replies_use_documented_fallbacks() {
        let replies = vec![
            ("semantic_similarity", "They mostly agree."),
            (
                "claim_overlap",
                "Agreed:\n- a\n- b\n- c\n\nConflicting:\n- d\n",
            ),
            ("recommendation_alignment", "No structure at all."),
            ("evidence_overlap", "n/a"),
            ("synthesis", "Proceed."),
        ];
        let responses = vec![
            MemberResponse::new("a", "A", "We should proceed.").with_confidence(0.8),
            MemberResponse::new("b", "B", "Proceed with the plan.").with_confidence(0.8),
            MemberResponse::new("c", "C", "Stop immediately.").with_confidence(0.8),
        ];
        let (_, engine) = engine(ScriptedAnalyst::new(&replies));
        let result = engine.analyze("Q", &responses, false).await;

        assert_eq!(result.scores.semantic_similarity, NEUTRAL_SCORE);
        assert!((result.scores.claim_overlap - 0.75).abs() < 1e-5);
        // two of three classified as proceed
        assert!((result.scores.recommendation_alignment - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.scores.evidence_overlap, NEUTRAL_SCORE);
    }

    #[tokio::test]
    async fn test_citations_replace_evidence_call() {
        let responses = vec![
            MemberResponse::new("a", "A", "x")
                .with_confidence(0.9)
                .with_citations(vec!["s1".to_string(), "s2".to_string()]),
            MemberResponse::new("b", "B", "y")
                .with_confidence(0.9)
                .with_citations(vec!["s1".to_string()]),
        ];
        let (analyst, engine) = engine(ScriptedAnalyst::new(&agreeing_replies()));
        let result = engine.analyze("Q", &responses, true).await;

        assert_eq!(result.scores.evidence_overlap, 0.5);
        assert!(!analyst.calls().iter().any(|t| t == "evidence_overlap"));
    }

    #[tokio::test]
    async fn test_summary_mode_skips_supporting_extractions() {
        let (analyst, engine) = engine(ScriptedAnalyst::new(&agreeing_replies()));
        let result = engine.analyze("Q", &two_agreeing(), false).await;

        let calls = analyst.calls();
        assert!(!calls.iter().any(|t| t == "agreement_points" || t == "key_themes"));
        assert!(result.claims.is_empty());
        assert!(result.recommendations.is_empty());
        assert!(result.key_themes.is_empty());
        assert_eq!(calls.len(), 5);
    }

    #[tokio::test]
    async fn test_dissenters_are_reported() {
        let responses = vec![
            MemberResponse::new("a", "A", "Start metformin.").with_confidence(0.95),
            MemberResponse::new("b", "B", "Not sure at all.").with_confidence(0.4),
        ];
        let (_, engine) = engine(ScriptedAnalyst::new(&agreeing_replies()));
        let result = engine.analyze("Q", &responses, true).await;

        assert_eq!(
            result.dissenting_opinions.keys().collect::<Vec<_>>(),
            vec!["B"]
        );
    }
}
