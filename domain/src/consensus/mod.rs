//! Consensus domain
//!
//! The weighted agreement model and everything that can be computed
//! without calling a generation capability:
//!
//! - [`types`]: scores, levels, extracted claims and recommendations, results
//! - [`scoring`]: composite/level derivation, dissent, analysis confidence,
//!   boundary results and the confidence-only fallback
//! - [`parsing`]: reading structured judgments out of analyst replies
//!
//! ```text
//! composite = 0.30·similarity + 0.30·claim_overlap
//!           + 0.25·recommendation_alignment + 0.15·evidence_overlap
//! ```

pub mod parsing;
pub mod scoring;
pub mod types;

pub use parsing::{
    ClaimAnalysis, RecommendationAnalysis, extract_citations, extract_json, parse_claim_analysis,
    parse_line_items, parse_recommendation_analysis, parse_self_confidence, parse_unit_score,
};
pub use scoring::{
    alignment_from_actions, analysis_confidence, citation_overlap, claim_overlap_from_counts,
    detect_dissent, empty_result, fallback_consensus, is_dissenter, jaccard, trivial_result,
};
pub use types::{
    ActionType, ClaimStance, ConsensusLevel, ConsensusResult, ConsensusScores, ConsensusSource,
    DEFAULT_SELF_CONFIDENCE, ExtractedClaim, ExtractedRecommendation, MAX_LIST_ITEMS,
    MemberResponse, NEUTRAL_SCORE, Priority,
};
