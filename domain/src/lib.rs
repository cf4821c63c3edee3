//! Domain layer for expert-panel
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Panel
//!
//! A panel is a group of virtual domain experts deliberating one question.
//! The [`PanelRouter`] maps a question onto a [`PanelTemplate`] and a ranked
//! list of expertise tags using a static keyword index.
//!
//! ## Session
//!
//! A [`PanelSession`] walks a forward-only phase machine:
//!
//! ```text
//! Init → OpeningStatements → Discussion (×N) → [Rebuttals] → [ConsensusBuilding] → Closing
//! ```
//!
//! ## Consensus
//!
//! A [`ConsensusResult`] combines four agreement dimensions into one weighted
//! composite and a level (high / medium / low), with dissent and an estimate
//! of how far the analysis itself can be trusted.

pub mod config;
pub mod consensus;
pub mod core;
pub mod panel;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use config::OutputFormat;
pub use consensus::{
    ActionType, ClaimStance, ConsensusLevel, ConsensusResult, ConsensusScores, ConsensusSource,
    ExtractedClaim, ExtractedRecommendation, MemberResponse, Priority, fallback_consensus,
};
pub use core::{error::DomainError, question::Question};
pub use panel::{
    DEFAULT_TEMPLATE_KEY, ExpertiseTag, PanelConfiguration, PanelFormat, PanelMember, PanelRouter,
    PanelTemplate, RosterFit, RoutingDecision, persona_for,
};
pub use prompt::{AnalysisTask, ConsensusPromptTemplate, PanelPromptTemplate};
pub use session::{PanelEvent, PanelPhase, PanelSession, PhaseFlags, SessionId, Utterance};
