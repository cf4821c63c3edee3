//! Prompt domain
//!
//! Templates for the two kinds of generation the system performs:
//! panel members speaking ([`PanelPromptTemplate`]) and the analyst
//! scoring a finished panel ([`ConsensusPromptTemplate`]).

mod consensus;
mod panel;

pub use consensus::{AnalysisTask, ConsensusPromptTemplate};
pub use panel::PanelPromptTemplate;
