//! Application layer for expert-panel
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::DeliberationParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    event_notifier::{ChannelEventNotifier, NoEvents, PanelEventNotifier},
    llm_gateway::{GatewayError, GenerationRequest, LlmGateway},
    session_store::{InMemorySessionStore, SessionStore, StoredSession},
    usage::{NoUsageTracking, UsageTracker},
};
pub use use_cases::analyze_consensus::{ConsensusEngine, ConsensusError};
pub use use_cases::assemble_panel::{
    AssemblePanelError, AssemblePanelInput, AssemblePanelUseCase, AssembledPanel,
};
pub use use_cases::run_panel::{PanelOrchestrator, RunPanelError};
