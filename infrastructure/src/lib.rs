//! Infrastructure layer for expert-panel
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod usage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileConsensusConfig, FileLoggingConfig,
    FileOutputConfig, FilePanelConfig, FileProviderConfig,
};
pub use logging::JsonlConversationLogger;
pub use providers::HttpLlmGateway;
pub use usage::{PurposeUsage, UsageCounter, UsageSnapshot};
