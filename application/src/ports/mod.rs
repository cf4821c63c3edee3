//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_logger;
pub mod event_notifier;
pub mod llm_gateway;
pub mod session_store;
pub mod usage;
