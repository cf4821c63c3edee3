//! LLM Gateway port
//!
//! Defines the interface to the text-generation capability. The panel treats
//! it as opaque: one prompt in, one reply out, no retry policy on this side.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider returned an empty reply")]
    EmptyResponse,

    #[error("Timeout")]
    Timeout,

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// One generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Persona or instruction context
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Characters sent, system prompt included
    pub fn prompt_chars(&self) -> usize {
        self.prompt.chars().count()
            + self
                .system_prompt
                .as_deref()
                .map_or(0, |s| s.chars().count())
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer reaches a generation
/// provider. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Generate a reply for `request`
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError>;
}
