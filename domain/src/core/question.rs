//! Question value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// A question put before an expert panel (Value Object)
///
/// Carries the question text plus optional background context supplied by
/// the caller. The context is shown to panelists but is not used for routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

impl Question {
    /// Create a new question, rejecting empty or whitespace-only text
    pub fn new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            content: content.trim().to_string(),
            context: None,
        })
    }

    /// Attach background context. Blank context is ignored.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        if !context.trim().is_empty() {
            self.context = Some(context.trim().to_string());
        }
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// The topic string handed to panelists: the question, followed by the
    /// context block when one was supplied.
    pub fn as_topic(&self) -> String {
        match &self.context {
            Some(context) => format!("{}\n\nContext: {}", self.content, context),
            None => self.content.clone(),
        }
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
