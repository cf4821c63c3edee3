//! OpenAI-compatible chat-completions gateway
//!
//! One request per generation: an optional system message carrying the
//! persona, one user message carrying the prompt. No retries.

use crate::config::FileProviderConfig;
use async_trait::async_trait;
use panel_application::ports::llm_gateway::{GatewayError, GenerationRequest, LlmGateway};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest error body kept in [`GatewayError::HttpStatus`]
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Gateway to an OpenAI-compatible endpoint over HTTP
#[derive(Clone)]
pub struct HttpLlmGateway {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl HttpLlmGateway {
    /// Build a gateway for `base_url` (the `/chat/completions` suffix is
    /// added here). An empty `api_key` sends no Authorization header.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<&str>,
        timeout: Duration,
        max_tokens: u32,
    ) -> Result<Self, GatewayError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| GatewayError::NotConfigured(format!("invalid API key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: completions_url(base_url),
            model: model.into(),
            max_tokens,
        })
    }

    /// Build from the `[provider]` section, reading the key from the
    /// configured environment variable.
    pub fn from_config(config: &FileProviderConfig) -> Result<Self, GatewayError> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(
                "{} is not set; sending requests without an API key",
                config.api_key_env
            );
        }
        Self::new(
            &config.base_url,
            config.model.clone(),
            api_key.as_deref(),
            Duration::from_secs(config.timeout_seconds),
            config.max_tokens,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: request.temperature,
        }
    }
}

fn completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{}/chat/completions", base)
    }
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else if error.is_connect() {
        GatewayError::ConnectionError(error.to_string())
    } else {
        GatewayError::RequestFailed(error.to_string())
    }
}

/// First choice's text, trimmed. Blank text counts as no reply.
fn reply_text(body: &str) -> Result<String, GatewayError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    let content = content.trim();
    if content.is_empty() {
        return Err(GatewayError::EmptyResponse);
    }
    Ok(content.to_string())
}

#[async_trait]
impl LlmGateway for HttpLlmGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        debug!(
            model = %self.model,
            prompt_chars = request.prompt_chars(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.body(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        reply_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpLlmGateway {
        HttpLlmGateway::new(
            "http://localhost:11434/v1/",
            "llama3.1",
            None,
            Duration::from_secs(5),
            256,
        )
        .unwrap()
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("https://api.openai.com/v1"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://host/v1/chat/completions/"),
            "https://host/v1/chat/completions"
        );
        assert_eq!(
            gateway().endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_carries_persona_and_temperature() {
        let gateway = gateway();
        let request = GenerationRequest::new("Opening statement please")
            .with_system_prompt("You are Dr. Econ")
            .with_temperature(0.7);

        let body = serde_json::to_value(gateway.body(&request)).unwrap();
        assert_eq!(body["model"], "llama3.1");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are Dr. Econ");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[test]
    fn test_request_body_without_system_prompt() {
        let gateway = gateway();
        let request = GenerationRequest::new("Score this");

        let body = serde_json::to_value(gateway.body(&request)).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_reply_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Hello  "}}]}"#;
        assert_eq!(reply_text(body).unwrap(), "Hello");

        let empty = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(reply_text(empty), Err(GatewayError::EmptyResponse)));

        let none = r#"{"choices":[]}"#;
        assert!(matches!(reply_text(none), Err(GatewayError::EmptyResponse)));

        assert!(matches!(
            reply_text("not json"),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = FileProviderConfig {
            api_key_env: "PANEL_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..FileProviderConfig::default()
        };
        let gateway = HttpLlmGateway::from_config(&config).unwrap();
        assert_eq!(gateway.model(), "gpt-4o-mini");
        assert_eq!(gateway.endpoint(), "https://api.openai.com/v1/chat/completions");
    }
}
