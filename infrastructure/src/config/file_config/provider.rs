//! Generation provider configuration from TOML (`[provider]` section)
//!
//! Any OpenAI-compatible chat-completions endpoint works.
//!
//! ```toml
//! [provider]
//! base_url = "http://localhost:11434/v1"
//! model = "llama3.1"
//! api_key_env = "OLLAMA_API_KEY"
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the bearer key (default: "OPENAI_API_KEY")
    pub api_key_env: String,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Default max tokens per response
    pub max_tokens: u32,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_seconds: 120,
            max_tokens: 1024,
        }
    }
}
