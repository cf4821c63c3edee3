//! Generation provider adapters
//!
//! - [`HttpLlmGateway`]: any OpenAI-compatible `/chat/completions` endpoint

mod http_gateway;

pub use http_gateway::HttpLlmGateway;
