//! LLM client library for the global-copy workspace
//!
//! Provides a unified interface over the hosted text-generation APIs:
//! - Google Gemini (generateContent)
//! - OpenAI-compatible chat completions
//! - A fallback wrapper that marks output produced by a stand-in provider

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::ProviderConfig;
pub use error::{LlmError, Result};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use providers::{
    FallbackProvider, GeminiProvider, MockProvider, OpenAICompatibleProvider, ProviderKind,
    get_provider, resolve_api_key,
};
