//! LLM provider implementations

mod fallback;
mod gemini;
pub mod mock;
mod openai_compatible;

pub use fallback::FallbackProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai_compatible::OpenAICompatibleProvider;

use std::str::FromStr;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "open-ai" | "open_ai" => Ok(Self::OpenAi),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }
}

impl ProviderKind {
    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GOOGLE_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Model used when the config doesn't name one
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    /// Human-readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAi => "OpenAI",
        }
    }
}

/// Create a provider instance for `kind` using the given API key
///
/// Model, base URL and timeout come from `provider_config` when set.
pub fn get_provider(
    kind: ProviderKind,
    api_key: &str,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(LlmError::MissingApiKey {
            provider: kind.display_name().to_string(),
            env_var: kind.env_var().to_string(),
        });
    }

    let model = provider_config
        .and_then(|c| c.model.as_deref())
        .unwrap_or(kind.default_model());
    let base_url = provider_config.and_then(|c| c.base_url.as_deref());
    let timeout = Duration::from_secs(
        provider_config
            .and_then(|c| c.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );

    match kind {
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new(model, api_key.to_string(), timeout)?;
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Ok(Box::new(provider))
        }
        ProviderKind::OpenAi => {
            let url = base_url.unwrap_or(openai_compatible::OPENAI_API_BASE);
            Ok(Box::new(OpenAICompatibleProvider::new(
                model,
                url,
                api_key.to_string(),
                "OpenAI",
                timeout,
            )?))
        }
    }
}

/// Get API key from config or environment variable
pub fn resolve_api_key(kind: ProviderKind, config: Option<&ProviderConfig>) -> Result<String> {
    // Check config first
    if let Some(key) = config
        .and_then(|c| c.api_key.as_deref())
        .filter(|k| !k.trim().is_empty())
    {
        return Ok(key.to_string());
    }

    // Fall back to environment variable
    std::env::var(kind.env_var())
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| LlmError::MissingApiKey {
            provider: kind.display_name().to_string(),
            env_var: kind.env_var().to_string(),
        })
}

/// Build the shared HTTP client used by the API providers
fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}
