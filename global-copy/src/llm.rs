//! Provider construction from the user's config
//!
//! Bridges `AppConfig` to the llm-client crate: builds providers on demand and
//! resolves the API keys a user doesn't have to type.

use llm_client::{LlmProvider, ProviderKind, get_provider, resolve_api_key};
use log::debug;

use crate::config::{AppConfig, provider_key};
use crate::router::{Credentials, ProviderFactory};

/// Builds HTTP providers using the model, base URL and timeout from config
pub struct ConfiguredProviders {
    config: AppConfig,
}

impl ConfiguredProviders {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl ProviderFactory for ConfiguredProviders {
    fn provider(
        &self,
        kind: ProviderKind,
        api_key: &str,
    ) -> llm_client::Result<Box<dyn LlmProvider>> {
        let provider_config = self.config.provider_config(kind);
        let provider = get_provider(kind, api_key, Some(&provider_config))?;
        debug!(
            "Using LLM provider: {} (model: {})",
            provider.name(),
            provider_config
                .model
                .as_deref()
                .unwrap_or(kind.default_model())
        );
        Ok(provider)
    }
}

/// Keys available without asking: config first, then environment
pub fn stored_credentials(config: &AppConfig) -> Credentials {
    [ProviderKind::Gemini, ProviderKind::OpenAi]
        .into_iter()
        .fold(Credentials::new(), |credentials, kind| {
            match resolve_api_key(kind, config.providers.get(provider_key(kind))) {
                Ok(key) => credentials.with(kind, &key),
                Err(_) => credentials,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_provider_uses_model_from_config() {
        let mut config = AppConfig::default();
        config.provider_config_mut(ProviderKind::OpenAi).model = Some("gpt-4o".to_string());
        let factory = ConfiguredProviders::new(config);

        let provider = factory.provider(ProviderKind::OpenAi, "o-key").unwrap();
        assert_eq!(provider.name(), "OpenAI");
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let factory = ConfiguredProviders::new(AppConfig::default());
        assert!(factory.provider(ProviderKind::Gemini, "").is_err());
    }

    #[test]
    fn test_stored_credentials_from_config() {
        let mut config = AppConfig::default();
        config.provider_config_mut(ProviderKind::Gemini).api_key = Some("g-config".to_string());

        let credentials = stored_credentials(&config);
        assert_eq!(credentials.get(ProviderKind::Gemini), Some("g-config"));
    }
}
