//! Generation router
//!
//! Checks a request against the session's plan, picks the provider route and
//! forwards the prompt. Preconditions are checked in a fixed order so the user
//! always sees the most fundamental problem first: quota, entitlement, then
//! credential.

use llm_client::{FallbackProvider, LlmError, LlmProvider, LlmRequest, ProviderKind};
use log::{debug, info};
use std::collections::HashMap;

use crate::error::CopyError;
use crate::plan::{PlanPolicy, ProviderId, Route};
use crate::prompt::GenerationRequest;
use crate::session::Session;

/// Builds a ready-to-call provider for an API and key
pub trait ProviderFactory: Send + Sync {
    fn provider(&self, kind: ProviderKind, api_key: &str) -> llm_client::Result<Box<dyn LlmProvider>>;
}

/// API keys entered by the user, one per backing API
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderKind, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank keys are treated as not set.
    pub fn set(&mut self, kind: ProviderKind, key: &str) {
        let key = key.trim();
        if key.is_empty() {
            self.keys.remove(&kind);
        } else {
            self.keys.insert(kind, key.to_string());
        }
    }

    pub fn with(mut self, kind: ProviderKind, key: &str) -> Self {
        self.set(kind, key);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }
}

pub struct GenerationRouter {
    factory: Box<dyn ProviderFactory>,
    upgrade_url: String,
}

impl GenerationRouter {
    pub fn new(factory: Box<dyn ProviderFactory>, upgrade_url: &str) -> Self {
        Self {
            factory,
            upgrade_url: upgrade_url.to_string(),
        }
    }

    /// The session's policy, or why it can't generate anything at all.
    pub fn check_quota(&self, session: &Session) -> Result<PlanPolicy, CopyError> {
        let policy = session.policy().ok_or(CopyError::NotAuthenticated)?;

        if policy.quota_reached(session.usage_count()) {
            return Err(CopyError::QuotaExceeded {
                plan: policy.tier,
                limit: policy.request_limit,
                upgrade_url: self.upgrade_url.clone(),
            });
        }
        Ok(policy)
    }

    /// Validate a request without calling anything. Returns the plan policy
    /// and the key of the API that will serve it.
    pub fn check<'c>(
        &self,
        session: &Session,
        provider: ProviderId,
        credentials: &'c Credentials,
    ) -> Result<(PlanPolicy, &'c str), CopyError> {
        let policy = self.check_quota(session)?;

        if !policy.allows(provider) {
            return Err(CopyError::ProviderNotEntitled {
                provider,
                plan: policy.tier,
            });
        }

        let backing = provider.route().backing();
        let api_key = credentials
            .get(backing)
            .ok_or(CopyError::MissingCredential { provider, backing })?;

        Ok((policy, api_key))
    }

    /// Generate copy for `request`. Only a successful call counts against the
    /// session's quota.
    pub async fn generate(
        &self,
        session: &mut Session,
        credentials: &Credentials,
        request: &GenerationRequest,
    ) -> Result<String, CopyError> {
        let provider_id = request.provider;
        let (policy, api_key) = self.check(session, provider_id, credentials)?;

        let route = provider_id.route();
        let provider = self.build(provider_id, route, api_key)?;
        let prompt = request.to_prompt();
        debug!("Routing to {} via {:?}:\n{}", provider_id, route, prompt);

        session.begin_generation();
        let result = provider.complete(LlmRequest::new(prompt)).await;
        session.finish_generation(result.is_ok());

        match result {
            Ok(response) => {
                info!(
                    "{} generated {} chars ({}/{} used on {})",
                    provider_id,
                    response.content.len(),
                    session.usage_count(),
                    policy.request_limit,
                    policy.tier
                );
                Ok(response.content)
            }
            Err(e) => Err(CopyError::GenerationFailed {
                provider: provider_id,
                message: e.to_string(),
            }),
        }
    }

    fn build(
        &self,
        provider_id: ProviderId,
        route: Route,
        api_key: &str,
    ) -> Result<Box<dyn LlmProvider>, CopyError> {
        let backing = route.backing();
        let inner = self
            .factory
            .provider(backing, api_key)
            .map_err(|e| match e {
                LlmError::MissingApiKey { .. } => CopyError::MissingCredential {
                    provider: provider_id,
                    backing,
                },
                other => CopyError::GenerationFailed {
                    provider: provider_id,
                    message: other.to_string(),
                },
            })?;

        let provider: Box<dyn LlmProvider> = match route {
            Route::Direct(_) => inner,
            Route::Delegated { marker, .. } => {
                Box::new(FallbackProvider::new(inner, marker, "Claude (stand-in)"))
            }
        };
        Ok(provider)
    }
}
