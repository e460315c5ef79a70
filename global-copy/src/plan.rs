//! Plan tiers, providers and the per-tier policy table.

use llm_client::ProviderKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix put on text generated on behalf of a provider that isn't integrated.
pub const FALLBACK_MARKER: &str = "[Claude unavailable - generated with Gemini]\n\n";

/// Entitlement level bounding request quota and provider access
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Master,
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlanTier::Free => "Free",
            PlanTier::Pro => "Pro",
            PlanTier::Master => "Master",
        })
    }
}

/// Text-generation service a user can pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Gemini,
    OpenAi,
    Claude,
}

/// How a provider's requests are actually served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Sent straight to the backing API
    Direct(ProviderKind),
    /// Not integrated; answered by `via` and prefixed with `marker`
    Delegated {
        via: ProviderKind,
        marker: &'static str,
    },
}

impl Route {
    /// The API that receives the request, and therefore whose credential is needed
    pub fn backing(&self) -> ProviderKind {
        match self {
            Route::Direct(kind) => *kind,
            Route::Delegated { via, .. } => *via,
        }
    }
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::Gemini, ProviderId::OpenAi, ProviderId::Claude];

    pub fn route(&self) -> Route {
        match self {
            ProviderId::Gemini => Route::Direct(ProviderKind::Gemini),
            ProviderId::OpenAi => Route::Direct(ProviderKind::OpenAi),
            ProviderId::Claude => Route::Delegated {
                via: ProviderKind::Gemini,
                marker: FALLBACK_MARKER,
            },
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderId::Gemini => "Gemini",
            ProviderId::OpenAi => "OpenAI",
            ProviderId::Claude => "Claude",
        })
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderId::Gemini),
            "openai" | "open-ai" | "gpt" => Ok(ProviderId::OpenAi),
            "claude" | "anthropic" => Ok(ProviderId::Claude),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Limits and provider access for a plan tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPolicy {
    pub tier: PlanTier,
    /// Generations allowed per session
    pub request_limit: u32,
    pub allowed_providers: &'static [ProviderId],
    /// Shown after login
    pub message: &'static str,
}

impl PlanPolicy {
    /// Get the policy for a tier.
    ///
    /// | Tier   | Requests | Providers               |
    /// |--------|----------|-------------------------|
    /// | Free   | 3        | Gemini                  |
    /// | Pro    | 100      | Gemini, OpenAI          |
    /// | Master | 1000     | Gemini, OpenAI, Claude  |
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free => Self {
                tier,
                request_limit: 3,
                allowed_providers: &[ProviderId::Gemini],
                message: "Free plan: 3 generations per session with Gemini. Upgrade to unlock more.",
            },
            PlanTier::Pro => Self {
                tier,
                request_limit: 100,
                allowed_providers: &[ProviderId::Gemini, ProviderId::OpenAi],
                message: "Pro plan: 100 generations per session with Gemini and OpenAI.",
            },
            PlanTier::Master => Self {
                tier,
                request_limit: 1000,
                allowed_providers: &ProviderId::ALL,
                message: "Master plan: 1000 generations per session with every provider.",
            },
        }
    }

    pub fn allows(&self, provider: ProviderId) -> bool {
        self.allowed_providers.contains(&provider)
    }

    /// True once `used` generations leave no room for another.
    pub fn quota_reached(&self, used: u32) -> bool {
        used >= self.request_limit
    }

    pub fn remaining(&self, used: u32) -> u32 {
        self.request_limit.saturating_sub(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_policy() {
        let policy = PlanPolicy::for_tier(PlanTier::Free);
        assert_eq!(policy.request_limit, 3);
        assert!(policy.allows(ProviderId::Gemini));
        assert!(!policy.allows(ProviderId::OpenAi));
        assert!(!policy.allows(ProviderId::Claude));
    }

    #[test]
    fn test_tiers_only_widen_access() {
        let tiers = [PlanTier::Free, PlanTier::Pro, PlanTier::Master];
        for pair in tiers.windows(2) {
            let lower = PlanPolicy::for_tier(pair[0]);
            let higher = PlanPolicy::for_tier(pair[1]);
            assert!(higher.request_limit > lower.request_limit);
            assert!(lower.allowed_providers.iter().all(|p| higher.allows(*p)));
        }
    }

    #[test]
    fn test_quota_reached() {
        let policy = PlanPolicy::for_tier(PlanTier::Free);
        assert!(!policy.quota_reached(2));
        assert!(policy.quota_reached(3));
        assert!(policy.quota_reached(4));
        assert_eq!(policy.remaining(1), 2);
        assert_eq!(policy.remaining(5), 0);
    }

    #[test]
    fn test_claude_is_delegated_to_gemini() {
        match ProviderId::Claude.route() {
            Route::Delegated { via, marker } => {
                assert_eq!(via, ProviderKind::Gemini);
                assert_eq!(marker, FALLBACK_MARKER);
            }
            Route::Direct(_) => panic!("Claude has no direct integration"),
        }
        assert_eq!(ProviderId::Claude.route().backing(), ProviderKind::Gemini);
        assert_eq!(ProviderId::OpenAi.route().backing(), ProviderKind::OpenAi);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Claude".parse::<ProviderId>().unwrap(), ProviderId::Claude);
        assert_eq!("openai".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert!("mistral".parse::<ProviderId>().is_err());
        assert!(PlanTier::Master > PlanTier::Pro);
    }
}
