//! Errors a user can hit while logging in or generating copy.
//!
//! Every variant ends the current attempt only; the session stays usable.

use llm_client::ProviderKind;
use thiserror::Error;

use crate::plan::{PlanTier, ProviderId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CopyError {
    #[error("Access denied for '{email}'. Please check your purchase email. Buy access: {upgrade_url}")]
    AccessDenied { email: String, upgrade_url: String },

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("The {plan} plan allows {limit} generations per session and all have been used. Upgrade: {upgrade_url}")]
    QuotaExceeded {
        plan: PlanTier,
        limit: u32,
        upgrade_url: String,
    },

    #[error("{provider} is not included in the {plan} plan")]
    ProviderNotEntitled { provider: ProviderId, plan: PlanTier },

    #[error("Please enter your {} API key to use {provider}", .backing.display_name())]
    MissingCredential {
        provider: ProviderId,
        backing: ProviderKind,
    },

    #[error("{provider} failed: {message}")]
    GenerationFailed {
        provider: ProviderId,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CopyError::MissingCredential {
            provider: ProviderId::Claude,
            backing: ProviderKind::Gemini,
        };
        assert_eq!(err.to_string(), "Please enter your Gemini API key to use Claude");

        let err = CopyError::ProviderNotEntitled {
            provider: ProviderId::OpenAi,
            plan: PlanTier::Free,
        };
        assert_eq!(err.to_string(), "OpenAI is not included in the Free plan");

        let err = CopyError::QuotaExceeded {
            plan: PlanTier::Free,
            limit: 3,
            upgrade_url: "https://gumroad.com/".to_string(),
        };
        assert!(err.to_string().contains("allows 3 generations"));
    }
}
