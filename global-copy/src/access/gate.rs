//! Access gate: admission decision and plan assignment for an email.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::allow_list::{AllowListError, AllowListSource};
use super::normalize_email;
use crate::error::CopyError;
use crate::plan::PlanTier;
use crate::session::{Session, SessionState};

/// What to do when the allow-list can't be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DegradePolicy {
    /// Admit anything that looks like an email (contains '@').
    /// Bootstrap behaviour: trades security for availability.
    #[default]
    Open,
    /// Deny everyone until the source is back
    Closed,
}

/// Emails ending in `suffix` get `plan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRule {
    pub suffix: String,
    pub plan: PlanTier,
}

impl PlanRule {
    pub fn new(suffix: &str, plan: PlanTier) -> Self {
        Self {
            suffix: suffix.to_string(),
            plan,
        }
    }

    fn matches(&self, email: &str) -> bool {
        email.ends_with(&normalize_email(&self.suffix))
    }
}

/// Result of `AccessGate::admit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Normalized email
    pub email: String,
    pub admitted: bool,
    pub plan: PlanTier,
    /// True when the decision came from the degrade policy, not the allow-list
    pub degraded: bool,
}

pub struct AccessGate {
    source: Box<dyn AllowListSource>,
    degrade_policy: DegradePolicy,
    plan_rules: Vec<PlanRule>,
    upgrade_url: String,
}

impl AccessGate {
    pub fn new(
        source: Box<dyn AllowListSource>,
        degrade_policy: DegradePolicy,
        plan_rules: Vec<PlanRule>,
        upgrade_url: &str,
    ) -> Self {
        Self {
            source,
            degrade_policy,
            plan_rules,
            upgrade_url: upgrade_url.to_string(),
        }
    }

    /// Decide whether `email` may use the tool and which plan it gets.
    pub async fn admit(&self, email: &str) -> Admission {
        let email = normalize_email(email);
        let plan = self.plan_for(&email);

        let (admitted, degraded) = match self.source.lookup(&email).await {
            Ok(()) => (true, false),
            Err(AllowListError::NotFound) => (false, false),
            Err(AllowListError::SourceUnavailable(reason)) => {
                let admitted = match self.degrade_policy {
                    DegradePolicy::Open => email.contains('@'),
                    DegradePolicy::Closed => false,
                };
                warn!(
                    "Allow-list unavailable ({}); degrade policy {:?} {} {}",
                    reason,
                    self.degrade_policy,
                    if admitted { "admits" } else { "denies" },
                    email
                );
                (admitted, true)
            }
        };

        Admission {
            email,
            admitted,
            plan,
            degraded,
        }
    }

    /// Admit `email` and, if allowed, start a fresh session for it.
    pub async fn log_in(&self, session: &mut Session, email: &str) -> Result<Admission, CopyError> {
        let admission = self.admit(email).await;

        if !admission.admitted {
            return Err(CopyError::AccessDenied {
                email: admission.email,
                upgrade_url: self.upgrade_url.clone(),
            });
        }

        if session.state() != SessionState::LoggedOut {
            debug!("Replacing the session of {}", session.email());
        }
        session.log_in(&admission.email, admission.plan);
        info!("Logged in {} on the {} plan", admission.email, admission.plan);
        Ok(admission)
    }

    /// First matching suffix rule wins; everyone else is on Free.
    pub fn plan_for(&self, email: &str) -> PlanTier {
        let email = normalize_email(email);
        self.plan_rules
            .iter()
            .find(|rule| rule.matches(&email))
            .map(|rule| rule.plan)
            .unwrap_or(PlanTier::Free)
    }
}
