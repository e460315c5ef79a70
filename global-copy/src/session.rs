//! Per-user session state.
//!
//! A `Session` is owned by the front end and passed by reference to whatever
//! needs it. Nothing outlives the process.

use chrono::{DateTime, Utc};

use crate::plan::{PlanPolicy, PlanTier};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Idle,
    Generating,
}

#[derive(Debug, Clone)]
pub struct Session {
    authenticated: bool,
    email: String,
    plan: Option<PlanTier>,
    usage_count: u32,
    generating: bool,
    logged_in_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A logged-out session.
    pub fn new() -> Self {
        Self {
            authenticated: false,
            email: String::new(),
            plan: None,
            usage_count: 0,
            generating: false,
            logged_in_at: None,
        }
    }

    pub fn log_in(&mut self, email: &str, plan: PlanTier) {
        *self = Self {
            authenticated: true,
            email: email.to_string(),
            plan: Some(plan),
            usage_count: 0,
            generating: false,
            logged_in_at: Some(Utc::now()),
        };
    }

    /// Reset to the initial state, whatever state we were in.
    pub fn log_out(&mut self) {
        *self = Self::new();
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn plan(&self) -> Option<PlanTier> {
        self.plan
    }

    pub fn policy(&self) -> Option<PlanPolicy> {
        self.plan.map(PlanPolicy::for_tier)
    }

    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    pub fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        self.logged_in_at
    }

    pub fn state(&self) -> SessionState {
        match (self.authenticated, self.generating) {
            (false, _) => SessionState::LoggedOut,
            (true, false) => SessionState::Idle,
            (true, true) => SessionState::Generating,
        }
    }

    pub(crate) fn begin_generation(&mut self) {
        self.generating = true;
    }

    /// Back to idle; only a successful generation counts against the quota.
    pub(crate) fn finish_generation(&mut self, succeeded: bool) {
        self.generating = false;
        if succeeded {
            self.usage_count += 1;
        }
    }
}
