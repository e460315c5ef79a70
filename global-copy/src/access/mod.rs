//! Email allow-list access gate with plan assignment.

mod allow_list;
mod gate;

pub use allow_list::{AllowListError, AllowListSource, CachedAllowList, SheetAllowList, StaticAllowList};
pub use gate::{AccessGate, Admission, DegradePolicy, PlanRule};

/// Canonical form used for every comparison: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
