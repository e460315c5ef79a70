//! global-copy configuration, stored as TOML.

use anyhow::{Context, Result};
use llm_client::{ProviderConfig, ProviderKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::access::{DegradePolicy, PlanRule};
use crate::plan::PlanTier;

const DEFAULT_UPGRADE_URL: &str = "https://gumroad.com/";
const DEFAULT_WORKSHEET: &str = "clientes_vip";
const DEFAULT_CACHE_TTL_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Purchase page shown on denial and when the quota runs out
    #[serde(default = "default_upgrade_url")]
    pub upgrade_url: String,

    /// Timeout for provider and allow-list requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub allow_list: AllowListConfig,

    /// Domain-suffix plan rules, first match wins
    #[serde(default = "default_plan_rules")]
    pub plan_rules: Vec<PlanRule>,

    /// Provider-specific configuration, keyed by provider name (gemini, openai)
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowListConfig {
    /// Google Sheets document id. Without one the allow-list is unavailable
    /// and `degrade_policy` decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<String>,

    /// Inline purchase list, used instead of the sheet when no `sheet_id` is set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,

    #[serde(default = "default_worksheet")]
    pub worksheet: String,

    #[serde(default = "default_email_column")]
    pub email_column: String,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default)]
    pub degrade_policy: DegradePolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_upgrade_url() -> String {
    DEFAULT_UPGRADE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_worksheet() -> String {
    DEFAULT_WORKSHEET.to_string()
}

fn default_email_column() -> String {
    "email".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_plan_rules() -> Vec<PlanRule> {
    vec![PlanRule::new("@globalcopy.ai", PlanTier::Master)]
}

impl Default for AllowListConfig {
    fn default() -> Self {
        Self {
            sheet_id: None,
            emails: Vec::new(),
            worksheet: default_worksheet(),
            email_column: default_email_column(),
            cache_ttl_secs: default_cache_ttl_secs(),
            degrade_policy: DegradePolicy::default(),
            base_url: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upgrade_url: default_upgrade_url(),
            request_timeout_secs: default_request_timeout_secs(),
            allow_list: AllowListConfig::default(),
            plan_rules: default_plan_rules(),
            providers: HashMap::new(),
        }
    }
}

/// Config-file key for a provider
pub fn provider_key(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "gemini",
        ProviderKind::OpenAi => "openai",
    }
}

impl AppConfig {
    /// Get the config file path: ~/.config/global-copy/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("HOME not set")?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("global-copy")
            .join("config.toml"))
    }

    /// Load config from the default location, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Provider config with the global timeout filled in when the provider doesn't set one
    pub fn provider_config(&self, kind: ProviderKind) -> ProviderConfig {
        let mut config = self
            .providers
            .get(provider_key(kind))
            .cloned()
            .unwrap_or_default();
        config.timeout_secs.get_or_insert(self.request_timeout_secs);
        config
    }

    pub fn provider_config_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        self.providers
            .entry(provider_key(kind).to_string())
            .or_default()
    }
}
