mod access;
mod config;
mod console;
mod error;
mod llm;
mod plan;
mod prompt;
mod router;
mod session;

use access::{AccessGate, AllowListSource, CachedAllowList, DegradePolicy, SheetAllowList, StaticAllowList};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use console::{App, Console, Selection};
use llm::{ConfiguredProviders, stored_credentials};
use llm_client::ProviderKind;
use plan::ProviderId;
use prompt::Tone;
use router::GenerationRouter;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "global-copy",
    about = "Sell like a local anywhere in the world",
    long_about = "Generates localized sales copy with hosted LLMs. Access is checked against the purchase list."
)]
#[command(version)]
struct Args {
    /// Purchase email (asked for when omitted)
    #[arg(short, long)]
    email: Option<String>,

    /// Provider to use for every request: gemini, openai or claude
    #[arg(short, long)]
    provider: Option<ProviderId>,

    /// Target language (asked for when omitted)
    #[arg(short, long)]
    language: Option<String>,

    /// Target country/region (asked for when omitted)
    #[arg(short, long)]
    region: Option<String>,

    /// Tone of voice: sales, viral, professional or storytelling
    #[arg(short, long)]
    tone: Option<Tone>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Configuration subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Set the Google Sheets document holding the purchase list
    SetSheet {
        /// Document id from the sheet URL
        sheet_id: String,
    },
    /// Set the purchase page URL
    SetUpgradeUrl { url: String },
    /// Set the model for a provider
    SetModel {
        /// Provider (gemini, openai)
        provider: ProviderKind,
        /// Model identifier
        model: String,
    },
    /// What to do when the purchase list can't be read (open, closed)
    SetDegradePolicy { policy: String },
}

/// Handle config subcommands
fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = AppConfig::load()?;
            println!("Config file: {}", AppConfig::config_path()?.display());
            println!();
            let mut shown = config.clone();
            for provider in shown.providers.values_mut() {
                if provider.api_key.is_some() {
                    provider.api_key = Some("(set)".to_string());
                }
            }
            println!("{}", toml::to_string_pretty(&shown)?);
        }
        ConfigAction::Path => {
            println!("{}", AppConfig::config_path()?.display());
        }
        ConfigAction::SetSheet { sheet_id } => {
            let mut config = AppConfig::load()?;
            config.allow_list.sheet_id = Some(sheet_id.clone());
            config.save()?;
            println!("Purchase list sheet set to: {}", sheet_id);
        }
        ConfigAction::SetUpgradeUrl { url } => {
            let mut config = AppConfig::load()?;
            config.upgrade_url = url.clone();
            config.save()?;
            println!("Upgrade URL set to: {}", url);
        }
        ConfigAction::SetModel { provider, model } => {
            let mut config = AppConfig::load()?;
            config.provider_config_mut(*provider).model = Some(model.clone());
            config.save()?;
            println!("{} model set to: {}", provider.display_name(), model);
        }
        ConfigAction::SetDegradePolicy { policy } => {
            let policy = match policy.trim().to_lowercase().as_str() {
                "open" => DegradePolicy::Open,
                "closed" => DegradePolicy::Closed,
                other => anyhow::bail!("Unknown degrade policy '{}'. Use 'open' or 'closed'.", other),
            };
            let mut config = AppConfig::load()?;
            config.allow_list.degrade_policy = policy;
            config.save()?;
            println!("Degrade policy set to: {:?}", policy);
        }
    }
    Ok(())
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn build_gate(config: &AppConfig) -> Result<AccessGate> {
    let allow_list = &config.allow_list;
    if allow_list.sheet_id.is_none() && !allow_list.emails.is_empty() {
        log::debug!("Using the inline purchase list ({} entries)", allow_list.emails.len());
        let source: Box<dyn AllowListSource> = Box::new(StaticAllowList::new(&allow_list.emails));
        return Ok(AccessGate::new(
            source,
            allow_list.degrade_policy,
            config.plan_rules.clone(),
            &config.upgrade_url,
        ));
    }

    let mut sheet = SheetAllowList::new(
        allow_list.sheet_id.clone(),
        &allow_list.worksheet,
        &allow_list.email_column,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("Failed to set up the purchase list")?;
    if let Some(url) = &allow_list.base_url {
        sheet = sheet.with_base_url(url);
    }

    let source = CachedAllowList::new(sheet, Duration::from_secs(allow_list.cache_ttl_secs));
    Ok(AccessGate::new(
        Box::new(source),
        allow_list.degrade_policy,
        config.plan_rules.clone(),
        &config.upgrade_url,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Handle config subcommands first (before anything touches the network)
    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let config = AppConfig::load().context("Failed to load configuration")?;
    if config.allow_list.sheet_id.is_none() && config.allow_list.emails.is_empty() {
        log::warn!(
            "No purchase list configured; access follows the {:?} degrade policy",
            config.allow_list.degrade_policy
        );
    }

    let gate = build_gate(&config)?;
    let credentials = stored_credentials(&config);
    let router = GenerationRouter::new(
        Box::new(ConfiguredProviders::new(config.clone())),
        &config.upgrade_url,
    );
    let selection = Selection {
        provider: args.provider,
        language: args.language,
        region: args.region,
        tone: args.tone,
    };

    println!("Global Sales Copy AI");
    println!("Sell like a local anywhere in the world.\n");

    let stdin = std::io::stdin();
    let mut console = Console::new(stdin.lock(), std::io::stdout());
    let mut app = App::new(gate, router, credentials, selection, args.email);
    app.run(&mut console).await
}
