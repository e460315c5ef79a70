//! Interactive terminal front end.
//!
//! Login, credential entry and the generate loop. Generic over the reader and
//! writer so the whole flow can be driven from tests.

use anyhow::Result;
use llm_client::ProviderKind;
use std::io::{BufRead, Write};

use crate::access::AccessGate;
use crate::plan::{PlanPolicy, ProviderId};
use crate::prompt::{GenerationRequest, LANGUAGES, REGIONS, Tone};
use crate::router::{Credentials, GenerationRouter};
use crate::session::Session;

/// Form values fixed on the command line; `None` means ask
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub provider: Option<ProviderId>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub tone: Option<Tone>,
}

/// Last values picked, offered as the default next time
#[derive(Debug, Clone)]
struct Defaults {
    provider: Option<ProviderId>,
    language: String,
    region: String,
    tone: Tone,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            provider: None,
            language: LANGUAGES[0].to_string(),
            region: REGIONS[0].to_string(),
            tone: Tone::default(),
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label` and read one trimmed line. `None` on end of input.
    fn ask(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Numbered menu. Enter keeps `default`, a number picks an option, and
    /// anything else is returned as typed.
    fn choose(&mut self, label: &str, options: &[String], default: &str) -> Result<Option<String>> {
        writeln!(self.output, "{}:", label)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, option)?;
        }

        let Some(answer) = self.ask(&format!("{} [{}]: ", label, default))? else {
            return Ok(None);
        };

        if answer.is_empty() {
            return Ok(Some(default.to_string()));
        }
        if let Ok(n) = answer.parse::<usize>() {
            if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
                return Ok(Some(option.clone()));
            }
        }
        Ok(Some(answer))
    }

    fn say(&mut self, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }
}

pub struct App {
    gate: AccessGate,
    router: GenerationRouter,
    stored_credentials: Credentials,
    selection: Selection,
    email: Option<String>,
    defaults: Defaults,
}

impl App {
    pub fn new(
        gate: AccessGate,
        router: GenerationRouter,
        stored_credentials: Credentials,
        selection: Selection,
        email: Option<String>,
    ) -> Self {
        Self {
            gate,
            router,
            stored_credentials,
            selection,
            email,
            defaults: Defaults::default(),
        }
    }

    /// Run until `:quit` or end of input.
    pub async fn run<R: BufRead, W: Write>(&mut self, console: &mut Console<R, W>) -> Result<()> {
        let mut session = Session::new();
        let mut credentials = self.stored_credentials.clone();

        loop {
            if !session.is_authenticated() {
                let email = match self.email.take() {
                    Some(email) => email,
                    None => match console.ask("Enter your purchase email (:quit to exit): ")? {
                        Some(email) => email,
                        None => return Ok(()),
                    },
                };

                match email.as_str() {
                    "" => continue,
                    ":quit" => return Ok(()),
                    _ => {}
                }

                let admission = match self.gate.log_in(&mut session, &email).await {
                    Ok(admission) => admission,
                    Err(e) => {
                        console.say(e)?;
                        continue;
                    }
                };

                let policy = PlanPolicy::for_tier(admission.plan);
                console.say(format!("Welcome, {}! {}", admission.email, policy.message))?;
                if admission.degraded {
                    console.say("Note: the access list could not be checked; access was granted by fallback.")?;
                }

                credentials = self.stored_credentials.clone();
                if !self.ask_credentials(console, &policy, &mut credentials)? {
                    return Ok(());
                }
            }

            let Some(line) = console.ask("\nWhat are you selling? (:status, :logout, :quit): ")? else {
                return Ok(());
            };

            match line.as_str() {
                "" => continue,
                ":quit" => return Ok(()),
                ":logout" => {
                    session.log_out();
                    console.say("Logged out.")?;
                    continue;
                }
                ":status" => {
                    if let Some(policy) = session.policy() {
                        let since = session
                            .logged_in_at()
                            .map(|t| t.format(" (logged in %H:%M UTC)").to_string())
                            .unwrap_or_default();
                        console.say(format!(
                            "{} on the {} plan{}: {} of {} generations left.",
                            session.email(),
                            policy.tier,
                            since,
                            policy.remaining(session.usage_count()),
                            policy.request_limit
                        ))?;
                    }
                    continue;
                }
                _ => {}
            }

            let policy = match self.router.check_quota(&session) {
                Ok(policy) => policy,
                Err(e) => {
                    console.say(format!("Error: {}", e))?;
                    continue;
                }
            };
            let Some(request) = self.ask_request(console, &policy, line)? else {
                return Ok(());
            };

            console.say("Translating culture...")?;
            match self.router.generate(&mut session, &credentials, &request).await {
                Ok(text) => {
                    console.say(format!("\nResult:\n{}\n", text))?;
                    console.say(format!(
                        "{} of {} generations left.",
                        policy.remaining(session.usage_count()),
                        policy.request_limit
                    ))?;
                }
                Err(e) => console.say(format!("Error: {}", e))?,
            }
        }
    }

    /// Ask for any key the plan's providers need that isn't stored already.
    /// Returns false on end of input.
    fn ask_credentials<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        policy: &PlanPolicy,
        credentials: &mut Credentials,
    ) -> Result<bool> {
        let mut needed: Vec<ProviderKind> = Vec::new();
        for provider in policy.allowed_providers {
            let backing = provider.route().backing();
            if !needed.contains(&backing) {
                needed.push(backing);
            }
        }

        for kind in needed {
            if credentials.get(kind).is_some() {
                continue;
            }
            let hint = match kind {
                ProviderKind::Gemini => "get it free: aistudio.google.com",
                ProviderKind::OpenAi => "platform.openai.com/api-keys",
            };
            let label = format!("{} API key ({}; Enter to skip): ", kind.display_name(), hint);
            match console.ask(&label)? {
                Some(key) => credentials.set(kind, &key),
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Fill in the rest of the form. `None` on end of input.
    fn ask_request<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
        policy: &PlanPolicy,
        product: String,
    ) -> Result<Option<GenerationRequest>> {
        let provider = match self.selection.provider {
            Some(provider) => provider,
            None if policy.allowed_providers.len() == 1 => policy.allowed_providers[0],
            None => {
                let options: Vec<String> =
                    policy.allowed_providers.iter().map(|p| p.to_string()).collect();
                let default = self
                    .defaults
                    .provider
                    .filter(|p| policy.allows(*p))
                    .unwrap_or(policy.allowed_providers[0]);
                let Some(answer) = console.choose("Provider", &options, &default.to_string())? else {
                    return Ok(None);
                };
                match answer.parse::<ProviderId>() {
                    Ok(provider) => provider,
                    Err(e) => {
                        console.say(format!("{}; using {}", e, default))?;
                        default
                    }
                }
            }
        };

        let language = match &self.selection.language {
            Some(language) => language.clone(),
            None => {
                let options: Vec<String> = LANGUAGES.iter().map(|s| s.to_string()).collect();
                let default = self.defaults.language.clone();
                match console.choose("Target Language", &options, &default)? {
                    Some(language) => language,
                    None => return Ok(None),
                }
            }
        };

        let region = match &self.selection.region {
            Some(region) => region.clone(),
            None => {
                let options: Vec<String> = REGIONS.iter().map(|s| s.to_string()).collect();
                let default = self.defaults.region.clone();
                match console.choose("Target Country/Region", &options, &default)? {
                    Some(region) => region,
                    None => return Ok(None),
                }
            }
        };

        let tone = match self.selection.tone {
            Some(tone) => tone,
            None => {
                let options: Vec<String> = Tone::ALL.iter().map(|t| t.to_string()).collect();
                let default = self.defaults.tone;
                let Some(answer) = console.choose("Tone of Voice", &options, default.label())? else {
                    return Ok(None);
                };
                match answer.parse::<Tone>() {
                    Ok(tone) => tone,
                    Err(e) => {
                        console.say(format!("{}; using {}", e, default))?;
                        default
                    }
                }
            }
        };

        self.defaults = Defaults {
            provider: Some(provider),
            language: language.clone(),
            region: region.clone(),
            tone,
        };

        Ok(Some(GenerationRequest {
            product,
            target_language: language,
            target_region: region,
            tone,
            provider,
        }))
    }
}
