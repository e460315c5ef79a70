//! Generation requests and the instruction sent to the model.

use std::fmt;
use std::str::FromStr;

use crate::plan::ProviderId;

/// Languages offered by the front end
pub const LANGUAGES: &[&str] = &[
    "English",
    "Portuguese",
    "Spanish",
    "French",
    "German",
    "Hindi",
    "Mandarin",
    "Japanese",
];

/// Target audiences offered by the front end
pub const REGIONS: &[&str] = &[
    "USA - New York (Corporate)",
    "USA - Texas (Friendly)",
    "USA - Gen Z (TikTok)",
    "Brazil - SP (Business)",
    "Brazil - Rio (Casual)",
    "Brazil - General",
    "Portugal - Lisbon",
    "Spain - Madrid",
    "India - Tech/Business",
    "China - Business",
];

/// Tone of voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    SalesPersuasive,
    ViralFunny,
    Professional,
    Storytelling,
}

impl Tone {
    pub const ALL: [Tone; 4] = [
        Tone::SalesPersuasive,
        Tone::ViralFunny,
        Tone::Professional,
        Tone::Storytelling,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tone::SalesPersuasive => "Sales/Persuasive",
            Tone::ViralFunny => "Viral/Funny",
            Tone::Professional => "Professional",
            Tone::Storytelling => "Storytelling",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = String;

    /// Accepts the label ("Viral/Funny") or a short form ("viral", "funny")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Tone::ALL
            .into_iter()
            .find(|tone| {
                let label = tone.label().to_lowercase();
                label == wanted || label.split('/').any(|part| part == wanted)
            })
            .ok_or_else(|| format!("Unknown tone: {}", s))
    }
}

/// One submission from the form. Not persisted.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub product: String,
    pub target_language: String,
    pub target_region: String,
    pub tone: Tone,
    pub provider: ProviderId,
}

impl GenerationRequest {
    /// The single instruction forwarded verbatim to the provider
    pub fn to_prompt(&self) -> String {
        format!(
            "Act as a native expert copywriter from {region}.\n\
             Task: Write a sales copy for: {product}.\n\
             Language: {language} (Native level).\n\
             Tone: {tone}.\n\
             Context: Use local slang, idioms and cultural references from {region}.",
            region = self.target_region,
            product = self.product.trim(),
            language = self.target_language,
            tone = self.tone,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            product: "  handmade leather wallets ".to_string(),
            target_language: "Portuguese".to_string(),
            target_region: "Brazil - Rio (Casual)".to_string(),
            tone: Tone::ViralFunny,
            provider: ProviderId::Gemini,
        }
    }

    #[test]
    fn test_prompt_embeds_every_field() {
        let prompt = request().to_prompt();
        assert!(prompt.starts_with("Act as a native expert copywriter from Brazil - Rio (Casual)."));
        assert!(prompt.contains("Task: Write a sales copy for: handmade leather wallets."));
        assert!(prompt.contains("Language: Portuguese (Native level)."));
        assert!(prompt.contains("Tone: Viral/Funny."));
        assert!(prompt.ends_with("cultural references from Brazil - Rio (Casual)."));
    }

    #[test]
    fn test_tone_parsing() {
        assert_eq!("Viral/Funny".parse::<Tone>().unwrap(), Tone::ViralFunny);
        assert_eq!("funny".parse::<Tone>().unwrap(), Tone::ViralFunny);
        assert_eq!("SALES".parse::<Tone>().unwrap(), Tone::SalesPersuasive);
        assert_eq!("storytelling".parse::<Tone>().unwrap(), Tone::Storytelling);
        assert!("grumpy".parse::<Tone>().is_err());
    }
}
