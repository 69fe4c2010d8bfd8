use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub name: String,
    /// BCP-47-ish tag, e.g. `en-US` or `zh_CN`
    pub language: String,
    pub is_default: bool,
}

impl Voice {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            is_default: false,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Pick a voice for `language`: an exact tag match, then any voice sharing
/// the primary language subtag, then the backend default. `None` means the
/// synthesizer should use whatever the system picks.
pub fn select_voice<'a>(voices: &'a [Voice], language: &str) -> Option<&'a Voice> {
    let wanted = normalize(language);
    let wanted_primary = primary_subtag(&wanted);

    voices
        .iter()
        .find(|v| normalize(&v.language) == wanted)
        .or_else(|| {
            voices
                .iter()
                .find(|v| primary_subtag(&normalize(&v.language)) == wanted_primary)
        })
        .or_else(|| voices.iter().find(|v| v.is_default))
}
