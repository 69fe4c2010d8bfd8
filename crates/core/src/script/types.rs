use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_language() -> String {
    "zh-CN".to_string()
}

/// A whole presentation: ordered sections plus the narration language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default)]
    pub layout: Layout,
    /// Narration text read aloud while the section is on screen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_srt: Option<String>,
    /// Explicit on-screen time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustration: Option<String>,
    #[serde(rename = "chartPath", default, skip_serializing_if = "Option::is_none")]
    pub chart_path: Option<String>,
    #[serde(rename = "chartConfig", default, skip_serializing_if = "Option::is_none")]
    pub chart_config: Option<Value>,
}

impl Section {
    pub fn narration(&self) -> &str {
        self.read_srt.as_deref().unwrap_or("").trim()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Renderable payload, opaque to the player
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showtime: Option<f64>,
    /// Older scripts spell `showtime` as `duration`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(rename = "audioFile", default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
}

impl ContentItem {
    pub fn show_time(&self) -> Option<f64> {
        self.showtime.or(self.duration)
    }
}

/// Background decoration drawn behind a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientEffect {
    None,
    DotGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Layout {
    #[serde(rename = "cover")]
    Cover,
    #[serde(rename = "chart")]
    Chart,
    #[serde(rename = "two_cols", alias = "two-column")]
    TwoColumns,
    #[serde(rename = "one_col", alias = "one-column")]
    OneColumn,
    #[serde(rename = "multiline-type", alias = "typewriter-multiline")]
    MultilineType,
    #[serde(rename = "floating-lines")]
    FloatingLines,
    #[default]
    #[serde(rename = "footage-placeholder")]
    FootagePlaceholder,
}

impl Layout {
    pub const ALL: [Layout; 7] = [
        Layout::Cover,
        Layout::Chart,
        Layout::TwoColumns,
        Layout::OneColumn,
        Layout::MultilineType,
        Layout::FloatingLines,
        Layout::FootagePlaceholder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Cover => "cover",
            Layout::Chart => "chart",
            Layout::TwoColumns => "two_cols",
            Layout::OneColumn => "one_col",
            Layout::MultilineType => "multiline-type",
            Layout::FloatingLines => "floating-lines",
            Layout::FootagePlaceholder => "footage-placeholder",
        }
    }

    /// Parse a layout name, accepting the long-form aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "two-column" => Some(Layout::TwoColumns),
            "one-column" => Some(Layout::OneColumn),
            "typewriter-multiline" => Some(Layout::MultilineType),
            other => Self::ALL.into_iter().find(|l| l.as_str() == other),
        }
    }

    /// Layouts that render nothing without content items.
    pub fn requires_content(&self) -> bool {
        matches!(
            self,
            Layout::TwoColumns | Layout::OneColumn | Layout::MultilineType | Layout::FloatingLines
        )
    }

    pub fn ambient_effect(&self) -> AmbientEffect {
        match self {
            Layout::Chart => AmbientEffect::None,
            _ => AmbientEffect::DotGrid,
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
