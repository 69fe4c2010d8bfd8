use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::script::Layout;

/// One problem found in a script, located by a JSON-ish path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptStats {
    pub total_sections: usize,
    pub layouts: BTreeMap<&'static str, usize>,
    pub content_items: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<Violation>,
    pub warnings: Vec<Violation>,
    pub stats: ScriptStats,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(Violation::new(path, message));
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Violation::new(path, message));
    }
}

/// Check a raw script document and collect every problem, not just the first.
pub fn validate(doc: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(root) = doc.as_object() else {
        report.error("$", "script must be a JSON object");
        return report;
    };

    match root.get("title") {
        Some(Value::String(title)) if !title.trim().is_empty() => {}
        Some(Value::String(_)) => report.error("title", "must not be empty"),
        Some(_) => report.error("title", "must be a string"),
        None => report.error("title", "is required"),
    }

    match root.get("language") {
        Some(Value::String(lang)) if !lang.trim().is_empty() => {}
        Some(_) => report.error("language", "must be a non-empty language tag"),
        None => report.error("language", "is required"),
    }

    let sections = match root.get("sections") {
        Some(Value::Array(sections)) => sections,
        Some(_) => {
            report.error("sections", "must be an array");
            return report;
        }
        None => {
            report.error("sections", "is required");
            return report;
        }
    };

    if sections.is_empty() {
        report.error("sections", "must contain at least one section");
    }

    report.stats.total_sections = sections.len();
    let mut seen_ids = HashSet::new();

    for (index, section) in sections.iter().enumerate() {
        let path = format!("sections[{index}]");
        let Some(section) = section.as_object() else {
            report.error(path, "must be an object");
            continue;
        };
        validate_section(section, &path, &mut seen_ids, &mut report);
    }

    report
}

fn validate_section(
    section: &Map<String, Value>,
    path: &str,
    seen_ids: &mut HashSet<String>,
    report: &mut ValidationReport,
) {
    match section.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => {
            if !seen_ids.insert(id.clone()) {
                report.error(format!("{path}.id"), format!("duplicate section id '{id}'"));
            }
        }
        Some(_) => report.error(format!("{path}.id"), "must be a non-empty string"),
        None => report.error(format!("{path}.id"), "is required"),
    }

    let layout = match section.get("layout") {
        None | Some(Value::Null) => Some(Layout::default()),
        Some(Value::String(name)) => {
            let parsed = Layout::parse(name);
            if parsed.is_none() {
                let valid: Vec<_> = Layout::ALL.iter().map(|l| l.as_str()).collect();
                report.error(
                    format!("{path}.layout"),
                    format!("unknown layout '{name}', expected one of: {}", valid.join(", ")),
                );
            }
            parsed
        }
        Some(_) => {
            report.error(format!("{path}.layout"), "must be a string");
            None
        }
    };

    if let Some(layout) = layout {
        *report.stats.layouts.entry(layout.as_str()).or_default() += 1;
    }

    let narrated = match section.get("read_srt") {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(_) => {
            report.error(format!("{path}.read_srt"), "must be a string");
            false
        }
    };

    let mut timed = false;
    if let Some(duration) = section.get("duration") {
        match duration.as_f64() {
            Some(secs) if secs >= 0.0 => timed = secs > 0.0,
            _ => report.error(format!("{path}.duration"), "must be a non-negative number"),
        }
    }

    if layout == Some(Layout::Chart)
        && section.get("chartPath").is_none()
        && section.get("chartConfig").is_none()
    {
        report.error(path, "chart layout requires chartPath or chartConfig");
    }

    if let Some(illustration) = section.get("illustration")
        && !illustration.is_string()
    {
        report.warn(format!("{path}.illustration"), "should be a string");
    }

    let requires_content = layout.is_some_and(|l| l.requires_content());

    match section.get("content") {
        None | Some(Value::Null) => {
            if requires_content {
                report.error(
                    format!("{path}.content"),
                    format!("is required for layout '{}'", layout.map(|l| l.as_str()).unwrap_or("?")),
                );
            }
        }
        Some(Value::Array(items)) => {
            if items.is_empty() {
                report.warn(format!("{path}.content"), "is empty");
            }
            report.stats.content_items += items.len();
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{path}.content[{index}]");
                timed |= validate_item(item, &item_path, requires_content, report);
            }
        }
        Some(_) => report.error(format!("{path}.content"), "must be an array"),
    }

    if !narrated && !timed {
        report.warn(
            path,
            "has neither narration text nor a duration, the minimum page time applies",
        );
    }
}

/// Returns whether the item contributes a positive show time.
fn validate_item(
    item: &Value,
    path: &str,
    requires_title: bool,
    report: &mut ValidationReport,
) -> bool {
    let Some(item) = item.as_object() else {
        report.error(path, "must be an object");
        return false;
    };

    let mut timed = false;
    for key in ["showtime", "duration"] {
        if let Some(value) = item.get(key) {
            match value.as_f64() {
                Some(secs) if secs >= 0.0 => timed |= secs > 0.0,
                _ => report.error(format!("{path}.{key}"), "must be a non-negative number"),
            }
        }
    }

    if let Some(audio) = item.get("audioFile")
        && !audio.is_string()
    {
        report.error(format!("{path}.audioFile"), "must be a string");
    }

    if requires_title {
        let has_title = item
            .get("data")
            .and_then(|data| data.get("title"))
            .is_some_and(Value::is_string);
        if !has_title {
            report.error(format!("{path}.data.title"), "is required for this layout");
        }
    }

    timed
}
