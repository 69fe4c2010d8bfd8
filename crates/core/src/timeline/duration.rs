use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::script::Section;

/// How page durations are estimated when a script does not state them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationPolicy {
    pub per_char_secs: f64,
    pub min_secs: f64,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            per_char_secs: 0.1,
            min_secs: 2.0,
        }
    }
}

/// Which rule produced a page's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DurationSource {
    Explicit,
    Showtime,
    Estimated,
}

impl DurationSource {
    pub fn label(&self) -> &'static str {
        match self {
            DurationSource::Explicit => "explicit",
            DurationSource::Showtime => "showtime",
            DurationSource::Estimated => "estimated",
        }
    }
}

fn positive_secs(value: f64) -> Option<Duration> {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value).ok()
    } else {
        None
    }
}

/// Derive the on-screen time of a section.
///
/// An explicit positive `duration` wins, then the sum of item show-times,
/// then `max(min_secs, chars * per_char_secs)` over the narration text.
pub fn effective_duration(section: &Section, policy: &DurationPolicy) -> (Duration, DurationSource) {
    if let Some(explicit) = section.duration.and_then(positive_secs) {
        return (explicit, DurationSource::Explicit);
    }

    let showtime: f64 = section
        .content
        .iter()
        .filter_map(|item| item.show_time())
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .sum();
    if let Some(total) = positive_secs(showtime) {
        return (total, DurationSource::Showtime);
    }

    let chars = section.narration().chars().count() as f64;
    let estimate = (chars * policy.per_char_secs).max(policy.min_secs);
    let duration = positive_secs(estimate).unwrap_or(Duration::ZERO);
    (duration, DurationSource::Estimated)
}
