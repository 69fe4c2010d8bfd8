use std::time::Duration;

use crate::{script::ValidationReport, timeline::PageTimeline};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

pub fn format_duration(d: Duration) -> String {
    // round in integer units so the seconds field never reads 60
    let tenths = (d.as_millis() + 50) / 100;
    if tenths < 600 {
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        let secs = (d.as_millis() + 500) / 1000;
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

/// One line per page: number, start offset, duration and its source, layout, narration.
pub fn format_timeline(timeline: &PageTimeline) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "# {} ({}, {} pages, {})\n\n",
        timeline.title(),
        timeline.language(),
        timeline.len(),
        format_duration(timeline.total_duration())
    ));

    let mut offset = 0.0;
    for page in timeline.pages() {
        output.push_str(&format!(
            "{:>3}  [{}]  {:>6}  {:<9}  {:<19}  {}\n",
            page.number(),
            format_timestamp(offset),
            format_duration(page.duration),
            page.duration_source.label(),
            page.layout().as_str(),
            truncate(&page.narration, 48)
        ));
        offset += page.duration.as_secs_f64();
    }

    output
}

pub fn format_validation_report(report: &ValidationReport) -> String {
    let mut output = String::new();

    for error in &report.errors {
        output.push_str(&format!("error: {error}\n"));
    }
    for warning in &report.warnings {
        output.push_str(&format!("warning: {warning}\n"));
    }

    let layouts = report
        .stats
        .layouts
        .iter()
        .map(|(layout, count)| format!("{layout}={count}"))
        .collect::<Vec<_>>()
        .join(", ");
    output.push_str(&format!(
        "{} sections, {} content items ({})\n",
        report.stats.total_sections, report.stats.content_items, layouts
    ));

    output
}
