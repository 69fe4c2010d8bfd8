use std::time::Duration;

use crate::{config::PlaybackConfig, timeline::PageTimeline};

/// Wall time an automated run should take: every page's duration plus the
/// settle delay before each page, and the capture warm-up when recording.
pub fn expected_runtime(
    timeline: &PageTimeline,
    playback: &PlaybackConfig,
    recording: bool,
) -> Duration {
    let pages = u32::try_from(timeline.len()).unwrap_or(u32::MAX);
    let settles = playback.settle_delay().saturating_mul(pages);
    let warmup = if recording {
        playback.recording_settle()
    } else {
        Duration::ZERO
    };
    timeline
        .total_duration()
        .saturating_add(settles)
        .saturating_add(warmup)
}

/// How long the driver waits for completion before falling back:
/// the expected runtime plus `buffer`, capped at `ceiling`.
pub fn completion_deadline(expected: Duration, buffer: Duration, ceiling: Duration) -> Duration {
    expected.saturating_add(buffer).min(ceiling)
}
