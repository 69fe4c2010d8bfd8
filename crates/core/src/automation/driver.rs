use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    automation::{completion_deadline, expected_runtime},
    config::{AutomationConfig, PlaybackConfig},
    playback::{PlaybackError, PlayerHandle, SignalBoard},
    recording::{RecordingError, RecordingEvent},
    timeline::PageTimeline,
};

#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("Recording did not finalize within {0:?}")]
    FinalizeTimeout(Duration),

    #[error("Recorder went away before delivering the recording")]
    RecorderClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverProgress {
    pub page: usize,
    pub page_count: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct DriverReport {
    pub page_count: usize,
    pub last_page: usize,
    pub completed: bool,
    pub timed_out: bool,
    pub deadline: Duration,
    pub elapsed: Duration,
    pub artifact: Option<PathBuf>,
    pub artifact_bytes: usize,
}

/// Runs a player to completion without a human and collects its recording.
pub struct AutomationDriver {
    config: AutomationConfig,
    playback: PlaybackConfig,
    output_dir: PathBuf,
}

impl AutomationDriver {
    pub fn new(config: AutomationConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            playback: PlaybackConfig::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Timings the player was built with, used to predict the runtime.
    pub fn playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }

    /// Play `timeline` through `player`, polling `signals` until it reports
    /// completion or the deadline passes. A missed deadline buys one more
    /// deadline-long wait before the player is stopped. With `recording` set,
    /// playback starts with capture and the finished artifact is written to
    /// the output dir.
    pub async fn run(
        &self,
        player: &PlayerHandle,
        signals: &SignalBoard,
        timeline: &PageTimeline,
        recording: Option<&mut mpsc::UnboundedReceiver<RecordingEvent>>,
        mut on_progress: impl FnMut(DriverProgress),
    ) -> Result<DriverReport, DriverError> {
        let started = Instant::now();
        let page_count = timeline.len();
        let expected = expected_runtime(timeline, &self.playback, recording.is_some());
        let deadline = completion_deadline(expected, self.config.buffer(), self.config.max_wait());

        if recording.is_some() {
            player.play_and_record().await?;
        } else {
            player.play().await?;
        }
        info!(
            pages = page_count,
            expected_secs = expected.as_secs_f64(),
            deadline_secs = deadline.as_secs_f64(),
            "automated playback started"
        );

        let last_page_time = timeline
            .pages()
            .last()
            .map(|p| p.duration)
            .unwrap_or_default();

        let wait = async {
            let mut last_page = 0;
            let mut ticker = tokio::time::interval(self.config.poll_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_page_reached: Option<Instant> = None;

            loop {
                ticker.tick().await;
                let page = signals.current_page();
                if page != last_page {
                    last_page = page;
                    on_progress(DriverProgress {
                        page,
                        page_count,
                        elapsed: started.elapsed(),
                    });
                }

                if signals.playback_completed() {
                    break;
                }
                // last page is on screen, wait out its duration before calling it done
                if page >= page_count {
                    let reached = *last_page_reached.get_or_insert_with(Instant::now);
                    let settle = last_page_time.saturating_add(self.config.poll_interval());
                    if reached.elapsed() >= settle {
                        break;
                    }
                }
            }
        };

        tokio::pin!(wait);

        let timed_out = tokio::time::timeout(deadline, &mut wait).await.is_err();
        if timed_out {
            warn!(
                deadline_secs = deadline.as_secs_f64(),
                page = signals.current_page(),
                "playback did not complete before the deadline, waiting out the expected runtime"
            );
            if tokio::time::timeout(deadline, &mut wait).await.is_err() {
                warn!(page = signals.current_page(), "playback still running, stopping it");
            }
        }

        tokio::time::sleep(self.config.tail()).await;
        let completed = signals.playback_completed();
        player.stop().await?;

        let mut report = DriverReport {
            page_count,
            last_page: signals.current_page(),
            completed,
            timed_out,
            deadline,
            elapsed: started.elapsed(),
            artifact: None,
            artifact_bytes: 0,
        };

        if let Some(events) = recording {
            let finalize = self.config.finalize_timeout();
            let event = tokio::time::timeout(finalize, events.recv())
                .await
                .map_err(|_| DriverError::FinalizeTimeout(finalize))?;

            match event {
                Some(RecordingEvent::Completed(artifact)) => {
                    if artifact.is_empty() {
                        warn!("recording finished without any data");
                    }
                    let path = artifact.save_to(&self.output_dir).await?;
                    info!(path = %path.display(), bytes = artifact.len(), "recording saved");
                    report.artifact_bytes = artifact.len();
                    report.artifact = Some(path);
                }
                Some(RecordingEvent::Failed(e)) => return Err(e.into()),
                None => return Err(DriverError::RecorderClosed),
            }
        }

        Ok(report)
    }
}
