use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::{recording::RecordingError, timeline::PageTimeline};

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Playback is already running")]
    AlreadyPlaying,

    #[error("The script has no pages")]
    EmptyTimeline,

    #[error("Narration language cannot change while playing")]
    LanguageLocked,

    #[error("Recording can only be started before playback")]
    RecordingLocked,

    #[error("No recorder is configured")]
    NoRecorder,

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("The player has shut down")]
    Closed,
}

pub type Reply<T> = oneshot::Sender<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Next,
    Previous,
    Page(usize),
}

/// User or automation input to the orchestrator.
#[derive(Debug)]
pub enum PlayerCommand {
    Play {
        record: bool,
        reply: Reply<Result<(), PlaybackError>>,
    },
    Stop {
        reply: Reply<()>,
    },
    Navigate {
        target: NavTarget,
        reply: Reply<usize>,
    },
    SetLanguage {
        language: String,
        reply: Reply<Result<(), PlaybackError>>,
    },
    StartRecording {
        reply: Reply<Result<(), PlaybackError>>,
    },
    StopRecording {
        reply: Reply<()>,
    },
    LoadTimeline {
        timeline: Arc<PageTimeline>,
        reply: Reply<()>,
    },
}
