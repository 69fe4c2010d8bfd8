use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::playback::PlaybackMode;

/// Identifies one entry into a page. Callbacks carrying an older token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageToken(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing { page: usize, token: PageToken },
    Completed,
    Stopped,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing { .. })
    }

    /// Page index if `token` belongs to the page currently playing.
    pub fn current(&self, token: PageToken) -> Option<usize> {
        match *self {
            PlaybackState::Playing { page, token: current } if current == token => Some(page),
            _ => None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        match self {
            PlaybackState::Idle => PlaybackStatus::Idle,
            PlaybackState::Playing { .. } => PlaybackStatus::Playing,
            PlaybackState::Completed => PlaybackStatus::Completed,
            PlaybackState::Stopped => PlaybackStatus::Stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Completed,
    Stopped,
}

/// What a UI needs to render the player chrome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub status: PlaybackStatus,
    pub page_index: usize,
    pub page_count: usize,
    pub elapsed: Duration,
    pub recording: bool,
    pub language: String,
    pub mode: PlaybackMode,
    pub script_id: String,
    pub session: Option<Uuid>,
}

impl PlayerSnapshot {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }
}
