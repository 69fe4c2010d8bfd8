use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::{
    playback::{NavTarget, PlaybackError, PlayerCommand, PlayerSnapshot, Reply},
    timeline::PageTimeline,
};

/// Cloneable front door to a running orchestrator.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    shutdown_tx: broadcast::Sender<()>,
    snapshot: watch::Receiver<PlayerSnapshot>,
}

impl PlayerHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<PlayerCommand>,
        shutdown_tx: broadcast::Sender<()>,
        snapshot: watch::Receiver<PlayerSnapshot>,
    ) -> Self {
        Self {
            commands,
            shutdown_tx,
            snapshot,
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> PlayerCommand,
    ) -> Result<T, PlaybackError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| PlaybackError::Closed)?;
        response.await.map_err(|_| PlaybackError::Closed)
    }

    pub async fn play(&self) -> Result<(), PlaybackError> {
        self.request(|reply| PlayerCommand::Play {
            record: false,
            reply,
        })
        .await?
    }

    /// Start recording, wait for it to settle, then play from the current page.
    pub async fn play_and_record(&self) -> Result<(), PlaybackError> {
        self.request(|reply| PlayerCommand::Play {
            record: true,
            reply,
        })
        .await?
    }

    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.request(|reply| PlayerCommand::Stop { reply }).await
    }

    pub async fn next(&self) -> Result<usize, PlaybackError> {
        self.navigate(NavTarget::Next).await
    }

    pub async fn previous(&self) -> Result<usize, PlaybackError> {
        self.navigate(NavTarget::Previous).await
    }

    pub async fn go_to(&self, index: usize) -> Result<usize, PlaybackError> {
        self.navigate(NavTarget::Page(index)).await
    }

    /// Returns the page index after navigation; unchanged when out of range.
    pub async fn navigate(&self, target: NavTarget) -> Result<usize, PlaybackError> {
        self.request(|reply| PlayerCommand::Navigate { target, reply })
            .await
    }

    pub async fn set_language(&self, language: impl Into<String>) -> Result<(), PlaybackError> {
        let language = language.into();
        self.request(|reply| PlayerCommand::SetLanguage { language, reply })
            .await?
    }

    pub async fn start_recording(&self) -> Result<(), PlaybackError> {
        self.request(|reply| PlayerCommand::StartRecording { reply })
            .await?
    }

    pub async fn stop_recording(&self) -> Result<(), PlaybackError> {
        self.request(|reply| PlayerCommand::StopRecording { reply })
            .await
    }

    pub async fn load_timeline(&self, timeline: Arc<PageTimeline>) -> Result<(), PlaybackError> {
        self.request(|reply| PlayerCommand::LoadTimeline { timeline, reply })
            .await
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    /// Tear the session down: timers, narration and recording all stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
