use std::{path::Path, process::Stdio, sync::Mutex};

use async_trait::async_trait;
use deckcast_core::narration::{AudioError, AudioOutput};
use tokio::{process::Command, sync::oneshot};
use tracing::debug;

/// Plays narration clips through `ffplay` with no window.
#[derive(Default)]
pub struct FfplayOutput {
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl FfplayOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AudioOutput for FfplayOutput {
    async fn play(&self, path: &Path) -> Result<(), AudioError> {
        let mut child = Command::new("ffplay")
            .arg("-nodisp")
            .arg("-autoexit")
            .arg("-loglevel")
            .arg("error")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AudioError::Playback(format!("failed to start ffplay: {e}")))?;

        let (stop_tx, stop_rx) = oneshot::channel();
        *self.stop_tx.lock().expect("ffplay slot poisoned") = Some(stop_tx);

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(AudioError::Playback(format!("ffplay exited with {status}")))
                }
            }
            _ = stop_rx => {
                debug!(path = %path.display(), "clip stopped");
                child.kill().await?;
                Ok(())
            }
        }
    }

    fn stop(&self) {
        if let Some(tx) = self.stop_tx.lock().expect("ffplay slot poisoned").take() {
            let _ = tx.send(());
        }
    }
}
