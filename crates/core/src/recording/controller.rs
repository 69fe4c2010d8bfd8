use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::Local;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::recording::{
    CaptureSettings, CaptureSource, CaptureStream, EndReason, RecordingArtifact, RecordingError,
};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal outcome of one recording, delivered exactly once per `start`.
#[derive(Debug)]
pub enum RecordingEvent {
    Completed(RecordingArtifact),
    Failed(RecordingError),
}

struct ActiveRecording {
    id: u64,
    stop_tx: Option<oneshot::Sender<()>>,
}

type ActiveSlot = Arc<Mutex<Option<ActiveRecording>>>;

/// Owns the capture lifecycle: acquire, buffer chunks, finalize once.
pub struct RecordingController {
    source: Arc<dyn CaptureSource>,
    settings: CaptureSettings,
    label: Mutex<String>,
    active: ActiveSlot,
    events: mpsc::UnboundedSender<RecordingEvent>,
    next_id: AtomicU64,
}

impl RecordingController {
    pub fn new(
        source: Arc<dyn CaptureSource>,
        settings: CaptureSettings,
        label: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<RecordingEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            source,
            settings,
            label: Mutex::new(label.into()),
            active: Arc::new(Mutex::new(None)),
            events,
            next_id: AtomicU64::new(1),
        };
        (controller, events_rx)
    }

    /// Name used for the next artifact, normally the script id.
    pub fn set_label(&self, label: impl Into<String>) {
        *self.label.lock().expect("recording label poisoned") = label.into();
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn is_recording(&self) -> bool {
        self.active
            .lock()
            .expect("recording slot poisoned")
            .is_some()
    }

    /// Acquire the capture stream and start buffering. Resolves once chunks
    /// are being collected; a refused permission prompt is returned as an error.
    pub async fn start(&self) -> Result<(), RecordingError> {
        if self.is_recording() {
            return Err(RecordingError::AlreadyRecording);
        }

        let mime_type = self
            .settings
            .pick_mime_type(|mime| self.source.supports_mime_type(mime));
        let stream = match self.source.acquire(&self.settings, &mime_type).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "failed to acquire capture stream");
                return Err(e);
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (stop_tx, stop_rx) = oneshot::channel();
        {
            let mut slot = self.active.lock().expect("recording slot poisoned");
            if slot.is_some() {
                return Err(RecordingError::AlreadyRecording);
            }
            *slot = Some(ActiveRecording {
                id,
                stop_tx: Some(stop_tx),
            });
        }

        let label = self.label.lock().expect("recording label poisoned").clone();
        info!(recording = id, %mime_type, %label, "recording started");

        let pump = Pump {
            id,
            stream,
            stop_rx,
            label,
            mime_type,
            active: Arc::clone(&self.active),
            events: self.events.clone(),
        };
        tokio::spawn(pump.run());
        Ok(())
    }

    /// Request the recording to stop. Non-blocking; the artifact arrives as a
    /// `RecordingEvent`. No-op when nothing is recording.
    pub fn stop(&self) {
        let mut slot = self.active.lock().expect("recording slot poisoned");
        match slot.as_mut().and_then(|active| {
            active
                .stop_tx
                .take()
                .map(|tx| (active.id, tx))
        }) {
            Some((id, tx)) => {
                debug!(recording = id, "stop requested");
                let _ = tx.send(());
            }
            None => debug!("stop requested while not recording"),
        }
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        self.stop();
    }
}

enum PumpEnd {
    Requested,
    SourceEnded,
    Failed(RecordingError),
}

/// Sole owner of the chunk buffer, and the only place a recording is finalized.
struct Pump {
    id: u64,
    stream: Box<dyn CaptureStream>,
    stop_rx: oneshot::Receiver<()>,
    label: String,
    mime_type: String,
    active: ActiveSlot,
    events: mpsc::UnboundedSender<RecordingEvent>,
}

impl Pump {
    async fn run(mut self) {
        let started_at = Local::now();
        let mut chunks: Vec<Vec<u8>> = Vec::new();

        let end = loop {
            tokio::select! {
                // a dropped sender means the controller is gone, which also stops
                _ = &mut self.stop_rx => break PumpEnd::Requested,
                chunk = self.stream.next_chunk() => match chunk {
                    Some(Ok(bytes)) => {
                        if !bytes.is_empty() {
                            chunks.push(bytes);
                        }
                    }
                    Some(Err(e)) => break PumpEnd::Failed(e),
                    None => break PumpEnd::SourceEnded,
                },
            }
        };

        if let Err(e) = self.stream.finish().await {
            warn!(recording = self.id, error = %e, "capture stream did not finish cleanly");
        }

        if matches!(end, PumpEnd::Requested) {
            let drain = async {
                while let Some(chunk) = self.stream.next_chunk().await {
                    match chunk {
                        Ok(bytes) if !bytes.is_empty() => chunks.push(bytes),
                        Ok(_) => {}
                        Err(e) => {
                            warn!(recording = self.id, error = %e, "error while flushing capture");
                            break;
                        }
                    }
                }
            };
            if tokio::time::timeout(FLUSH_TIMEOUT, drain).await.is_err() {
                warn!(recording = self.id, "capture flush timed out");
            }
        }

        {
            let mut slot = self.active.lock().expect("recording slot poisoned");
            if slot.as_ref().is_some_and(|a| a.id == self.id) {
                *slot = None;
            }
        }

        let end_reason = match end {
            PumpEnd::Failed(e) => {
                error!(recording = self.id, error = %e, "recording failed");
                self.deliver(RecordingEvent::Failed(e));
                return;
            }
            PumpEnd::Requested => EndReason::Requested,
            PumpEnd::SourceEnded => EndReason::SourceEnded,
        };

        let chunk_count = chunks.len();
        let artifact = RecordingArtifact {
            label: self.label.clone(),
            mime_type: self.mime_type.clone(),
            bytes: chunks.concat(),
            chunk_count,
            started_at,
            finished_at: Local::now(),
            end_reason,
        };
        info!(
            recording = self.id,
            bytes = artifact.len(),
            chunks = chunk_count,
            reason = ?end_reason,
            "recording finalized"
        );
        self.deliver(RecordingEvent::Completed(artifact));
    }

    fn deliver(&self, event: RecordingEvent) {
        if self.events.send(event).is_err() {
            debug!(recording = self.id, "nobody is listening for the recording outcome");
        }
    }
}
