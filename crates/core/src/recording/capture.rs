use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Capture permission was denied: {0}")]
    PermissionDenied(String),

    #[error("Capture source is unavailable: {0}")]
    Unavailable(String),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("Encoder failed: {0}")]
    Encoder(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Target stream parameters for screen capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub video_bits_per_second: u32,
    pub audio_bits_per_second: u32,
    pub capture_audio: bool,
    /// Container/codec preferences, best first
    pub mime_types: Vec<String>,
    /// Roughly how often the encoder hands over a chunk
    pub timeslice_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 60,
            video_bits_per_second: 5_000_000,
            audio_bits_per_second: 128_000,
            capture_audio: true,
            mime_types: vec![
                "video/webm;codecs=vp9".to_string(),
                "video/webm;codecs=vp8".to_string(),
                "video/webm".to_string(),
            ],
            timeslice_ms: 1000,
        }
    }
}

impl CaptureSettings {
    /// First preferred MIME type the source supports, or plain WebM.
    pub fn pick_mime_type(&self, supports: impl Fn(&str) -> bool) -> String {
        self.mime_types
            .iter()
            .find(|mime| supports(mime.as_str()))
            .cloned()
            .unwrap_or_else(|| "video/webm".to_string())
    }
}

/// Something that can hand out an encoded capture stream, e.g. a screen grabber.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    fn supports_mime_type(&self, _mime_type: &str) -> bool {
        true
    }

    /// Acquire a stream. Fails with `PermissionDenied` when the user refuses.
    async fn acquire(
        &self,
        settings: &CaptureSettings,
        mime_type: &str,
    ) -> Result<Box<dyn CaptureStream>, RecordingError>;
}

#[async_trait]
pub trait CaptureStream: Send {
    /// Next encoded chunk. `None` once the source has ended, for instance
    /// because the user stopped sharing.
    async fn next_chunk(&mut self) -> Option<Result<Vec<u8>, RecordingError>>;

    /// Ask the encoder to flush and release the capture tracks.
    async fn finish(&mut self) -> Result<(), RecordingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported_mime_type() {
        let settings = CaptureSettings::default();
        assert_eq!(
            settings.pick_mime_type(|m| !m.contains("vp9")),
            "video/webm;codecs=vp8"
        );
        assert_eq!(settings.pick_mime_type(|_| false), "video/webm");
    }
}
