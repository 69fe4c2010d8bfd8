use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::narration::Voice;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Audio playback failed: {0}")]
    Playback(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The system cancelled the utterance, e.g. a newer one preempted it.
    #[error("Speech synthesis was interrupted")]
    Interrupted,

    #[error("Speech synthesis is unavailable: {0}")]
    Unavailable(String),

    #[error("Speech synthesis failed: {0}")]
    Failed(String),
}

/// Plays pre-rendered audio files.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Resolves when playback finishes naturally.
    async fn play(&self, path: &Path) -> Result<(), AudioError>;

    /// Stop whatever is playing. Must be safe to call when idle.
    fn stop(&self);
}

/// On-device text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<Voice>;

    /// Resolves when the utterance finishes.
    async fn speak(
        &self,
        text: &str,
        voice: Option<&Voice>,
        language: &str,
    ) -> Result<(), SynthesisError>;

    /// Cancel any queued or active utterance. Must be safe to call when idle.
    fn cancel(&self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Duration,
}

/// Read a WAV header to check the file is playable and learn its length.
pub fn probe_wav(path: &Path) -> Result<WavInfo, AudioError> {
    if !path.is_file() {
        return Err(AudioError::NotFound(path.to_path_buf()));
    }

    let reader = hound::WavReader::open(path).map_err(|e| AudioError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(AudioError::Decode {
            path: path.to_path_buf(),
            reason: "sample rate is zero".to_string(),
        });
    }

    let frames = reader.duration() as f64;
    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        duration: Duration::from_secs_f64(frames / spec.sample_rate as f64),
    })
}
