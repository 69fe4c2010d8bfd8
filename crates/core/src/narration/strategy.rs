use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    narration::{
        AudioError, AudioOutput, SpeechSynthesizer, SynthesisError, probe_wav, select_voice,
    },
    timeline::Page,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrationError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("No narration backend could speak the text: {}", .reasons.join("; "))]
    Exhausted { reasons: Vec<String> },
}

/// What to say, and where a pre-rendered clip of it may live.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRequest {
    pub text: String,
    pub audio_file: Option<PathBuf>,
    pub language: String,
}

impl NarrationRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio_file: None,
            language: language.into(),
        }
    }

    pub fn with_audio_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_file = Some(path.into());
        self
    }

    pub fn for_page(page: &Page, language: &str) -> Self {
        Self::new(page.narration.clone(), language).with_audio_file(page.audio_file.clone())
    }
}

#[derive(Debug)]
pub enum StrategyOutcome {
    Success,
    /// This strategy cannot serve the request; try the next one
    Retry(String),
    Fatal(NarrationError),
}

/// One way of producing narration, tried in order by the narrator.
#[async_trait]
pub trait NarrationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn narrate(&self, request: &NarrationRequest) -> StrategyOutcome;

    fn cancel(&self);
}

pub struct AudioFileStrategy {
    output: Arc<dyn AudioOutput>,
}

impl AudioFileStrategy {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self { output }
    }
}

#[async_trait]
impl NarrationStrategy for AudioFileStrategy {
    fn name(&self) -> &'static str {
        "audio-file"
    }

    async fn narrate(&self, request: &NarrationRequest) -> StrategyOutcome {
        let Some(path) = request.audio_file.as_deref() else {
            return StrategyOutcome::Retry("no audio file".to_string());
        };

        let is_wav = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if is_wav {
            // hound reads synchronously
            let clip = path.to_path_buf();
            let probed = tokio::task::spawn_blocking(move || probe_wav(&clip))
                .await
                .unwrap_or_else(|e| Err(AudioError::Playback(e.to_string())));
            match probed {
                Ok(info) => debug!(
                    path = %path.display(),
                    secs = info.duration.as_secs_f64(),
                    "playing narration clip"
                ),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "narration clip unusable, falling back");
                    return StrategyOutcome::Retry(e.to_string());
                }
            }
        }

        match self.output.play(path).await {
            Ok(()) => StrategyOutcome::Success,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "narration clip failed to play, falling back");
                StrategyOutcome::Retry(e.to_string())
            }
        }
    }

    fn cancel(&self) {
        self.output.stop();
    }
}

pub struct SynthesisStrategy {
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl SynthesisStrategy {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl NarrationStrategy for SynthesisStrategy {
    fn name(&self) -> &'static str {
        "synthesis"
    }

    async fn narrate(&self, request: &NarrationRequest) -> StrategyOutcome {
        if request.text.trim().is_empty() {
            return StrategyOutcome::Success;
        }

        let voices = self.synthesizer.voices();
        let voice = select_voice(&voices, &request.language);
        debug!(
            language = %request.language,
            voice = voice.map(|v| v.name.as_str()).unwrap_or("system default"),
            "synthesizing narration"
        );

        match self
            .synthesizer
            .speak(&request.text, voice, &request.language)
            .await
        {
            Ok(()) => StrategyOutcome::Success,
            Err(SynthesisError::Interrupted) => {
                debug!("synthesis interrupted by the system, treating as finished");
                StrategyOutcome::Success
            }
            Err(e) => {
                error!(error = %e, "speech synthesis failed");
                StrategyOutcome::Fatal(e.into())
            }
        }
    }

    fn cancel(&self) {
        self.synthesizer.cancel();
    }
}
