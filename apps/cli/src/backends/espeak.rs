use std::{process::Stdio, sync::Mutex};

use async_trait::async_trait;
use deckcast_core::narration::{SpeechSynthesizer, SynthesisError, Voice};
use tokio::{io::AsyncReadExt, process::Command, sync::oneshot};
use tracing::{debug, info};

const BINARY: &str = "espeak-ng";

/// Speech synthesis backed by the `espeak-ng` command.
pub struct EspeakSynthesizer {
    voices: Vec<Voice>,
    cancel_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl EspeakSynthesizer {
    /// Probe for `espeak-ng` and read its voice list. `None` when it is not installed.
    pub async fn detect() -> Option<Self> {
        let output = Command::new(BINARY).arg("--voices").output().await.ok()?;
        if !output.status.success() {
            return None;
        }
        let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        info!(voices = voices.len(), "espeak-ng available");
        Some(Self {
            voices,
            cancel_tx: Mutex::new(None),
        })
    }
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
///  2  en-us           --/M      English_(America)  gmw/en-US            (en 3)
/// ```
pub fn parse_voice_list(text: &str) -> Vec<Voice> {
    let mut voices = Vec::new();
    for line in text.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(language) = fields.get(1) else {
            continue;
        };
        voices.push(Voice::new(*language, *language));

        // "Other Languages" column, e.g. `(zh-cmn 5)(zh 5)`
        let others = fields.get(5..).unwrap_or_default().join(" ");
        for alias in others
            .split('(')
            .skip(1)
            .filter_map(|chunk| chunk.split_whitespace().next())
        {
            voices.push(Voice::new(*language, alias));
        }
    }

    let default = voices
        .iter()
        .position(|v| v.name == "en")
        .or_else(|| voices.iter().position(|v| v.name.starts_with("en")));
    if let Some(index) = default {
        voices[index].is_default = true;
    }
    voices
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    async fn speak(
        &self,
        text: &str,
        voice: Option<&Voice>,
        language: &str,
    ) -> Result<(), SynthesisError> {
        let voice = voice.map(|v| v.name.as_str()).unwrap_or(language);
        let mut child = Command::new(BINARY)
            .arg("-v")
            .arg(voice)
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SynthesisError::Unavailable(e.to_string()))?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        *self.cancel_tx.lock().expect("espeak slot poisoned") = Some(cancel_tx);

        let status = tokio::select! {
            status = child.wait() => status.map_err(|e| SynthesisError::Failed(e.to_string()))?,
            _ = cancel_rx => {
                debug!("utterance cancelled");
                let _ = child.kill().await;
                return Err(SynthesisError::Interrupted);
            }
        };

        if status.success() {
            return Ok(());
        }
        // killed by a signal, not a synthesis failure
        if status.code().is_none() {
            return Err(SynthesisError::Interrupted);
        }

        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr).await;
        }
        Err(SynthesisError::Failed(format!(
            "{BINARY} exited with {status}: {}",
            stderr.trim()
        )))
    }

    fn cancel(&self) {
        if let Some(tx) = self.cancel_tx.lock().expect("espeak slot poisoned").take() {
            let _ = tx.send(());
        }
    }
}
