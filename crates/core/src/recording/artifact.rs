use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::recording::RecordingError;

/// Why a capture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    Requested,
    /// The capture source went away on its own, e.g. sharing was stopped
    SourceEnded,
}

/// One finished recording session.
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    pub label: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub chunk_count: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub end_reason: EndReason,
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let container = mime_type.split(';').next().unwrap_or("").trim();
    match container {
        "video/webm" | "audio/webm" => "webm",
        "video/mp4" => "mp4",
        "video/x-matroska" => "mkv",
        _ => "bin",
    }
}

/// `{label}_{YYYY-MM-DDTHH-MM-SS}.{ext}`, safe for any filesystem.
pub fn artifact_file_name(label: &str, started_at: &DateTime<Local>, extension: &str) -> String {
    let label: String = label
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let label = if label.is_empty() { "recording".to_string() } else { label };
    format!(
        "{label}_{}.{extension}",
        started_at.format("%Y-%m-%dT%H-%M-%S")
    )
}

impl RecordingArtifact {
    pub fn file_name(&self) -> String {
        artifact_file_name(
            &self.label,
            &self.started_at,
            extension_for_mime(&self.mime_type),
        )
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf, RecordingError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.file_name());
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}
