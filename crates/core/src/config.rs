use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{recording::CaptureSettings, timeline::DurationPolicy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Root configuration for the player and its automation driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub playback: PlaybackConfig,
    pub durations: DurationPolicy,
    pub recording: CaptureSettings,
    pub automation: AutomationConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Delay between entering a page and starting its narration and timer
    pub settle_delay_ms: u64,
    /// Refresh interval of the visible elapsed-time clock
    pub tick_interval_ms: u64,
    /// Pause between a recording start and the first page
    pub recording_settle_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
            tick_interval_ms: 100,
            recording_settle_ms: 500,
        }
    }
}

impl PlaybackConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        // a zero period would panic inside tokio::time::interval
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn recording_settle(&self) -> Duration {
        Duration::from_millis(self.recording_settle_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub poll_interval_ms: u64,
    pub buffer_secs: u64,
    pub max_wait_secs: u64,
    pub tail_secs: u64,
    pub finalize_timeout_secs: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            buffer_secs: 5,
            max_wait_secs: 600,
            tail_secs: 2,
            finalize_timeout_secs: 10,
        }
    }
}

impl AutomationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn buffer(&self) -> Duration {
        Duration::from_secs(self.buffer_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn tail(&self) -> Duration {
        Duration::from_secs(self.tail_secs)
    }

    pub fn finalize_timeout(&self) -> Duration {
        Duration::from_secs(self.finalize_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub scripts_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from("public/scripts"),
            audio_dir: PathBuf::from("public/tts"),
            output_dir: None,
        }
    }
}

impl PathsConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(default_output_dir)
    }
}

/// Where recordings land when no output directory is configured
pub fn default_output_dir() -> PathBuf {
    dirs::video_dir()
        .map(|dir| dir.join("deckcast"))
        .unwrap_or_else(|| PathBuf::from("recordings"))
}

/// `~/.config/deckcast/config.json` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("deckcast").join("config.json"))
}

/// Load a JSON config file, falling back to defaults when it does not exist.
/// A file that exists but does not parse is an error.
pub fn load_json_config<T: DeserializeOwned + Default>(
    path: &Path,
    label: &str,
) -> Result<T, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "{label} config not found, using defaults");
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl PlayerConfig {
    /// Load from an explicit path, which must exist, or from the default
    /// location when there is a file there.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    warn!(path = %path.display(), "config file does not exist");
                    return Err(ConfigError::Read {
                        path: path.to_path_buf(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "config file not found",
                        ),
                    });
                }
                load_json_config(path, "player")
            }
            None => match default_config_path() {
                Some(path) => load_json_config(&path, "player"),
                None => Ok(Self::default()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_player_timings() {
        let config = PlayerConfig::default();
        assert_eq!(config.playback.settle_delay(), Duration::from_millis(100));
        assert_eq!(config.playback.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.automation.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.automation.max_wait(), Duration::from_secs(600));
        assert_eq!(config.recording.width, 1280);
        assert_eq!(config.recording.frame_rate, 60);
        assert_eq!(config.durations.min_secs, 2.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "playback": {{ "settle_delay_ms": 250 }}, "automation": {{ "tail_secs": 0 }} }}"#
        )
        .unwrap();

        let config = PlayerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.playback.settle_delay_ms, 250);
        assert_eq!(config.playback.tick_interval_ms, 100);
        assert_eq!(config.automation.tail_secs, 0);
        assert_eq!(config.automation.buffer_secs, 5);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            PlayerConfig::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn implicit_missing_path_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config: PlaybackConfig =
            load_json_config(&dir.path().join("absent.json"), "playback").unwrap();
        assert_eq!(config.settle_delay_ms, 100);
    }

    #[test]
    fn malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            PlayerConfig::load(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }
}
