use thiserror::Error;

use crate::{
    automation::DriverError,
    config::ConfigError,
    narration::NarrationError,
    playback::PlaybackError,
    recording::RecordingError,
    script::ScriptError,
};

#[derive(Error, Debug)]
pub enum DeckError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Narration(#[from] NarrationError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeckError>;
