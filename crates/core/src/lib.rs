pub mod automation;
pub mod config;
pub mod deck;
pub mod error;
pub mod format;
pub mod narration;
pub mod playback;
pub mod recording;
pub mod script;
pub mod timeline;

pub use automation::{
    AutomationDriver, DriverReport, LaunchParams, completion_deadline, expected_runtime,
};
pub use config::PlayerConfig;
pub use deck::Deck;
pub use error::{DeckError, Result};
pub use format::{format_duration, format_timeline, format_timestamp, format_validation_report};
pub use narration::{Narrator, NarrationRequest};
pub use playback::{PlaybackMode, PlayerBuilder, PlayerHandle, PlayerSnapshot, SignalBoard};
pub use recording::{RecordingController, RecordingEvent};
pub use script::{Script, ScriptSource};
pub use timeline::PageTimeline;
