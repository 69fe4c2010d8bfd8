pub mod espeak;
pub mod ffmpeg_capture;
pub mod ffplay;

pub use espeak::*;
pub use ffmpeg_capture::*;
pub use ffplay::*;
