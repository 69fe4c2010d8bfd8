use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use deckcast_core::recording::{CaptureSettings, CaptureSource, CaptureStream, RecordingError};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    process::{Child, ChildStdin, ChildStdout, Command},
};
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 64 * 1024;
/// How long ffmpeg gets to fail on a bad display or device before we trust it
const STARTUP_GRACE: Duration = Duration::from_millis(300);

/// Grabs the X11 display (and PulseAudio, if enabled) with `ffmpeg`,
/// encoding WebM to stdout.
pub struct FfmpegCapture {
    display: String,
}

impl FfmpegCapture {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("DISPLAY").unwrap_or_else(|_| ":0.0".to_string()))
    }

    fn command(&self, settings: &CaptureSettings, mime_type: &str) -> Command {
        let video_codec = if mime_type.contains("vp9") {
            "libvpx-vp9"
        } else {
            "libvpx"
        };

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-f")
            .arg("x11grab")
            .arg("-video_size")
            .arg(format!("{}x{}", settings.width, settings.height))
            .arg("-framerate")
            .arg(settings.frame_rate.to_string())
            .arg("-i")
            .arg(&self.display);

        if settings.capture_audio {
            cmd.arg("-f").arg("pulse").arg("-i").arg("default");
        }

        cmd.arg("-c:v")
            .arg(video_codec)
            .arg("-deadline")
            .arg("realtime")
            .arg("-cpu-used")
            .arg("8")
            .arg("-b:v")
            .arg(settings.video_bits_per_second.to_string());

        if settings.capture_audio {
            cmd.arg("-c:a")
                .arg("libopus")
                .arg("-b:a")
                .arg(settings.audio_bits_per_second.to_string());
        }

        cmd.arg("-f")
            .arg("webm")
            .arg("pipe:1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CaptureSource for FfmpegCapture {
    fn supports_mime_type(&self, mime_type: &str) -> bool {
        mime_type.starts_with("video/webm")
    }

    async fn acquire(
        &self,
        settings: &CaptureSettings,
        mime_type: &str,
    ) -> Result<Box<dyn CaptureStream>, RecordingError> {
        let mut child = self
            .command(settings, mime_type)
            .spawn()
            .map_err(|e| RecordingError::Unavailable(format!("failed to start ffmpeg: {e}")))?;

        tokio::time::sleep(STARTUP_GRACE).await;
        if let Some(status) = child.try_wait()? {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr).await;
            }
            let reason = format!("ffmpeg exited with {status}: {}", stderr.trim());
            return Err(
                if stderr.contains("Permission denied") || stderr.contains("Cannot open display") {
                    RecordingError::PermissionDenied(reason)
                } else {
                    RecordingError::Unavailable(reason)
                },
            );
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RecordingError::Unavailable("ffmpeg stdout not captured".to_string()))?;
        let stdin = child.stdin.take();
        debug!(display = %self.display, %mime_type, "ffmpeg capture running");

        Ok(Box::new(FfmpegStream {
            child,
            stdin,
            stdout,
            buf: vec![0; CHUNK_SIZE],
        }))
    }
}

struct FfmpegStream {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    buf: Vec<u8>,
}

#[async_trait]
impl CaptureStream for FfmpegStream {
    async fn next_chunk(&mut self) -> Option<Result<Vec<u8>, RecordingError>> {
        match self.stdout.read(&mut self.buf).await {
            Ok(0) => None,
            Ok(n) => Some(Ok(self.buf[..n].to_vec())),
            Err(e) => Some(Err(e.into())),
        }
    }

    async fn finish(&mut self) -> Result<(), RecordingError> {
        // `q` asks ffmpeg to write the trailer and exit
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.write_all(b"q").await {
                warn!(error = %e, "ffmpeg stdin closed early");
                self.child.start_kill()?;
            }
        }
        Ok(())
    }
}
