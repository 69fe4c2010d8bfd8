#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use deckcast_core::{
    narration::{AudioError, AudioOutput, SpeechSynthesizer, SynthesisError, Voice},
    playback::ProgressSink,
    recording::{CaptureSettings, CaptureSource, CaptureStream, RecordingError},
    script::Script,
    timeline::{DurationPolicy, PageTimeline},
};
use serde_json::{Value, json};
use tokio::time::Instant;
use uuid::Uuid;

pub fn timeline_from(sections: Vec<Value>) -> Arc<PageTimeline> {
    let script: Script = serde_json::from_value(json!({
        "title": "Test deck",
        "language": "en-US",
        "sections": sections,
    }))
    .unwrap();
    Arc::new(PageTimeline::build(
        &script,
        "deck",
        Path::new("/nonexistent/tts"),
        &DurationPolicy::default(),
    ))
}

/// One section per duration, each with a line of narration.
pub fn timeline(durations: &[f64]) -> Arc<PageTimeline> {
    timeline_from(
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| json!({ "id": format!("p{i}"), "duration": d, "read_srt": format!("Page {i}") }))
            .collect(),
    )
}

pub fn write_wav(path: &Path, millis: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(8 * millis) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[derive(Default)]
pub struct FakeAudio {
    pub fail: bool,
    pub play_time: Duration,
    pub plays: Mutex<Vec<PathBuf>>,
    pub stops: AtomicUsize,
}

impl FakeAudio {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn plays(&self) -> Vec<PathBuf> {
        self.plays.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioOutput for FakeAudio {
    async fn play(&self, path: &Path) -> Result<(), AudioError> {
        self.plays.lock().unwrap().push(path.to_path_buf());
        tokio::time::sleep(self.play_time).await;
        if self.fail {
            Err(AudioError::Playback("decoder exploded".to_string()))
        } else {
            Ok(())
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SynthBehavior {
    Speak(Duration),
    Interrupt,
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpokenLine {
    pub text: String,
    pub voice: Option<String>,
    pub language: String,
}

pub struct FakeSynth {
    behavior: SynthBehavior,
    calls: Mutex<Vec<SpokenLine>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    cancels: AtomicUsize,
}

impl FakeSynth {
    pub fn new(behavior: SynthBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
            cancels: AtomicUsize::new(0),
        }
    }

    pub fn speaking(millis: u64) -> Self {
        Self::new(SynthBehavior::Speak(Duration::from_millis(millis)))
    }

    pub fn calls(&self) -> Vec<SpokenLine> {
        self.calls.lock().unwrap().clone()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

/// Counts an utterance as active until its future completes or is dropped.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn enter(active: &Arc<AtomicUsize>, max: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice::new("en-us", "en-US").as_default(),
            Voice::new("cmn", "zh-CN"),
        ]
    }

    async fn speak(
        &self,
        text: &str,
        voice: Option<&Voice>,
        language: &str,
    ) -> Result<(), SynthesisError> {
        self.calls.lock().unwrap().push(SpokenLine {
            text: text.to_string(),
            voice: voice.map(|v| v.name.clone()),
            language: language.to_string(),
        });
        let _guard = ActiveGuard::enter(&self.active, &self.max_active);

        match self.behavior {
            SynthBehavior::Speak(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            SynthBehavior::Interrupt => Err(SynthesisError::Interrupted),
            SynthBehavior::Fail => Err(SynthesisError::Failed("engine crashed".to_string())),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Session,
    Page(usize),
    Completed,
}

/// Progress sink that timestamps every report.
pub struct TimedSink {
    origin: Instant,
    events: Mutex<Vec<(Duration, Progress)>>,
}

impl TimedSink {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<(Duration, Progress)> {
        self.events.lock().unwrap().clone()
    }

    pub fn pages(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|(_, e)| match e {
                Progress::Page(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Milliseconds since creation at which each page was reported.
    pub fn page_times(&self) -> Vec<(usize, u128)> {
        self.events()
            .into_iter()
            .filter_map(|(at, e)| match e {
                Progress::Page(n) => Some((n, at.as_millis())),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<u128> {
        self.events()
            .into_iter()
            .filter(|(_, e)| *e == Progress::Completed)
            .map(|(at, _)| at.as_millis())
            .collect()
    }

    fn push(&self, event: Progress) {
        let at = self.origin.elapsed();
        self.events.lock().unwrap().push((at, event));
    }
}

impl ProgressSink for TimedSink {
    fn session_started(&self, _session: Uuid) {
        self.push(Progress::Session);
    }

    fn report_page(&self, page_number: usize) {
        self.push(Progress::Page(page_number));
    }

    fn report_completed(&self) {
        self.push(Progress::Completed);
    }
}

/// Asserts `actual` is within a few milliseconds of `expected`.
pub fn assert_near(actual: u128, expected: u128) {
    let diff = actual.abs_diff(expected);
    assert!(diff <= 5, "expected ~{expected}ms, got {actual}ms");
}

#[derive(Default)]
pub struct FakeCapture {
    pub deny: bool,
    /// Source ends by itself after this many chunks
    pub end_after: Option<usize>,
    /// Encoder errors after this many chunks
    pub fail_after: Option<usize>,
    pub chunk_interval: Duration,
    pub acquired: AtomicUsize,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self {
            chunk_interval: Duration::from_secs(1),
            ..Default::default()
        }
    }

    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::new()
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureSource for FakeCapture {
    fn supports_mime_type(&self, mime_type: &str) -> bool {
        !mime_type.contains("vp9")
    }

    async fn acquire(
        &self,
        _settings: &CaptureSettings,
        _mime_type: &str,
    ) -> Result<Box<dyn CaptureStream>, RecordingError> {
        if self.deny {
            return Err(RecordingError::PermissionDenied(
                "user dismissed the picker".to_string(),
            ));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            produced: 0,
            finishing: false,
            flushed: false,
            end_after: self.end_after,
            fail_after: self.fail_after,
            interval: self.chunk_interval,
        }))
    }
}

struct FakeStream {
    produced: usize,
    finishing: bool,
    flushed: bool,
    end_after: Option<usize>,
    fail_after: Option<usize>,
    interval: Duration,
}

#[async_trait]
impl CaptureStream for FakeStream {
    async fn next_chunk(&mut self) -> Option<Result<Vec<u8>, RecordingError>> {
        if self.finishing {
            if self.flushed {
                return None;
            }
            self.flushed = true;
            return Some(Ok(b"tail".to_vec()));
        }
        if self.end_after.is_some_and(|n| self.produced >= n) {
            return None;
        }
        if self.fail_after.is_some_and(|n| self.produced >= n) {
            return Some(Err(RecordingError::Encoder("muxer crashed".to_string())));
        }

        tokio::time::sleep(self.interval).await;
        self.produced += 1;
        Some(Ok(vec![self.produced as u8; 4]))
    }

    async fn finish(&mut self) -> Result<(), RecordingError> {
        self.finishing = true;
        Ok(())
    }
}
