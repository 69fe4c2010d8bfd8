use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::PlaybackConfig,
    narration::{NarrationHandle, NarrationOutcome, NarrationRequest, Narrator},
    playback::{
        NavTarget, PageToken, PlaybackError, PlaybackMode, PlaybackState, PlayerCommand,
        PlayerHandle, PlayerSnapshot, ProgressSink, SignalBoard,
    },
    recording::RecordingController,
    timeline::PageTimeline,
};

const COMMAND_BUFFER: usize = 32;

/// Callbacks from tasks the orchestrator spawned for the current page.
#[derive(Debug)]
enum Signal {
    Settled(PageToken),
    PageElapsed(PageToken),
    NarrationEnded(PageToken, NarrationOutcome),
}

pub struct PlayerBuilder {
    timeline: Arc<PageTimeline>,
    mode: PlaybackMode,
    config: PlaybackConfig,
    narrator: Option<Arc<Narrator>>,
    recorder: Option<Arc<RecordingController>>,
    progress: Option<Arc<dyn ProgressSink>>,
    language: Option<String>,
}

impl PlayerBuilder {
    pub fn new(timeline: Arc<PageTimeline>) -> Self {
        Self {
            timeline,
            mode: PlaybackMode::default(),
            config: PlaybackConfig::default(),
            narrator: None,
            recorder: None,
            progress: None,
            language: None,
        }
    }

    pub fn mode(mut self, mode: PlaybackMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    pub fn narrator(mut self, narrator: Arc<Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn recorder(mut self, recorder: Arc<RecordingController>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Narration language; defaults to the script's.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Start the orchestrator task. It runs until `PlayerHandle::shutdown`
    /// or until every handle is dropped.
    pub fn spawn(self) -> (PlayerHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let language = self
            .language
            .unwrap_or_else(|| self.timeline.language().to_string());

        let mut orchestrator = Orchestrator {
            timeline: self.timeline,
            mode: self.mode,
            config: self.config,
            narrator: self.narrator.unwrap_or_default(),
            recorder: self.recorder,
            progress: self
                .progress
                .unwrap_or_else(|| Arc::new(SignalBoard::new())),
            state: PlaybackState::Idle,
            current_page: 0,
            language,
            session: None,
            started_at: None,
            elapsed: Duration::ZERO,
            completion_reported: false,
            auto_recording: false,
            next_token: 0,
            page_tasks: Vec::new(),
            narration: None,
            signals: signals_tx,
            snapshot: watch::Sender::new(PlayerSnapshot {
                status: PlaybackState::Idle.status(),
                page_index: 0,
                page_count: 0,
                elapsed: Duration::ZERO,
                recording: false,
                language: String::new(),
                mode: PlaybackMode::default(),
                script_id: String::new(),
                session: None,
            }),
        };
        orchestrator.publish();

        let handle = PlayerHandle::new(commands_tx, shutdown_tx, orchestrator.snapshot.subscribe());
        let task = tokio::spawn(orchestrator.run(commands_rx, signals_rx, shutdown_rx));
        (handle, task)
    }
}

/// Owns one playback session and everything it spawns.
struct Orchestrator {
    timeline: Arc<PageTimeline>,
    mode: PlaybackMode,
    config: PlaybackConfig,
    narrator: Arc<Narrator>,
    recorder: Option<Arc<RecordingController>>,
    progress: Arc<dyn ProgressSink>,

    state: PlaybackState,
    current_page: usize,
    language: String,
    session: Option<Uuid>,
    started_at: Option<Instant>,
    elapsed: Duration,
    completion_reported: bool,
    auto_recording: bool,
    next_token: u64,

    page_tasks: Vec<JoinHandle<()>>,
    narration: Option<NarrationHandle>,
    signals: mpsc::UnboundedSender<Signal>,
    snapshot: watch::Sender<PlayerSnapshot>,
}

impl Orchestrator {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<PlayerCommand>,
        mut signals: mpsc::UnboundedReceiver<Signal>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            script = self.timeline.script_id(),
            pages = self.timeline.len(),
            mode = ?self.mode,
            "player ready"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(signal) = signals.recv() => self.handle_signal(signal),
                _ = ticker.tick(), if self.state.is_playing() => self.publish(),
            }
        }

        self.teardown();
    }

    async fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Play { record, reply } => {
                let result = self.play(record).await;
                let _ = reply.send(result);
            }
            PlayerCommand::Stop { reply } => {
                self.stop();
                let _ = reply.send(());
            }
            PlayerCommand::Navigate { target, reply } => {
                let page = self.navigate(target);
                let _ = reply.send(page);
            }
            PlayerCommand::SetLanguage { language, reply } => {
                let _ = reply.send(self.set_language(language));
            }
            PlayerCommand::StartRecording { reply } => {
                let result = self.start_recording().await;
                let _ = reply.send(result);
            }
            PlayerCommand::StopRecording { reply } => {
                self.stop_recording();
                let _ = reply.send(());
            }
            PlayerCommand::LoadTimeline { timeline, reply } => {
                self.load_timeline(timeline);
                let _ = reply.send(());
            }
        }
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Settled(token) => self.on_settled(token),
            Signal::PageElapsed(token) => {
                if self.state.current(token).is_some() {
                    self.advance();
                } else {
                    debug!("stale page timer ignored");
                }
            }
            Signal::NarrationEnded(token, outcome) => self.on_narration_ended(token, outcome),
        }
    }

    async fn play(&mut self, record: bool) -> Result<(), PlaybackError> {
        if self.state.is_playing() {
            return Err(PlaybackError::AlreadyPlaying);
        }
        if self.timeline.is_empty() {
            return Err(PlaybackError::EmptyTimeline);
        }

        if record {
            let recorder = self.recorder.clone().ok_or(PlaybackError::NoRecorder)?;
            if !recorder.is_recording() {
                recorder.set_label(self.timeline.script_id());
                recorder.start().await?;
                self.auto_recording = true;
                self.publish();
                // let the capture pick up the opening frames before page 1
                tokio::time::sleep(self.config.recording_settle()).await;
            }
        }

        let session = Uuid::new_v4();
        self.session = Some(session);
        self.completion_reported = false;
        self.progress.session_started(session);
        self.started_at = Some(Instant::now());
        self.elapsed = Duration::ZERO;

        info!(%session, page = self.current_page + 1, mode = ?self.mode, "playback started");
        self.enter_page(self.current_page);
        Ok(())
    }

    fn enter_page(&mut self, index: usize) {
        self.cancel_page();

        self.next_token += 1;
        let token = PageToken(self.next_token);
        self.state = PlaybackState::Playing { page: index, token };
        self.current_page = index;
        self.progress.report_page(index + 1);
        debug!(page = index + 1, "entering page");
        self.publish();

        let signals = self.signals.clone();
        let settle = self.config.settle_delay();
        self.page_tasks.push(tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            let _ = signals.send(Signal::Settled(token));
        }));
    }

    fn on_settled(&mut self, token: PageToken) {
        let Some(index) = self.state.current(token) else {
            debug!("stale settle ignored");
            return;
        };
        let Some(page) = self.timeline.page(index) else {
            return;
        };

        let signals = self.signals.clone();
        let duration = page.duration;
        self.page_tasks.push(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = signals.send(Signal::PageElapsed(token));
        }));

        if page.is_silent() {
            debug!(page = index + 1, "nothing to narrate, page timer decides");
        } else if self.mode.narrates() {
            let request = NarrationRequest::for_page(page, &self.language);
            let signals = self.signals.clone();
            self.narration = Some(self.narrator.speak(request, move |outcome| {
                let _ = signals.send(Signal::NarrationEnded(token, outcome));
            }));
        }
    }

    fn on_narration_ended(&mut self, token: PageToken, outcome: NarrationOutcome) {
        let Some(index) = self.state.current(token) else {
            debug!("stale narration outcome ignored");
            return;
        };
        self.narration = None;

        match outcome {
            NarrationOutcome::Completed { backend } => {
                debug!(page = index + 1, backend, "narration finished");
            }
            NarrationOutcome::Failed(e) => {
                warn!(page = index + 1, error = %e, "narration failed, moving on");
                self.report_completed();
            }
        }
        self.advance();
    }

    fn advance(&mut self) {
        let PlaybackState::Playing { page, .. } = self.state else {
            return;
        };
        if page + 1 < self.timeline.len() {
            self.enter_page(page + 1);
        } else {
            self.complete();
        }
    }

    fn complete(&mut self) {
        self.cancel_page();
        self.freeze_clock();
        self.state = PlaybackState::Completed;
        self.report_completed();

        if self.auto_recording {
            if let Some(recorder) = &self.recorder {
                recorder.stop();
            }
            self.auto_recording = false;
        }

        info!(elapsed_secs = self.elapsed.as_secs_f64(), "playback completed");
        self.publish();
    }

    fn stop(&mut self) {
        self.cancel_page();

        if self.state.is_playing() {
            self.freeze_clock();
            self.state = PlaybackState::Stopped;
            self.report_completed();
            info!(page = self.current_page + 1, "playback stopped");
        }

        if let Some(recorder) = &self.recorder
            && recorder.is_recording()
        {
            recorder.stop();
        }
        self.auto_recording = false;
        self.publish();
    }

    fn navigate(&mut self, target: NavTarget) -> usize {
        let wanted = match target {
            NavTarget::Next => self.current_page.checked_add(1),
            NavTarget::Previous => self.current_page.checked_sub(1),
            NavTarget::Page(index) => Some(index),
        };
        let Some(index) = wanted.filter(|i| *i < self.timeline.len()) else {
            debug!(?target, "navigation out of range ignored");
            return self.current_page;
        };

        if self.state.is_playing() {
            self.enter_page(index);
        } else {
            self.cancel_page();
            self.current_page = index;
            self.publish();
        }
        index
    }

    fn set_language(&mut self, language: String) -> Result<(), PlaybackError> {
        if self.state.is_playing() {
            return Err(PlaybackError::LanguageLocked);
        }
        debug!(%language, "narration language changed");
        self.language = language;
        self.publish();
        Ok(())
    }

    async fn start_recording(&mut self) -> Result<(), PlaybackError> {
        if self.state.is_playing() {
            return Err(PlaybackError::RecordingLocked);
        }
        let recorder = self.recorder.clone().ok_or(PlaybackError::NoRecorder)?;
        recorder.set_label(self.timeline.script_id());
        recorder.start().await?;
        self.auto_recording = false;
        self.publish();
        Ok(())
    }

    fn stop_recording(&mut self) {
        if let Some(recorder) = &self.recorder {
            recorder.stop();
        }
        self.auto_recording = false;
        self.publish();
    }

    fn load_timeline(&mut self, timeline: Arc<PageTimeline>) {
        self.teardown();

        info!(script = timeline.script_id(), pages = timeline.len(), "script loaded");
        self.language = timeline.language().to_string();
        self.timeline = timeline;
        self.state = PlaybackState::Idle;
        self.current_page = 0;
        self.session = None;
        self.started_at = None;
        self.elapsed = Duration::ZERO;
        self.completion_reported = false;
        self.publish();
    }

    /// Cancel the current page's timers and narration. Safe to call repeatedly.
    fn cancel_page(&mut self) {
        for task in self.page_tasks.drain(..) {
            task.abort();
        }
        if let Some(handle) = self.narration.take() {
            handle.cancel();
        }
        self.narrator.stop();
    }

    fn teardown(&mut self) {
        self.cancel_page();
        if let Some(recorder) = &self.recorder
            && recorder.is_recording()
        {
            recorder.stop();
        }
        self.auto_recording = false;
        if self.state.is_playing() {
            self.freeze_clock();
            self.state = PlaybackState::Stopped;
        }
        self.publish();
    }

    fn report_completed(&mut self) {
        if !self.completion_reported {
            self.completion_reported = true;
            self.progress.report_completed();
        }
    }

    fn freeze_clock(&mut self) {
        if let Some(started_at) = self.started_at {
            self.elapsed = started_at.elapsed();
        }
    }

    fn elapsed(&self) -> Duration {
        match (self.state.is_playing(), self.started_at) {
            (true, Some(started_at)) => started_at.elapsed(),
            _ => self.elapsed,
        }
    }

    fn publish(&mut self) {
        let snapshot = PlayerSnapshot {
            status: self.state.status(),
            page_index: self.current_page,
            page_count: self.timeline.len(),
            elapsed: self.elapsed(),
            recording: self.recorder.as_ref().is_some_and(|r| r.is_recording()),
            language: self.language.clone(),
            mode: self.mode,
            script_id: self.timeline.script_id().to_string(),
            session: self.session,
        };
        self.snapshot.send_replace(snapshot);
    }
}
