use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use serde::Serialize;
use uuid::Uuid;

/// Write-only channel from the orchestrator to whoever automates it.
pub trait ProgressSink: Send + Sync {
    /// A new play session began; previous progress no longer applies.
    fn session_started(&self, session: Uuid);

    /// 1-based number of the page now on screen.
    fn report_page(&self, page_number: usize);

    /// Playback finished, was stopped, or hit a narration error.
    fn report_completed(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSignals {
    pub current_page: usize,
    pub completed: bool,
}

/// Lock-free progress board an automation driver can poll.
#[derive(Debug, Default)]
pub struct SignalBoard {
    current_page: AtomicUsize,
    completed: AtomicBool,
    completions: AtomicUsize,
    session: Mutex<Option<Uuid>>,
}

impl SignalBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> usize {
        self.current_page.load(Ordering::Acquire)
    }

    pub fn playback_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Completion transitions seen across all sessions
    pub fn completion_count(&self) -> usize {
        self.completions.load(Ordering::Acquire)
    }

    pub fn session(&self) -> Option<Uuid> {
        *self.session.lock().expect("signal board poisoned")
    }

    pub fn signals(&self) -> ProgressSignals {
        ProgressSignals {
            current_page: self.current_page(),
            completed: self.playback_completed(),
        }
    }
}

impl ProgressSink for SignalBoard {
    fn session_started(&self, session: Uuid) {
        *self.session.lock().expect("signal board poisoned") = Some(session);
        self.current_page.store(0, Ordering::Release);
        self.completed.store(false, Ordering::Release);
    }

    fn report_page(&self, page_number: usize) {
        self.current_page.store(page_number, Ordering::Release);
    }

    fn report_completed(&self) {
        if !self.completed.swap(true, Ordering::AcqRel) {
            self.completions.fetch_add(1, Ordering::AcqRel);
        }
    }
}
