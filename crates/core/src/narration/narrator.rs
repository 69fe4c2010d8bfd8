use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::narration::{
    AudioFileStrategy, AudioOutput, NarrationError, NarrationRequest, NarrationStrategy,
    SpeechSynthesizer, StrategyOutcome, SynthesisStrategy,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationOutcome {
    Completed { backend: &'static str },
    Failed(NarrationError),
}

struct ActiveNarration {
    id: u64,
    abort: AbortHandle,
}

type ActiveSlot = Arc<Mutex<Option<ActiveNarration>>>;

/// Cancellable handle to one `speak` call.
pub struct NarrationHandle {
    id: u64,
    active: ActiveSlot,
}

impl NarrationHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancel this narration if it is still the active one. Its callback will not run.
    pub fn cancel(&self) {
        let mut slot = self.active.lock().expect("narration slot poisoned");
        if slot.as_ref().is_some_and(|a| a.id == self.id)
            && let Some(active) = slot.take()
        {
            active.abort.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .expect("narration slot poisoned")
            .as_ref()
            .is_some_and(|a| a.id == self.id)
    }
}

/// Speaks one request at a time through an ordered list of strategies.
pub struct Narrator {
    strategies: Vec<Arc<dyn NarrationStrategy>>,
    active: ActiveSlot,
    next_id: AtomicU64,
}

impl Default for Narrator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Narrator {
    pub fn new(strategies: Vec<Arc<dyn NarrationStrategy>>) -> Self {
        Self {
            strategies,
            active: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Pre-rendered clip first, speech synthesis when the clip is missing or broken.
    pub fn with_fallback(
        output: Arc<dyn AudioOutput>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self::new(vec![
            Arc::new(AudioFileStrategy::new(output)),
            Arc::new(SynthesisStrategy::new(synthesizer)),
        ])
    }

    pub fn synthesis_only(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self::new(vec![Arc::new(SynthesisStrategy::new(synthesizer))])
    }

    /// Start narrating `request`, cancelling whatever was in flight.
    ///
    /// `on_done` runs exactly once when the narration ends, unless the
    /// narration is cancelled first by `stop`, a later `speak`, or its handle.
    pub fn speak<F>(&self, request: NarrationRequest, on_done: F) -> NarrationHandle
    where
        F: FnOnce(NarrationOutcome) + Send + 'static,
    {
        self.stop();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let strategies = self.strategies.clone();
        let active = Arc::clone(&self.active);

        // Held across spawn so a fast task cannot finish before it is registered.
        let mut slot = self.active.lock().expect("narration slot poisoned");
        let task = tokio::spawn(async move {
            let outcome = run_strategies(&strategies, &request).await;

            let still_current = {
                let mut slot = active.lock().expect("narration slot poisoned");
                if slot.as_ref().is_some_and(|a| a.id == id) {
                    slot.take();
                    true
                } else {
                    false
                }
            };

            if still_current {
                on_done(outcome);
            } else {
                debug!(narration = id, "dropping outcome of superseded narration");
            }
        });
        *slot = Some(ActiveNarration {
            id,
            abort: task.abort_handle(),
        });
        drop(slot);

        NarrationHandle {
            id,
            active: Arc::clone(&self.active),
        }
    }

    /// Stop any narration. Idempotent; every backend is told to stop
    /// regardless of which one was speaking.
    pub fn stop(&self) {
        let previous = self.active.lock().expect("narration slot poisoned").take();
        if let Some(previous) = previous {
            debug!(narration = previous.id, "stopping narration");
            previous.abort.abort();
        }

        for strategy in &self.strategies {
            strategy.cancel();
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.active
            .lock()
            .expect("narration slot poisoned")
            .is_some()
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_strategies(
    strategies: &[Arc<dyn NarrationStrategy>],
    request: &NarrationRequest,
) -> NarrationOutcome {
    let mut reasons = Vec::new();

    for strategy in strategies {
        match strategy.narrate(request).await {
            StrategyOutcome::Success => {
                return NarrationOutcome::Completed {
                    backend: strategy.name(),
                };
            }
            StrategyOutcome::Retry(reason) => {
                debug!(strategy = strategy.name(), %reason, "narration strategy skipped");
                reasons.push(format!("{}: {reason}", strategy.name()));
            }
            StrategyOutcome::Fatal(e) => return NarrationOutcome::Failed(e),
        }
    }

    warn!(?reasons, "no narration strategy could speak");
    NarrationOutcome::Failed(NarrationError::Exhausted { reasons })
}
