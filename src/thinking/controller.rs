//! Public start/reset surface of the thinking animation

use super::event::ThinkingEvent;
use super::sequencer::{OnComplete, RunOutcome, Shared, StepSequencer};
use super::state::{RunId, ThinkingSnapshot};
use crate::config::AnimationConfig;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Enough to hold several long steps worth of ticks for a slow subscriber
const EVENT_CAPACITY: usize = 1024;

/// Owns the animation state for one chat view.
///
/// Starting a run supersedes the previous one; resetting supersedes whatever
/// is in flight. Observers either poll [`snapshot`](Self::snapshot) or
/// [`subscribe`](Self::subscribe) to every tick.
pub struct ThinkingController {
    shared: Arc<Shared>,
    config: AnimationConfig,
}

impl ThinkingController {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(EVENT_CAPACITY)),
            config,
        }
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Begin a new run in the background and return its id.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, steps: Vec<String>, on_complete: Option<OnComplete>) -> RunId {
        let sequencer = self.prepare(steps.len());
        let run = sequencer.run_id();
        tokio::spawn(sequencer.run(steps, on_complete));
        run
    }

    /// Like [`start`](Self::start), but drives the run on the caller's task
    #[allow(dead_code)] // Used by embedders that own their task
    pub async fn run(&self, steps: Vec<String>, on_complete: Option<OnComplete>) -> RunOutcome {
        self.prepare(steps.len()).run(steps, on_complete).await
    }

    /// Clear all state, including the host-managed history, and invalidate
    /// any in-flight run.
    pub fn reset(&self) {
        let mut engine = self.shared.lock();
        engine.run_token.cancel();
        engine.run_token = CancellationToken::new();
        engine.state.reset();
        let snapshot = engine.state.snapshot();
        tracing::debug!(run = %snapshot.run_id, "Thinking state reset");
        self.shared.publish(ThinkingEvent::Reset { snapshot });
    }

    fn prepare(&self, step_count: usize) -> StepSequencer {
        let mut engine = self.shared.lock();
        engine.run_token.cancel();
        engine.run_token = CancellationToken::new();
        let run = engine.state.begin_run();
        let snapshot = engine.state.snapshot();
        self.shared.publish(ThinkingEvent::RunStarted {
            step_count,
            snapshot,
        });

        StepSequencer::new(
            run,
            Arc::clone(&self.shared),
            self.config,
            engine.run_token.clone(),
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ThinkingEvent> {
        self.shared.subscribe()
    }

    pub fn snapshot(&self) -> ThinkingSnapshot {
        self.shared.lock().state.snapshot()
    }

    /// Replace the conversation-wide step history
    pub fn set_all_steps(&self, steps: Vec<String>) {
        self.shared.lock().state.all_steps = steps;
    }
}

/// Per-field accessors for embedders that poll instead of subscribing
#[allow(dead_code)]
impl ThinkingController {
    pub fn current_run(&self) -> RunId {
        self.shared.lock().state.current_run
    }

    pub fn completed_steps(&self) -> Vec<String> {
        self.shared.lock().state.completed_steps.clone()
    }

    pub fn revealed_text(&self) -> String {
        self.shared.lock().state.revealed_text.clone()
    }

    pub fn active_step(&self) -> Option<usize> {
        self.shared.lock().state.active_step
    }

    pub fn is_typing(&self) -> bool {
        self.shared.lock().state.typing
    }

    /// Conversation-wide step history. The engine never appends to it.
    pub fn all_steps(&self) -> Vec<String> {
        self.shared.lock().state.all_steps.clone()
    }

    pub fn extend_all_steps(&self, steps: impl IntoIterator<Item = String>) {
        self.shared.lock().state.all_steps.extend(steps);
    }
}

impl Default for ThinkingController {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}
