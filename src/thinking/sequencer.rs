//! Drives one run of thinking steps through the typewriter
//!
//! Every mutation goes through [`Shared::apply`], which checks the run id and
//! mutates under the same lock. A superseded run can therefore never write
//! stale text, even if one of its timers fires after a reset.

use super::event::ThinkingEvent;
use super::state::{RunId, ThinkingSnapshot, ThinkingState};
use super::typewriter::typewriter;
use crate::config::AnimationConfig;
use futures::StreamExt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Callback fired once after a run's completion delay
pub type OnComplete = Box<dyn FnOnce() + Send + 'static>;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// A newer start or a reset took over before the run finished
    Superseded,
}

/// Marker returned when a run lost ownership of the state
#[derive(Debug)]
struct Superseded;

pub(super) struct Engine {
    pub(super) state: ThinkingState,
    /// Cancels the sleeps of whichever run currently owns the state
    pub(super) run_token: CancellationToken,
}

/// State and event channel shared by the controller and its runs
pub(super) struct Shared {
    engine: Mutex<Engine>,
    events: broadcast::Sender<ThinkingEvent>,
}

impl Shared {
    pub(super) fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            engine: Mutex::new(Engine {
                state: ThinkingState::default(),
                run_token: CancellationToken::new(),
            }),
            events,
        }
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn subscribe(&self) -> broadcast::Receiver<ThinkingEvent> {
        self.events.subscribe()
    }

    /// Publish while the lock is held so event order matches mutation order
    pub(super) fn publish(&self, event: ThinkingEvent) {
        let _ = self.events.send(event);
    }

    fn apply(
        &self,
        run: RunId,
        mutate: impl FnOnce(&mut ThinkingState),
        event: impl FnOnce(ThinkingSnapshot) -> ThinkingEvent,
    ) -> Result<(), Superseded> {
        let mut engine = self.lock();
        if !engine.state.is_current(run) {
            return Err(Superseded);
        }
        mutate(&mut engine.state);
        let snapshot = engine.state.snapshot();
        self.publish(event(snapshot));
        Ok(())
    }

    /// Publish `Completed` and hand back the callback, both under the lock
    /// that confirms `run` is still current. A reset acquiring the lock
    /// afterwards finds a run that has already completed.
    fn claim_completion(
        &self,
        run: RunId,
        on_complete: Option<OnComplete>,
    ) -> Result<Option<OnComplete>, Superseded> {
        let engine = self.lock();
        if !engine.state.is_current(run) {
            return Err(Superseded);
        }
        self.publish(ThinkingEvent::Completed { run_id: run });
        Ok(on_complete)
    }
}

/// One start-to-finish animation run
pub struct StepSequencer {
    run: RunId,
    shared: std::sync::Arc<Shared>,
    config: AnimationConfig,
    cancel: CancellationToken,
}

impl StepSequencer {
    pub(super) fn new(
        run: RunId,
        shared: std::sync::Arc<Shared>,
        config: AnimationConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            run,
            shared,
            config,
            cancel,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run
    }

    /// Reveal `steps` in order, then fire `on_complete` after the completion
    /// delay. `on_complete` is dropped unfired if the run is superseded.
    pub async fn run(self, steps: Vec<String>, on_complete: Option<OnComplete>) -> RunOutcome {
        tracing::debug!(run = %self.run, steps = steps.len(), "Thinking run started");

        let finished = match self.drive(&steps).await {
            Ok(()) => self.shared.claim_completion(self.run, on_complete),
            Err(superseded) => Err(superseded),
        };

        match finished {
            Ok(on_complete) => {
                tracing::debug!(run = %self.run, "Thinking run completed");
                if let Some(on_complete) = on_complete {
                    on_complete();
                }
                RunOutcome::Completed
            }
            Err(Superseded) => {
                tracing::debug!(run = %self.run, "Thinking run superseded");
                RunOutcome::Superseded
            }
        }
    }

    async fn drive(&self, steps: &[String]) -> Result<(), Superseded> {
        for (index, step) in steps.iter().enumerate() {
            self.apply(
                |s| {
                    s.active_step = Some(index);
                    s.typing = true;
                    s.revealed_text.clear();
                },
                |snapshot| ThinkingEvent::StepStarted { index, snapshot },
            )?;

            let mut prefixes = std::pin::pin!(typewriter(step, self.config.char_delay));
            loop {
                let next = tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => return Err(Superseded),
                    next = prefixes.next() => next,
                };
                let Some(prefix) = next else { break };
                self.apply(
                    move |s| s.revealed_text = prefix,
                    |snapshot| ThinkingEvent::Reveal { snapshot },
                )?;
            }

            self.apply(
                |s| {
                    debug_assert_eq!(s.completed_steps.len(), index);
                    s.completed_steps.push(step.clone());
                    s.typing = false;
                    s.revealed_text.clear();
                },
                |snapshot| ThinkingEvent::StepCompleted { index, snapshot },
            )?;

            self.pause(self.config.step_pause).await?;
        }

        self.apply(
            |s| {
                s.typing = false;
                s.revealed_text.clear();
                s.active_step = None;
            },
            |snapshot| ThinkingEvent::RunFinished { snapshot },
        )?;

        self.pause(self.config.completion_delay).await
    }

    fn apply(
        &self,
        mutate: impl FnOnce(&mut ThinkingState),
        event: impl FnOnce(ThinkingSnapshot) -> ThinkingEvent,
    ) -> Result<(), Superseded> {
        self.shared.apply(self.run, mutate, event)
    }

    async fn pause(&self, duration: Duration) -> Result<(), Superseded> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Superseded),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
