//! Observable changes published by the animation engine

use super::state::{RunId, ThinkingSnapshot};
use serde::Serialize;

/// One UI-visible state update. Every event carries the full snapshot
/// taken right after the mutation it describes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThinkingEvent {
    RunStarted {
        step_count: usize,
        snapshot: ThinkingSnapshot,
    },
    StepStarted {
        index: usize,
        snapshot: ThinkingSnapshot,
    },
    /// One character tick of the active step
    Reveal { snapshot: ThinkingSnapshot },
    StepCompleted {
        index: usize,
        snapshot: ThinkingSnapshot,
    },
    /// Last step done; the completion delay is now running
    RunFinished { snapshot: ThinkingSnapshot },
    /// Completion delay elapsed for a run that was never superseded
    Completed { run_id: RunId },
    Reset { snapshot: ThinkingSnapshot },
}

impl ThinkingEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            ThinkingEvent::RunStarted { .. } => "run_started",
            ThinkingEvent::StepStarted { .. } => "step_started",
            ThinkingEvent::Reveal { .. } => "reveal",
            ThinkingEvent::StepCompleted { .. } => "step_completed",
            ThinkingEvent::RunFinished { .. } => "run_finished",
            ThinkingEvent::Completed { .. } => "completed",
            ThinkingEvent::Reset { .. } => "reset",
        }
    }

    #[allow(dead_code)] // Used by subscribers and tests
    pub fn snapshot(&self) -> Option<&ThinkingSnapshot> {
        match self {
            ThinkingEvent::RunStarted { snapshot, .. }
            | ThinkingEvent::StepStarted { snapshot, .. }
            | ThinkingEvent::Reveal { snapshot }
            | ThinkingEvent::StepCompleted { snapshot, .. }
            | ThinkingEvent::RunFinished { snapshot }
            | ThinkingEvent::Reset { snapshot } => Some(snapshot),
            ThinkingEvent::Completed { .. } => None,
        }
    }

    /// Run that produced this event
    #[allow(dead_code)] // Used by subscribers and tests
    pub fn run_id(&self) -> RunId {
        match self {
            ThinkingEvent::Completed { run_id } => *run_id,
            other => other.snapshot().map_or(RunId(0), |s| s.run_id),
        }
    }
}
