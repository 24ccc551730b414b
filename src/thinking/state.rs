//! Thinking-step state types

use serde::Serialize;

/// Identity of one start-to-finish animation run.
///
/// Issued by the controller in strictly increasing order. A run may only
/// mutate state while its id is still the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl RunId {
    fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Mutable animation state owned by a single controller
#[derive(Debug, Clone, Default)]
pub struct ThinkingState {
    /// Run allowed to mutate this state; `RunId(0)` before the first start
    pub current_run: RunId,
    /// Steps whose reveal has finished, in order
    pub completed_steps: Vec<String>,
    /// Index of the step being revealed; `None` when idle
    pub active_step: Option<usize>,
    /// Prefix of the active step currently shown
    pub revealed_text: String,
    /// True only while characters of the active step are being revealed
    pub typing: bool,
    /// Steps seen across the whole conversation. Maintained by the host.
    pub all_steps: Vec<String>,
}

impl ThinkingState {
    /// Whether `run` is still allowed to mutate this state
    pub fn is_current(&self, run: RunId) -> bool {
        self.current_run == run
    }

    /// Issue a new run id and clear the per-run fields.
    ///
    /// `all_steps` is left alone; it outlives individual runs.
    pub fn begin_run(&mut self) -> RunId {
        self.current_run = self.current_run.next();
        self.clear_run_fields();
        self.current_run
    }

    /// Invalidate any in-flight run and return to the initial empty state
    pub fn reset(&mut self) {
        self.current_run = self.current_run.next();
        self.clear_run_fields();
        self.all_steps.clear();
    }

    fn clear_run_fields(&mut self) {
        self.completed_steps.clear();
        self.active_step = None;
        self.revealed_text.clear();
        self.typing = false;
    }

    pub fn snapshot(&self) -> ThinkingSnapshot {
        ThinkingSnapshot {
            run_id: self.current_run,
            completed_steps: self.completed_steps.clone(),
            active_step: self.active_step,
            revealed_text: self.revealed_text.clone(),
            typing: self.typing,
            all_steps: self.all_steps.clone(),
        }
    }
}

/// Read-only copy of the animation state handed to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThinkingSnapshot {
    pub run_id: RunId,
    pub completed_steps: Vec<String>,
    pub active_step: Option<usize>,
    pub revealed_text: String,
    pub typing: bool,
    pub all_steps: Vec<String>,
}
