//! Thinking-step animation engine
//!
//! Reveals an assistant's "thinking" steps one character at a time, pausing
//! between steps, and signals completion so the final answer can be shown.

mod controller;
mod event;
mod sequencer;
mod state;
mod typewriter;

#[cfg(test)]
mod proptests;

pub use controller::ThinkingController;
pub use event::ThinkingEvent;
pub use sequencer::OnComplete;
pub use state::{RunId, ThinkingSnapshot};
#[allow(unused_imports)] // Public API re-exports
pub use sequencer::{RunOutcome, StepSequencer};
#[allow(unused_imports)]
pub use typewriter::typewriter;
