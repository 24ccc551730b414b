//! Property-based tests for the thinking animation
//!
//! Each case runs on its own paused-clock runtime so timers resolve instantly.

use super::*;
use crate::config::AnimationConfig;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

fn drain(rx: &mut broadcast::Receiver<ThinkingEvent>) -> Vec<ThinkingEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn arb_steps() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z €]{0,12}", 0..5)
}

proptest! {
    #[test]
    fn prop_completed_steps_match_input(steps in arb_steps()) {
        let rt = paused_runtime();
        let controller = ThinkingController::new(AnimationConfig::default());
        let mut rx = controller.subscribe();
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&calls);

        let outcome = rt.block_on(controller.run(
            steps.clone(),
            Some(Box::new(move || {
                hook.fetch_add(1, Ordering::SeqCst);
            })),
        ));

        prop_assert_eq!(outcome, RunOutcome::Completed);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);

        let snapshot = controller.snapshot();
        prop_assert_eq!(&snapshot.completed_steps, &steps);
        prop_assert!(snapshot.revealed_text.is_empty());
        prop_assert!(!snapshot.typing);

        // Every tick is a one-character extension of the previous prefix
        let events = drain(&mut rx);
        for (index, step) in steps.iter().enumerate() {
            let reveals: Vec<&str> = events
                .iter()
                .filter_map(|e| match e {
                    ThinkingEvent::Reveal { snapshot } if snapshot.active_step == Some(index) => {
                        Some(snapshot.revealed_text.as_str())
                    }
                    _ => None,
                })
                .collect();
            prop_assert_eq!(reveals.len(), step.chars().count() + 1);
            for (n, prefix) in reveals.iter().enumerate() {
                prop_assert!(step.starts_with(prefix));
                prop_assert_eq!(prefix.chars().count(), n);
            }
            prop_assert_eq!(reveals.last().copied(), Some(step.as_str()));
        }
    }

    #[test]
    fn prop_active_step_advances_in_order(steps in arb_steps()) {
        let rt = paused_runtime();
        let controller = ThinkingController::new(AnimationConfig::default());
        let mut rx = controller.subscribe();

        rt.block_on(controller.run(steps.clone(), None));

        let events = drain(&mut rx);
        let started: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ThinkingEvent::StepStarted { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        prop_assert_eq!(started, (0..steps.len()).collect::<Vec<_>>());

        for event in &events {
            if let ThinkingEvent::StepCompleted { index, snapshot } = event {
                prop_assert_eq!(snapshot.completed_steps.len(), index + 1);
                prop_assert!(!snapshot.typing);
            }
            if let Some(snapshot) = event.snapshot() {
                if let Some(active) = snapshot.active_step {
                    prop_assert!(steps[active].starts_with(&snapshot.revealed_text));
                }
            }
        }
    }

    #[test]
    fn prop_reset_at_any_point_clears_state(
        steps in arb_steps(),
        reset_after_ms in 0u64..4000,
    ) {
        let rt = paused_runtime();
        let controller = Arc::new(ThinkingController::new(AnimationConfig::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let snapshot = rt.block_on({
            let controller = Arc::clone(&controller);
            let calls = Arc::clone(&calls);
            async move {
                let hook = Arc::clone(&calls);
                controller.start(
                    steps,
                    Some(Box::new(move || {
                        hook.fetch_add(1, Ordering::SeqCst);
                    })),
                );
                tokio::time::sleep(Duration::from_millis(reset_after_ms)).await;
                let fired_before_reset = calls.load(Ordering::SeqCst);

                controller.reset();
                let mut rx = controller.subscribe();
                tokio::time::sleep(Duration::from_secs(30)).await;

                assert!(drain(&mut rx).is_empty(), "stale run mutated state after reset");
                assert_eq!(calls.load(Ordering::SeqCst), fired_before_reset);
                controller.snapshot()
            }
        });

        prop_assert!(snapshot.completed_steps.is_empty());
        prop_assert!(snapshot.revealed_text.is_empty());
        prop_assert_eq!(snapshot.active_step, None);
        prop_assert!(!snapshot.typing);
    }

    #[test]
    fn prop_restart_keeps_only_latest_steps(
        first in arb_steps(),
        second in arb_steps(),
        restart_after_ms in 0u64..3000,
    ) {
        let rt = paused_runtime();
        let controller = Arc::new(ThinkingController::new(AnimationConfig::default()));

        rt.block_on({
            let controller = Arc::clone(&controller);
            let second = second.clone();
            async move {
                controller.start(first, None);
                tokio::time::sleep(Duration::from_millis(restart_after_ms)).await;
                controller.run(second, None).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        });

        prop_assert_eq!(controller.completed_steps(), second);
    }
}
