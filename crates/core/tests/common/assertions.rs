//! Assertion helpers over captured events.

use ck_protocol::ipc::Event;
use ck_protocol::GenerationProgress;
use uuid::Uuid;

/// Progress snapshots for one workflow, in emission order.
#[allow(dead_code)]
pub fn snapshots_for(events: &[Event], workflow_id: Uuid) -> Vec<GenerationProgress> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ProgressUpdated { progress } if progress.pipeline_id == workflow_id => {
                Some(progress.clone())
            }
            _ => None,
        })
        .collect()
}

/// Asserts `overall_progress` never decreases within one epoch.
#[allow(dead_code)]
pub fn assert_monotone_progress(snapshots: &[GenerationProgress]) {
    for pair in snapshots.windows(2) {
        if pair[0].epoch == pair[1].epoch {
            assert!(
                pair[1].overall_progress >= pair[0].overall_progress,
                "overall_progress went from {} to {}",
                pair[0].overall_progress,
                pair[1].overall_progress
            );
        }
    }
}

/// Asserts `current_step` never moves backwards within one epoch.
#[allow(dead_code)]
pub fn assert_current_step_non_decreasing(snapshots: &[GenerationProgress]) {
    for pair in snapshots.windows(2) {
        if pair[0].epoch == pair[1].epoch {
            assert!(
                pair[1].current_step >= pair[0].current_step,
                "current_step went from {} to {}",
                pair[0].current_step,
                pair[1].current_step
            );
        }
    }
}

/// Index of the first event matching `predicate`.
#[allow(dead_code)]
pub fn position_of(events: &[Event], predicate: impl Fn(&Event) -> bool) -> Option<usize> {
    events.iter().position(predicate)
}

/// Messages of every `Status` event.
#[allow(dead_code)]
pub fn status_messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Status { message } => Some(message.message.clone()),
            _ => None,
        })
        .collect()
}
