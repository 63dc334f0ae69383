//! Consumer-side guard against stale or reordered snapshots.
//!
//! Snapshots from a cancelled run carry an older epoch than the one the
//! consumer has already seen, and within one epoch `current_step` never goes
//! backwards. `ProgressFeed` applies both rules so a view only ever moves
//! forward.

use std::collections::HashMap;

use ck_protocol::GenerationProgress;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedDecision {
    Accepted,
    /// Older epoch than the latest one seen for this pipeline.
    Stale,
    /// Same epoch, but `current_step` moved backwards.
    OutOfOrder,
}

#[derive(Debug, Clone, Copy)]
struct Watermark {
    epoch: u32,
    current_step: usize,
}

#[derive(Debug, Default)]
pub struct ProgressFeed {
    latest: HashMap<Uuid, Watermark>,
}

impl ProgressFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether `snapshot` should replace the consumer's copy.
    pub fn accept(&mut self, snapshot: &GenerationProgress) -> FeedDecision {
        let incoming = Watermark {
            epoch: snapshot.epoch,
            current_step: snapshot.current_step,
        };
        match self.latest.get(&snapshot.pipeline_id) {
            Some(seen) if incoming.epoch < seen.epoch => FeedDecision::Stale,
            Some(seen)
                if incoming.epoch == seen.epoch && incoming.current_step < seen.current_step =>
            {
                FeedDecision::OutOfOrder
            }
            _ => {
                self.latest.insert(snapshot.pipeline_id, incoming);
                FeedDecision::Accepted
            }
        }
    }

    /// Records a cancellation so that snapshots from the old epoch are dropped.
    pub fn mark_cancelled(&mut self, pipeline_id: Uuid, new_epoch: u32) {
        let entry = self.latest.entry(pipeline_id).or_insert(Watermark {
            epoch: new_epoch,
            current_step: 0,
        });
        if new_epoch > entry.epoch {
            entry.epoch = new_epoch;
            entry.current_step = 0;
        }
    }

    /// True if a log line tagged with `epoch` belongs to the current run.
    pub fn is_current(&self, pipeline_id: Uuid, epoch: u32) -> bool {
        self.latest
            .get(&pipeline_id)
            .map_or(true, |seen| epoch >= seen.epoch)
    }

    pub fn forget(&mut self, pipeline_id: Uuid) {
        self.latest.remove(&pipeline_id);
    }
}
