//! What the worker pool consumes from the priority queue.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::control::ControlHandle;
use super::execution::TriggerType;
use super::robot::{ExecutorMode, Robot};

/// Immutable once enqueued. Carries everything a worker needs to admit and
/// run one execution, plus the control handle the executor consults for
/// pause/cancel and reports phase transitions through.
#[derive(Clone)]
pub struct QueueItem {
    pub robot: Arc<Robot>,
    pub trigger: TriggerType,
    pub data: serde_json::Value,
    pub exec_id: String,
    pub control: ControlHandle,
    pub executor_mode: ExecutorMode,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    /// Composite ranking score: `robot.priority * 1000 + trigger.priority * 100`.
    /// Higher scores dequeue first; ties break on older `enqueued_at`.
    pub fn score(&self) -> u32 {
        u32::from(self.robot.config.quota.priority) * 1000 + self.trigger.priority() * 100
    }
}

/// Wraps a `QueueItem` for use in a max-heap ordered by `(score, age)`.
pub struct RankedItem(pub QueueItem);

impl PartialEq for RankedItem {
    fn eq(&self, other: &Self) -> bool {
        self.0.score() == other.0.score() && self.0.enqueued_at == other.0.enqueued_at
    }
}
impl Eq for RankedItem {}

impl PartialOrd for RankedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; higher score and older enqueue time
        // (smaller timestamp) should sort "greater" so they pop first.
        self.0
            .score()
            .cmp(&other.0.score())
            .then_with(|| other.0.enqueued_at.cmp(&self.0.enqueued_at))
    }
}
