//! Bounded global work queue ordered by a composite priority key (C2).

use std::collections::{BinaryHeap, HashMap};
use std::sync::Mutex;

use crate::domain::error::QueueError;
use crate::domain::models::{QueueItem, RankedItem};

/// Global queue with a hard cap plus a per-robot queued-count cap.
pub struct PriorityQueue {
    max_size: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    heap: BinaryHeap<RankedItem>,
    per_robot_counts: HashMap<String, usize>,
}

impl PriorityQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                per_robot_counts: HashMap::new(),
            }),
        }
    }

    /// Rejects (does not block) when either the global or the per-robot cap
    /// is at capacity. `item.enqueued_at` is expected to already be stamped.
    pub fn enqueue(&self, item: QueueItem) -> Result<(), QueueError> {
        let member_id = item.robot.member_id.clone();
        let robot_cap = item.robot.config.quota.effective_queue();
        let mut inner = self.inner.lock().expect("queue mutex poisoned");

        if inner.heap.len() >= self.max_size {
            return Err(QueueError::Full { max: self.max_size });
        }
        let count = inner.per_robot_counts.get(&member_id).copied().unwrap_or(0);
        if count >= robot_cap {
            return Err(QueueError::RobotQueueFull { member_id, max: robot_cap });
        }

        inner.per_robot_counts.insert(member_id, count + 1);
        inner.heap.push(RankedItem(item));
        Ok(())
    }

    /// Returns the highest-ranked item, or `None` if empty; decrements the
    /// per-robot count for that item's `member_id` on success.
    pub fn dequeue(&self) -> Option<QueueItem> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        let ranked = inner.heap.pop()?;
        let member_id = ranked.0.robot.member_id.clone();
        if let Some(count) = inner.per_robot_counts.get_mut(&member_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                inner.per_robot_counts.remove(&member_id);
            }
        }
        Some(ranked.0)
    }

    pub fn size(&self) -> usize {
        self.inner.lock().expect("queue mutex poisoned").heap.len()
    }

    pub fn is_full(&self) -> bool {
        self.size() >= self.max_size
    }

    pub fn robot_queued_count(&self, member_id: &str) -> usize {
        self.inner
            .lock()
            .expect("queue mutex poisoned")
            .per_robot_counts
            .get(member_id)
            .copied()
            .unwrap_or(0)
    }
}
