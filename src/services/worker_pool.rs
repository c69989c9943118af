//! Fixed-size pool of worker loops draining the priority queue (C6).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::domain::error::ExecutionError;
use crate::domain::models::{ExecutionStatus, ExecutorMode, QueueItem};
use crate::domain::ports::PhaseExecutor;

use super::priority_queue::PriorityQueue;

/// Default worker-loop poll tick.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fired by the worker on every terminal outcome; the manager implements
/// this to unwind the execution controller and the robot's quota slot.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn on_complete(&self, exec_id: &str, member_id: &str, status: ExecutionStatus);
}

pub struct WorkerPool {
    queue: Arc<PriorityQueue>,
    executors: HashMap<ExecutorMode, Arc<dyn PhaseExecutor>>,
    completion: Arc<dyn CompletionHandler>,
    worker_size: usize,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    running_count: Arc<AtomicUsize>,
    handles: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<PriorityQueue>,
        executors: HashMap<ExecutorMode, Arc<dyn PhaseExecutor>>,
        completion: Arc<dyn CompletionHandler>,
        worker_size: usize,
    ) -> Self {
        Self {
            queue,
            executors,
            completion,
            worker_size,
            poll_interval: DEFAULT_POLL_INTERVAL,
            running: Arc::new(AtomicBool::new(false)),
            running_count: Arc::new(AtomicUsize::new(0)),
            handles: AsyncMutex::new(Vec::new()),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn running_count(&self) -> usize {
        self.running_count.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawns `worker_size` identical loops. A no-op if already started.
    pub async fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut handles = self.handles.lock().await;
        for _ in 0..self.worker_size {
            let pool = self.clone();
            handles.push(tokio::spawn(async move { pool.worker_loop().await }));
        }
    }

    async fn worker_loop(self: Arc<Self>) {
        while self.running.load(Ordering::SeqCst) {
            tokio::time::sleep(self.poll_interval).await;
            if !self.running.load(Ordering::SeqCst) {
                return;
            }
            let Some(item) = self.queue.dequeue() else {
                continue;
            };
            self.execute(item).await;
        }
    }

    #[instrument(skip(self, item), fields(exec_id = %item.exec_id, member_id = %item.robot.member_id))]
    async fn execute(&self, item: QueueItem) {
        if !item.robot.can_run() {
            self.requeue(item, "quota pre-check");
            return;
        }

        self.running_count.fetch_add(1, Ordering::SeqCst);
        let executor = self
            .executors
            .get(&item.executor_mode)
            .or_else(|| self.executors.get(&ExecutorMode::Standard))
            .cloned()
            .expect("standard executor must always be registered");

        let result = executor
            .execute_with_control(
                item.robot.clone(),
                item.trigger,
                item.data.clone(),
                item.exec_id.clone(),
                item.control.clone(),
            )
            .await;
        self.running_count.fetch_sub(1, Ordering::SeqCst);

        let member_id = item.robot.member_id.clone();
        let exec_id = item.exec_id.clone();
        match result {
            Ok(execution) => {
                self.completion.on_complete(&exec_id, &member_id, execution.status).await;
            }
            Err(ExecutionError::QuotaExceeded) => {
                self.requeue(item, "quota race");
            }
            Err(ExecutionError::Cancelled) => {
                self.completion.on_complete(&exec_id, &member_id, ExecutionStatus::Cancelled).await;
            }
            Err(_other) => {
                self.completion.on_complete(&exec_id, &member_id, ExecutionStatus::Failed).await;
            }
        }
    }

    /// Overload protection: a retry that cannot be re-enqueued is a dropped
    /// item, not a failure to report.
    fn requeue(&self, item: QueueItem, reason: &'static str) {
        let exec_id = item.exec_id.clone();
        if let Err(err) = self.queue.enqueue(item) {
            warn!(exec_id, reason, %err, "dropping item: queue full on re-enqueue");
        } else {
            debug!(exec_id, reason, "item re-enqueued");
        }
    }

    /// Stops accepting new ticks and waits for in-flight worker loops to
    /// notice. Items left in the queue are not drained (discarded).
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }
}
