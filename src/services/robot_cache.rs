//! Authoritative in-memory view of robots the scheduler may act on (C1).
//!
//! Reads dominate writes so the map sits behind a `tokio::sync::RwLock`;
//! `Get` takes a read guard and clones out an `Arc`, never holding the lock
//! across an await point a caller controls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::domain::error::RobotError;
use crate::domain::models::Robot;
use crate::domain::ports::{RobotStore, LOAD_PAGE_SIZE};

/// `StartAutoRefresh` default period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);
/// Lazy-load cleanup watchdog poll interval.
pub const CLEANUP_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Lazy-load cleanup hard deadline, regardless of in-flight executions.
pub const CLEANUP_HARD_DEADLINE: Duration = Duration::from_secs(24 * 3600);

/// In-memory robot cache, backed by a `RobotStore` for (re)hydration.
pub struct RobotCache<S: RobotStore> {
    store: Arc<S>,
    robots: RwLock<HashMap<String, Arc<Robot>>>,
    refresh_running: Arc<AtomicBool>,
    refresh_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<S: RobotStore + 'static> RobotCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            robots: RwLock::new(HashMap::new()),
            refresh_running: Arc::new(AtomicBool::new(false)),
            refresh_handle: std::sync::Mutex::new(None),
        }
    }

    /// Pulls every autonomous robot from the store, paginated, replacing
    /// existing entries by `member_id`. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn load(&self) -> Result<usize, RobotError> {
        let mut offset = 0;
        let mut loaded = 0;
        loop {
            let page = self.store.load_autonomous(offset, LOAD_PAGE_SIZE).await?;
            if page.is_empty() {
                break;
            }
            let page_len = page.len();
            let mut robots = self.robots.write().await;
            for record in page {
                robots.insert(record.member_id.clone(), Arc::new(record.into_robot()));
            }
            drop(robots);
            loaded += page_len;
            if page_len < LOAD_PAGE_SIZE {
                break;
            }
            offset += LOAD_PAGE_SIZE;
        }
        info!(loaded, "robot cache load complete");
        Ok(loaded)
    }

    /// Single-robot fetch used on the slow path. Fails with `RobotError::NotFound`
    /// if the store has no such robot.
    #[instrument(skip(self), err)]
    pub async fn load_by_id(&self, member_id: &str) -> Result<Arc<Robot>, RobotError> {
        let record = self.store.load_by_id(member_id).await?;
        let robot = Arc::new(record.into_robot());
        self.robots.write().await.insert(member_id.to_string(), robot.clone());
        Ok(robot)
    }

    pub async fn get(&self, member_id: &str) -> Option<Arc<Robot>> {
        self.robots.read().await.get(member_id).cloned()
    }

    /// `Get`, falling back to `load_by_id` when absent (the lazy-load path
    /// manual/event triggers use for non-cached, non-autonomous robots).
    pub async fn get_or_load(&self, member_id: &str) -> Result<Arc<Robot>, RobotError> {
        if let Some(robot) = self.get(member_id).await {
            return Ok(robot);
        }
        self.load_by_id(member_id).await
    }

    pub async fn add(&self, robot: Arc<Robot>) {
        self.robots.write().await.insert(robot.member_id.clone(), robot);
    }

    pub async fn remove(&self, member_id: &str) -> Option<Arc<Robot>> {
        self.robots.write().await.remove(member_id)
    }

    pub async fn list_all(&self) -> Vec<Arc<Robot>> {
        self.robots.read().await.values().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.robots.read().await.len()
    }

    /// Periodic full reload, spawned as a background task.
    pub fn start_auto_refresh(self: &Arc<Self>, interval: Duration) {
        if self.refresh_running.swap(true, Ordering::SeqCst) {
            return;
        }
        let cache = self.clone();
        let running = self.refresh_running.clone();
        let handle = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                tokio::time::sleep(interval).await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(err) = cache.load().await {
                    warn!(%err, "auto-refresh load failed");
                }
            }
        });
        *self.refresh_handle.lock().expect("refresh handle mutex poisoned") = Some(handle);
    }

    pub fn stop_auto_refresh(&self) {
        self.refresh_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.refresh_handle.lock().expect("refresh handle mutex poisoned").take() {
            handle.abort();
        }
    }

    /// Spawns the lazy-load cleanup watchdog for one robot: polls every
    /// `CLEANUP_POLL_INTERVAL` and removes the robot once its in-flight
    /// execution count reaches zero and it's still non-autonomous, or
    /// unconditionally after `CLEANUP_HARD_DEADLINE`.
    pub fn spawn_cleanup_watchdog(self: &Arc<Self>, member_id: String) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let deadline = tokio::time::Instant::now() + CLEANUP_HARD_DEADLINE;
            loop {
                tokio::time::sleep(CLEANUP_POLL_INTERVAL).await;
                let Some(robot) = cache.get(&member_id).await else {
                    return;
                };
                let past_deadline = tokio::time::Instant::now() >= deadline;
                if past_deadline || (!robot.autonomous_mode && robot.running_count() == 0) {
                    cache.remove(&member_id).await;
                    info!(member_id, past_deadline, "lazy-loaded robot evicted from cache");
                    return;
                }
            }
        })
    }
}
