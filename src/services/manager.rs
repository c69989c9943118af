//! Composition root and public surface (C8).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::error::{ManagerError, RobotError};
use crate::domain::models::{
    ClockContext, ControlledExecutionView, ExecutionStatus, ExecutorMode, QueueItem, Robot,
    TriggerInput, TriggerType,
};
use crate::domain::ports::{PhaseBody, RobotStore};

use super::clock_evaluator;
use super::execution_controller::ExecutionController;
use super::executor;
use super::priority_queue::PriorityQueue;
use super::robot_cache::{RobotCache, DEFAULT_REFRESH_INTERVAL};
use super::trigger_dispatcher::{self, EventRequest, InterveneRequest};
use super::worker_pool::{CompletionHandler, WorkerPool};

/// Default clock ticker period.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub worker_size: usize,
    pub queue_size: usize,
    pub tick_period: Duration,
    pub refresh_period: Duration,
    pub default_executor_mode: ExecutorMode,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            worker_size: 4,
            queue_size: 1000,
            tick_period: DEFAULT_TICK_PERIOD,
            refresh_period: DEFAULT_REFRESH_INTERVAL,
            default_executor_mode: ExecutorMode::Standard,
        }
    }
}

/// Result of `Intervene` / `HandleEvent`.
#[derive(Debug, Clone)]
pub struct TriggerOutcome {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub message: String,
}

struct ManagerCompletion<S: RobotStore + 'static> {
    controller: Arc<ExecutionController>,
    cache: Arc<RobotCache<S>>,
}

#[async_trait]
impl<S: RobotStore + 'static> CompletionHandler for ManagerCompletion<S> {
    async fn on_complete(&self, exec_id: &str, member_id: &str, status: ExecutionStatus) {
        self.controller.untrack(exec_id).await;
        if let Some(robot) = self.cache.get(member_id).await {
            robot.remove_execution(exec_id);
        }
        info!(exec_id, member_id, status = status.as_str(), "execution reached terminal status");
    }
}

/// Top-level scheduling core: composes C1-C7 and exposes the public
/// operation surface.
pub struct Manager<S: RobotStore + 'static> {
    cache: Arc<RobotCache<S>>,
    queue: Arc<PriorityQueue>,
    controller: Arc<ExecutionController>,
    pool: Arc<WorkerPool>,
    config: ManagerConfig,
    started: AtomicBool,
    ticking: Arc<AtomicBool>,
    tick_handle: AsyncMutex<Option<JoinHandle<()>>>,
}

impl<S: RobotStore + 'static> Manager<S> {
    pub fn new(store: Arc<S>, standard_body: Arc<dyn PhaseBody>, config: ManagerConfig) -> Arc<Self> {
        let cache = Arc::new(RobotCache::new(store));
        let queue = Arc::new(PriorityQueue::new(config.queue_size));
        let controller = Arc::new(ExecutionController::new());
        let executors = executor::default_executors(standard_body);
        let completion = Arc::new(ManagerCompletion { controller: controller.clone(), cache: cache.clone() });
        let pool = Arc::new(WorkerPool::new(queue.clone(), executors, completion, config.worker_size));

        Arc::new(Self {
            cache,
            queue,
            controller,
            pool,
            config,
            started: AtomicBool::new(false),
            ticking: Arc::new(AtomicBool::new(false)),
            tick_handle: AsyncMutex::new(None),
        })
    }

    /// Loads the cache, starts the pool, the clock ticker, and cache
    /// auto-refresh. Errors if already started.
    #[instrument(skip(self), err)]
    pub async fn start(self: &Arc<Self>) -> Result<(), ManagerError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ManagerError::AlreadyStarted);
        }

        self.cache.load().await?;
        self.pool.start().await;
        self.cache.start_auto_refresh(self.config.refresh_period);

        self.ticking.store(true, Ordering::SeqCst);
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            while manager.ticking.load(Ordering::SeqCst) {
                tokio::time::sleep(manager.config.tick_period).await;
                if !manager.ticking.load(Ordering::SeqCst) {
                    return;
                }
                if let Err(err) = manager.tick(Utc::now()).await {
                    warn!(%err, "clock tick failed");
                }
            }
        });
        *self.tick_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Idempotent in the "already stopped" direction: a second call returns
    /// `ManagerError::NotStarted` rather than panicking.
    #[instrument(skip(self), err)]
    pub async fn stop(&self) -> Result<(), ManagerError> {
        if !self.started.swap(false, Ordering::SeqCst) {
            return Err(ManagerError::NotStarted);
        }
        self.ticking.store(false, Ordering::SeqCst);
        if let Some(handle) = self.tick_handle.lock().await.take() {
            handle.abort();
        }
        self.cache.stop_auto_refresh();
        self.pool.stop().await;
        Ok(())
    }

    /// For every cached robot, skip if non-runnable / clock-disabled / no
    /// clock config; else evaluate C3. On a match, admits a new clock
    /// execution.
    #[instrument(skip(self), err)]
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<(), ManagerError> {
        for robot in self.cache.list_all().await {
            if !robot.clock_eligible() {
                continue;
            }
            if !clock_evaluator::should_fire(&robot, now) {
                continue;
            }

            let exec_id = Uuid::new_v4().to_string();
            let control = self.controller.track(&exec_id, &robot.member_id, &robot.team_id).await;
            let mode_name = robot.config.clock.as_ref().map_or("unknown", |c| match c.mode {
                crate::domain::models::ClockMode::Times => "times",
                crate::domain::models::ClockMode::Interval => "interval",
                crate::domain::models::ClockMode::Daemon => "daemon",
            });
            let input = TriggerInput {
                clock: Some(ClockContext { fired_at: now, mode: mode_name.to_string() }),
                ..Default::default()
            };
            let item = self.build_item(robot.clone(), TriggerType::Clock, &input, exec_id.clone(), control, None);

            match self.queue.enqueue(item) {
                Ok(()) => robot.set_last_run(now),
                Err(err) => {
                    warn!(member_id = %robot.member_id, %err, "clock-triggered submission failed, skipping tick");
                    self.controller.untrack(&exec_id).await;
                }
            }
        }
        Ok(())
    }

    /// `getOrLoadRobot` (lazy-loads non-autonomous) -> checks -> submit.
    #[instrument(skip(self, data), err)]
    pub async fn trigger_manual(
        &self,
        member_id: &str,
        trigger: TriggerType,
        data: serde_json::Value,
    ) -> Result<String, ManagerError> {
        let was_cached = self.cache.get(member_id).await.is_some();
        let robot = self.cache.get_or_load(member_id).await?;
        self.check_admissible(&robot, trigger)?;

        let lazy_loaded = !was_cached && !robot.autonomous_mode;
        let exec_id = Uuid::new_v4().to_string();
        let control = self.controller.track(&exec_id, &robot.member_id, &robot.team_id).await;
        let input = TriggerInput { data: Some(data.clone()), ..Default::default() };
        let item = self.build_item(robot.clone(), trigger, &input, exec_id.clone(), control, None);

        match self.queue.enqueue(item) {
            Ok(()) => {
                if lazy_loaded {
                    self.cache.spawn_cleanup_watchdog(member_id.to_string());
                }
                Ok(exec_id)
            }
            Err(err) => {
                self.controller.untrack(&exec_id).await;
                if lazy_loaded {
                    self.cache.remove(member_id).await;
                }
                Err(err.into())
            }
        }
    }

    /// Validates -> resolves the robot (lazy-load allowed) -> admits a
    /// `human` execution, short-circuiting deferred `plan.add` requests.
    #[instrument(skip(self, req), err)]
    pub async fn intervene(&self, req: &InterveneRequest) -> Result<TriggerOutcome, ManagerError> {
        trigger_dispatcher::validate_intervention(req)?;
        let robot = self.cache.get_or_load(&req.member_id).await?;
        self.check_admissible(&robot, TriggerType::Human)?;

        let now = Utc::now();
        if trigger_dispatcher::is_deferred_plan(req, now) {
            return Ok(TriggerOutcome {
                execution_id: String::new(),
                status: ExecutionStatus::Pending,
                message: "Planned for later execution".to_string(),
            });
        }

        let exec_id = Uuid::new_v4().to_string();
        let control = self.controller.track(&exec_id, &robot.member_id, &robot.team_id).await;
        let input = TriggerInput {
            action: Some(req.action.clone()),
            messages: req.messages.clone(),
            ..Default::default()
        };
        let executor_mode = self.resolve_executor_mode(req.executor_mode, &robot);
        let item = self.build_item(robot.clone(), TriggerType::Human, &input, exec_id.clone(), control, Some(executor_mode));

        self.queue.enqueue(item).map_err(ManagerError::from)?;

        Ok(TriggerOutcome { execution_id: exec_id, status: ExecutionStatus::Pending, message: "submitted".to_string() })
    }

    /// Analogous to `intervene`, but `trigger = event` and input built via
    /// `trigger_dispatcher::build_event_input`.
    #[instrument(skip(self, req), err)]
    pub async fn handle_event(&self, req: &EventRequest) -> Result<TriggerOutcome, ManagerError> {
        trigger_dispatcher::validate_event(req)?;
        let robot = self.cache.get_or_load(&req.member_id).await?;
        self.check_admissible(&robot, TriggerType::Event)?;

        let exec_id = Uuid::new_v4().to_string();
        let control = self.controller.track(&exec_id, &robot.member_id, &robot.team_id).await;
        let input = trigger_dispatcher::build_event_input(req);
        let executor_mode = self.resolve_executor_mode(req.executor_mode, &robot);
        let item = self.build_item(robot.clone(), TriggerType::Event, &input, exec_id.clone(), control, Some(executor_mode));

        self.queue.enqueue(item).map_err(ManagerError::from)?;

        Ok(TriggerOutcome { execution_id: exec_id, status: ExecutionStatus::Pending, message: "submitted".to_string() })
    }

    #[instrument(skip(self), err)]
    pub async fn pause_execution(&self, exec_id: &str) -> Result<(), ManagerError> {
        let view = self.controller.get(exec_id).await.ok_or_else(|| {
            ManagerError::Execution(crate::domain::error::ExecutionError::NotFound(exec_id.to_string()))
        })?;
        let robot = self.cache.get(&view.member_id).await.ok_or_else(|| RobotError::NotFound(view.member_id.clone()))?;
        self.controller.pause(exec_id, &robot).await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn resume_execution(&self, exec_id: &str) -> Result<(), ManagerError> {
        let view = self.controller.get(exec_id).await.ok_or_else(|| {
            ManagerError::Execution(crate::domain::error::ExecutionError::NotFound(exec_id.to_string()))
        })?;
        let robot = self.cache.get(&view.member_id).await.ok_or_else(|| RobotError::NotFound(view.member_id.clone()))?;
        self.controller.resume(exec_id, &robot).await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn stop_execution(&self, exec_id: &str) -> Result<(), ManagerError> {
        self.controller.stop(exec_id).await?;
        Ok(())
    }

    pub async fn get_execution_status(&self, exec_id: &str) -> Option<ControlledExecutionView> {
        self.controller.get(exec_id).await
    }

    pub async fn list_executions(&self) -> Vec<ControlledExecutionView> {
        self.controller.list().await
    }

    pub async fn list_executions_by_member(&self, member_id: &str) -> Vec<ControlledExecutionView> {
        self.controller.list_by_member(member_id).await
    }

    fn check_admissible(&self, robot: &Robot, trigger: TriggerType) -> Result<(), RobotError> {
        if !robot.status.is_runnable() {
            return Err(RobotError::Paused(robot.member_id.clone()));
        }
        let enabled = match trigger {
            TriggerType::Clock => robot.config.triggers.clock,
            TriggerType::Human => robot.config.triggers.human,
            TriggerType::Event => robot.config.triggers.event && robot.config.events_enabled,
        };
        if !enabled {
            return Err(RobotError::TriggerDisabled(format!("{}:{}", robot.member_id, trigger.as_str())));
        }
        Ok(())
    }

    fn resolve_executor_mode(&self, requested: Option<ExecutorMode>, robot: &Robot) -> ExecutorMode {
        requested.unwrap_or(robot.config.executor_mode)
    }

    fn build_item(
        &self,
        robot: Arc<Robot>,
        trigger: TriggerType,
        input: &TriggerInput,
        exec_id: String,
        control: crate::domain::models::ControlHandle,
        executor_mode_override: Option<ExecutorMode>,
    ) -> QueueItem {
        let executor_mode = executor_mode_override.unwrap_or_else(|| {
            if robot.config.executor_mode == ExecutorMode::Standard {
                self.config.default_executor_mode
            } else {
                robot.config.executor_mode
            }
        });
        QueueItem {
            trigger,
            data: serde_json::to_value(input).unwrap_or(serde_json::Value::Null),
            exec_id,
            control,
            executor_mode,
            enqueued_at: Utc::now(),
            robot,
        }
    }
}
