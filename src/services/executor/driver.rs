//! The common `Execute`/`ExecuteWithControl` driver shared by all three
//! executor variants. What differs between `standard`, `dryrun`, and
//! `sandbox` is only which `PhaseBody` is plugged in and whether a timeout
//! / agent allow-list check wraps the run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{instrument, trace};

use crate::domain::error::ExecutionError;
use crate::domain::models::{
    ControlHandle, Execution, ExecutorMode, Phase, Robot, RobotView, TaskExecutorType,
    TriggerInput, TriggerType,
};
use crate::domain::ports::{ExecutionSink, NullExecutionSink, NullPhaseObserver, PhaseBody, PhaseExecutor, PhaseObserver};

/// Sentinel `TriggerInput.action` value that short-circuits a run straight
/// to `failed`, used by tests that need a deterministic failure path.
pub const SIMULATE_FAILURE_SENTINEL: &str = "simulate_failure";

/// Releases the robot's quota slot on any exit path, including an early
/// return from a timed-out future.
struct SlotGuard {
    robot: Arc<Robot>,
    exec_id: String,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.robot.remove_execution(&self.exec_id);
    }
}

/// Shared driver; `mode` only affects logging/labels, `timeout` is `Some`
/// for the sandbox variant, and `enforce_allowlist` gates the P2 output
/// against `robot.config.agent_allowlist` (sandbox only).
pub struct PhaseBodyExecutor {
    mode: ExecutorMode,
    body: Arc<dyn PhaseBody>,
    observer: Arc<dyn PhaseObserver>,
    sink: Arc<dyn ExecutionSink>,
    timeout: Option<Duration>,
    enforce_allowlist: bool,
}

impl PhaseBodyExecutor {
    pub fn standard(body: Arc<dyn PhaseBody>) -> Self {
        Self {
            mode: ExecutorMode::Standard,
            body,
            observer: Arc::new(NullPhaseObserver),
            sink: Arc::new(NullExecutionSink),
            timeout: None,
            enforce_allowlist: false,
        }
    }

    pub fn dryrun(body: Arc<dyn PhaseBody>) -> Self {
        Self {
            mode: ExecutorMode::DryRun,
            body,
            observer: Arc::new(NullPhaseObserver),
            sink: Arc::new(NullExecutionSink),
            timeout: None,
            enforce_allowlist: false,
        }
    }

    /// Placeholder isolation: runs the same deterministic body as dryrun
    /// but under a deadline and an agent allow-list check.
    pub fn sandbox(body: Arc<dyn PhaseBody>, timeout: Duration) -> Self {
        Self {
            mode: ExecutorMode::Sandbox,
            body,
            observer: Arc::new(NullPhaseObserver),
            sink: Arc::new(NullExecutionSink),
            timeout: Some(timeout),
            enforce_allowlist: true,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PhaseObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ExecutionSink>) -> Self {
        self.sink = sink;
        self
    }

    async fn run_pipeline(
        &self,
        view: RobotView,
        trigger: TriggerType,
        input: TriggerInput,
        exec_id: String,
        control: &ControlHandle,
    ) -> Execution {
        let mut execution = Execution::new(exec_id, view, trigger, input);
        execution.mark_running();

        if execution.input.action.as_deref() == Some(SIMULATE_FAILURE_SENTINEL) {
            execution.mark_failed("simulated failure");
            return execution;
        }

        for &phase in execution.expected_phases() {
            if control.cancel.is_cancelled() {
                execution.mark_cancelled();
                return execution;
            }
            control.pause_gate.wait_if_paused(&control.cancel).await;
            if control.cancel.is_cancelled() {
                execution.mark_cancelled();
                return execution;
            }

            self.observer.on_phase_start(&execution.id, phase).await;
            let started = std::time::Instant::now();

            let outcome = self.run_phase(phase, &mut execution).await;

            self.observer.on_phase_end(&execution.id, phase).await;
            trace!(phase = phase.as_str(), elapsed_ms = started.elapsed().as_millis(), "phase finished");

            if let Err(message) = outcome {
                execution.mark_failed(message);
                return execution;
            }
        }

        execution.mark_completed();
        execution
    }

    async fn run_phase(&self, phase: Phase, execution: &mut Execution) -> Result<(), String> {
        match phase {
            Phase::Inspiration => {
                execution.inspiration = Some(self.body.inspiration(execution).await?);
            }
            Phase::Goals => {
                execution.goals = Some(self.body.goals(execution).await?);
            }
            Phase::Tasks => {
                let mut tasks = self.body.tasks(execution).await?;
                tasks.sort_by_key(|t| t.order);
                if self.enforce_allowlist {
                    check_allowlist(&tasks, execution)?;
                }
                execution.tasks = tasks;
            }
            Phase::Run => {
                let continue_on_failure = execution.robot.as_ref().is_some_and(|r| r.continue_on_failure);
                let mut aborted = false;
                for (index, task) in execution.tasks.clone().iter().enumerate() {
                    execution.current = Some(crate::domain::models::RunProgress {
                        task_index: index,
                        progress: format!("running task {}", task.order),
                    });
                    if aborted {
                        execution.results.push(crate::domain::models::TaskResult {
                            order: task.order,
                            succeeded: false,
                            output: String::new(),
                            skipped: true,
                        });
                        continue;
                    }
                    let mut result = self.body.run_task(execution, task).await?;
                    if result.succeeded {
                        if let Err(reason) = super::validator::validate(&result.output, &task.validation_rules) {
                            trace!(task_order = task.order, reason = %reason, "task output failed deterministic validation");
                            result.succeeded = false;
                        }
                    }
                    let failed = !result.succeeded;
                    execution.results.push(result);
                    if failed && !continue_on_failure {
                        aborted = true;
                    }
                }
                if aborted {
                    return Err("task execution aborted: a task failed and continue_on_failure is disabled".to_string());
                }
            }
            Phase::Delivery => {
                let result = self.body.delivery(execution).await?;
                if !result.overall_succeeded() {
                    return Err("delivery failed: no target succeeded".to_string());
                }
                execution.delivery = Some(result);
            }
            Phase::Learning => {
                execution.learning = self.body.learning(execution).await?;
            }
        }
        Ok(())
    }
}

fn check_allowlist(tasks: &[crate::domain::models::Task], execution: &Execution) -> Result<(), String> {
    let Some(view) = execution.robot.as_ref() else {
        return Ok(());
    };
    for task in tasks {
        if task.executor_type == TaskExecutorType::Assistant && !view.agent_allowlist.is_empty() && !view.agent_allowlist.contains(&task.executor_id) {
            return Err(format!("agent '{}' not in sandbox allow-list", task.executor_id));
        }
    }
    Ok(())
}

#[async_trait]
impl PhaseExecutor for PhaseBodyExecutor {
    #[instrument(skip(self, robot, data, control), fields(exec_id = %exec_id, mode = self.mode.as_str()), err)]
    async fn execute_with_control(
        &self,
        robot: Arc<Robot>,
        trigger: TriggerType,
        data: serde_json::Value,
        exec_id: String,
        control: ControlHandle,
    ) -> Result<Execution, ExecutionError> {
        let input: TriggerInput = serde_json::from_value(data).unwrap_or_default();
        let view = robot.view();

        if !robot.try_acquire_slot(&exec_id) {
            return Err(ExecutionError::QuotaExceeded);
        }
        let _guard = SlotGuard { robot: robot.clone(), exec_id: exec_id.clone() };

        if control.cancel.is_cancelled() {
            let mut execution = Execution::new(exec_id, view, trigger, input);
            execution.mark_cancelled();
            return Ok(execution);
        }
        control.pause_gate.wait_if_paused(&control.cancel).await;
        if control.cancel.is_cancelled() {
            let mut execution = Execution::new(exec_id, view, trigger, input);
            execution.mark_cancelled();
            return Ok(execution);
        }

        let execution = match self.timeout {
            None => self.run_pipeline(view, trigger, input, exec_id, &control).await,
            Some(timeout) => {
                let fallback_view = robot.view();
                let fallback_id = exec_id.clone();
                match tokio::time::timeout(timeout, self.run_pipeline(view, trigger, input.clone(), exec_id, &control)).await {
                    Ok(execution) => execution,
                    Err(_elapsed) => {
                        let mut execution = Execution::new(fallback_id, fallback_view, trigger, input);
                        execution.mark_failed("execution timeout exceeded");
                        execution
                    }
                }
            }
        };

        self.sink.record(&execution).await;
        Ok(execution)
    }
}
