//! Ports for the pluggable phase executor (C7).
//!
//! `PhaseExecutor` is what the worker pool (C6) calls; it's implemented by
//! the `standard` / `dryrun` / `sandbox` variants in `services::executor`.
//! `PhaseBody` is the pluggable per-phase work the `standard` variant
//! delegates to (an LLM/agent call in production; the core ships no such
//! implementation — see spec.md "Out of scope"). `PhaseObserver` is the
//! optional phase-start/phase-end hook the spec calls for.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::ExecutionError;
use crate::domain::models::{
    ControlHandle, DeliveryResult, Execution, Goals, InspirationReport, LearningEntry, Phase,
    Robot, Task, TaskResult, TriggerType,
};

/// The driver contract the worker pool invokes for every admitted item.
#[async_trait]
pub trait PhaseExecutor: Send + Sync {
    /// Drive one execution through the six-phase pipeline (or phases
    /// 1..6 for non-clock triggers), honoring `control`'s pause gate and
    /// cancellation between phases. Returns the finished `Execution`
    /// record (terminal status already set) on any non-quota outcome;
    /// returns `Err(ExecutionError::QuotaExceeded)` if `robot.try_acquire_slot`
    /// failed, which the worker interprets as "re-enqueue, someone else won".
    async fn execute_with_control(
        &self,
        robot: Arc<Robot>,
        trigger: TriggerType,
        data: serde_json::Value,
        exec_id: String,
        control: ControlHandle,
    ) -> Result<Execution, ExecutionError>;
}

/// Pluggable per-phase work for the `standard` executor variant. Production
/// implementations invoke an LLM/agent; this core only fixes the shape.
#[async_trait]
pub trait PhaseBody: Send + Sync {
    async fn inspiration(&self, execution: &Execution) -> Result<InspirationReport, String>;
    async fn goals(&self, execution: &Execution) -> Result<Goals, String>;
    async fn tasks(&self, execution: &Execution) -> Result<Vec<Task>, String>;
    async fn run_task(&self, execution: &Execution, task: &Task) -> Result<TaskResult, String>;
    async fn delivery(&self, execution: &Execution) -> Result<DeliveryResult, String>;
    async fn learning(&self, execution: &Execution) -> Result<Vec<LearningEntry>, String>;
}

/// Optional phase-start/phase-end observer, e.g. for duration logging.
#[async_trait]
pub trait PhaseObserver: Send + Sync {
    async fn on_phase_start(&self, exec_id: &str, phase: Phase);
    async fn on_phase_end(&self, exec_id: &str, phase: Phase);
}

/// A `PhaseObserver` that does nothing, for callers that don't need hooks.
pub struct NullPhaseObserver;

#[async_trait]
impl PhaseObserver for NullPhaseObserver {
    async fn on_phase_start(&self, _exec_id: &str, _phase: Phase) {}
    async fn on_phase_end(&self, _exec_id: &str, _phase: Phase) {}
}
