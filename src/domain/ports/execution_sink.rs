//! Persistence hook for finished executions.
//!
//! The core is persistence-agnostic about execution history the same way
//! `RobotStore` is about robot definitions: workers report terminal
//! executions through this port and the caller decides whether that means
//! a database row, a log line, or nothing at all.

use async_trait::async_trait;

use crate::domain::models::Execution;

#[async_trait]
pub trait ExecutionSink: Send + Sync {
    async fn record(&self, execution: &Execution);
}

/// An `ExecutionSink` that discards everything, for tests and the demo
/// binary where `Manager::list_executions*` is sourced from the in-memory
/// controller map instead.
pub struct NullExecutionSink;

#[async_trait]
impl ExecutionSink for NullExecutionSink {
    async fn record(&self, _execution: &Execution) {}
}
