//! Keeps live executions addressable by `exec_id` for out-of-band pause /
//! resume / stop / status operations (C5).

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::instrument;

use crate::domain::error::ExecutionError;
use crate::domain::models::{ControlHandle, ControlledExecutionView, Robot};

/// Single map mutex; each handle's pause gate/cancel token is its own
/// synchronization primitive, so pausing one execution never contends with
/// tracking another.
#[derive(Default)]
pub struct ExecutionController {
    handles: RwLock<HashMap<String, ControlHandle>>,
}

impl ExecutionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates control state before submission; the handle is what the
    /// queue item and the worker both carry.
    pub async fn track(&self, exec_id: &str, member_id: &str, team_id: &str) -> ControlHandle {
        let handle = ControlHandle::new(exec_id, member_id, team_id);
        self.handles.write().await.insert(exec_id.to_string(), handle.clone());
        handle
    }

    /// Called from the worker's completion callback on all terminal paths.
    pub async fn untrack(&self, exec_id: &str) {
        self.handles.write().await.remove(exec_id);
    }

    /// Flips the pause gate; also releases the robot's quota slot so a
    /// paused execution doesn't count toward `quota.max`.
    #[instrument(skip(self, robot), err)]
    pub async fn pause(&self, exec_id: &str, robot: &Robot) -> Result<(), ExecutionError> {
        let handles = self.handles.read().await;
        let handle = handles.get(exec_id).ok_or_else(|| ExecutionError::NotFound(exec_id.to_string()))?;
        handle.pause_gate.pause();
        robot.remove_execution(exec_id);
        Ok(())
    }

    /// Releases the gate and re-inserts a running-execution token into the
    /// robot.
    #[instrument(skip(self, robot), err)]
    pub async fn resume(&self, exec_id: &str, robot: &Robot) -> Result<(), ExecutionError> {
        let handles = self.handles.read().await;
        let handle = handles.get(exec_id).ok_or_else(|| ExecutionError::NotFound(exec_id.to_string()))?;
        handle.pause_gate.resume();
        robot.try_acquire_slot(exec_id);
        Ok(())
    }

    /// Cancels and releases the gate so a paused executor wakes and
    /// observes the cancellation.
    #[instrument(skip(self), err)]
    pub async fn stop(&self, exec_id: &str) -> Result<(), ExecutionError> {
        let handles = self.handles.read().await;
        let handle = handles.get(exec_id).ok_or_else(|| ExecutionError::NotFound(exec_id.to_string()))?;
        handle.stop();
        Ok(())
    }

    pub async fn get(&self, exec_id: &str) -> Option<ControlledExecutionView> {
        self.handles.read().await.get(exec_id).map(view_of)
    }

    pub async fn list(&self) -> Vec<ControlledExecutionView> {
        self.handles.read().await.values().map(view_of).collect()
    }

    pub async fn list_by_member(&self, member_id: &str) -> Vec<ControlledExecutionView> {
        self.handles
            .read()
            .await
            .values()
            .filter(|h| h.member_id == member_id)
            .map(view_of)
            .collect()
    }

    /// Handed to the worker pool / queue item at submission time.
    pub async fn handle(&self, exec_id: &str) -> Option<ControlHandle> {
        self.handles.read().await.get(exec_id).cloned()
    }
}

fn view_of(handle: &ControlHandle) -> ControlledExecutionView {
    ControlledExecutionView {
        exec_id: handle.exec_id.clone(),
        member_id: handle.member_id.clone(),
        team_id: handle.team_id.clone(),
        is_paused: handle.pause_gate.is_paused(),
        is_cancelled: handle.cancel.is_cancelled(),
    }
}
