//! Pause gate and cancellation primitives shared between the execution
//! controller (C5) and the phase executor (C7).
//!
//! Two separate primitives are composed deliberately: a level-triggered
//! blocking gate (`PauseGate`) and a non-blocking cancellation flag
//! (`CancelToken`) checked at phase boundaries. `Stop` releases the gate
//! *before* the cancellation flag is observed by a waiter, so a paused
//! executor wakes up and sees the cancellation rather than re-blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A level-triggered pause gate: `wait_if_paused` blocks while `paused` is
/// set and returns as soon as it's cleared (or cancellation fires).
/// Level-triggered (re-checks the flag after every wake) so a pause that
/// lands between a check and the next `notified()` call is never missed.
#[derive(Clone)]
pub struct PauseGate {
    paused: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self {
            paused: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Clear the pause flag and wake any waiter.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Block until resumed or `cancel` becomes set. Returns immediately if
    /// not currently paused.
    pub async fn wait_if_paused(&self, cancel: &CancelToken) {
        loop {
            if !self.paused.load(Ordering::SeqCst) || cancel.is_cancelled() {
                return;
            }
            let notified = self.notify.notified();
            // Re-check after registering interest to avoid missing a resume
            // that raced between the first check and `notified()`.
            if !self.paused.load(Ordering::SeqCst) || cancel.is_cancelled() {
                return;
            }
            tokio::select! {
                () = notified => {},
                () = cancel.cancelled() => return,
            }
        }
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// A minimal hand-rolled cancellation token: an `AtomicBool` flag plus a
/// `Notify` to wake waiters, used instead of pulling in `tokio-util` for a
/// single primitive.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// The controller's handle for one live execution: what `QueueItem` carries
/// and what the controller map indexes by `exec_id`.
#[derive(Clone)]
pub struct ControlHandle {
    pub exec_id: String,
    pub member_id: String,
    pub team_id: String,
    pub cancel: CancelToken,
    pub pause_gate: PauseGate,
}

impl ControlHandle {
    pub fn new(exec_id: impl Into<String>, member_id: impl Into<String>, team_id: impl Into<String>) -> Self {
        Self {
            exec_id: exec_id.into(),
            member_id: member_id.into(),
            team_id: team_id.into(),
            cancel: CancelToken::new(),
            pause_gate: PauseGate::new(),
        }
    }

    /// `Stop`: cancel, then release the gate so a paused waiter wakes and
    /// observes the cancellation rather than blocking forever.
    pub fn stop(&self) {
        self.cancel.cancel();
        self.pause_gate.resume();
    }
}

/// Externally observable snapshot of one tracked execution, returned by
/// `Manager::get_execution_status` / `list_executions*`.
#[derive(Debug, Clone)]
pub struct ControlledExecutionView {
    pub exec_id: String,
    pub member_id: String,
    pub team_id: String,
    pub is_paused: bool,
    pub is_cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_if_paused_returns_immediately_when_not_paused() {
        let gate = PauseGate::new();
        let cancel = CancelToken::new();
        tokio::time::timeout(Duration::from_millis(50), gate.wait_if_paused(&cancel))
            .await
            .expect("should not block");
    }

    #[tokio::test]
    async fn wait_if_paused_blocks_until_resume() {
        let gate = PauseGate::new();
        let cancel = CancelToken::new();
        gate.pause();

        let gate2 = gate.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            gate2.resume();
        });

        tokio::time::timeout(Duration::from_millis(500), gate.wait_if_paused(&cancel))
            .await
            .expect("should unblock after resume");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stop_wakes_a_paused_waiter() {
        let handle = ControlHandle::new("e1", "m1", "t1");
        handle.pause_gate.pause();

        let h2 = handle.clone();
        let waiter = tokio::spawn(async move {
            h2.pause_gate.wait_if_paused(&h2.cancel).await;
            h2.cancel.is_cancelled()
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop();

        let saw_cancel = tokio::time::timeout(Duration::from_millis(500), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(saw_cancel);
    }
}
