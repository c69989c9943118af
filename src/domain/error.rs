//! Domain error types for the scheduling core.
//!
//! Each enum covers errors from one concern, following the convention of
//! one `thiserror` enum per domain area rather than a single flat error
//! type. `ManagerError` composes the others for the public surface.

use thiserror::Error;

/// Errors related to robot lookup and admission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RobotError {
    /// No robot exists with the given member id.
    #[error("robot not found: {0}")]
    NotFound(String),

    /// The robot is paused, in error, or in maintenance and cannot be triggered.
    #[error("robot is paused: {0}")]
    Paused(String),

    /// The trigger kind invoked is disabled on this robot's config.
    #[error("trigger disabled: {0}")]
    TriggerDisabled(String),

    /// The robot's config failed validation (missing identity, bad quota, ...).
    #[error("invalid robot config: {0}")]
    InvalidConfig(String),
}

/// Errors from the bounded priority queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The global queue is at capacity.
    #[error("queue full (max {max} items)")]
    Full {
        /// Configured global capacity.
        max: usize,
    },

    /// The per-robot queued-count cap has been reached.
    #[error("robot queue full for {member_id} (max {max} items)")]
    RobotQueueFull {
        /// The robot whose cap was hit.
        member_id: String,
        /// The per-robot cap.
        max: usize,
    },
}

/// Errors surfaced during or around one execution's lifetime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The robot's concurrency quota was exhausted by the time the worker
    /// tried to admit this execution; the caller should re-enqueue.
    #[error("quota exceeded")]
    QuotaExceeded,

    /// The execution was cancelled via `Stop`, possibly while paused.
    #[error("execution cancelled")]
    Cancelled,

    /// No tracked execution exists with the given id.
    #[error("execution not found: {0}")]
    NotFound(String),

    /// A phase body returned an error; the execution is terminally failed.
    #[error("phase failed: {0}")]
    PhaseFailed(String),

    /// The sandbox executor's deadline elapsed before completion.
    #[error("execution timeout exceeded")]
    Timeout,
}

/// Errors from validating `Intervene` / `HandleEvent` requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The intervention action is not one of the closed set of known actions.
    #[error("unknown intervention action: {0}")]
    UnknownAction(String),
}

/// Top-level error type returned from `Manager` methods.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// A robot-related admission error.
    #[error(transparent)]
    Robot(#[from] RobotError),

    /// A queue capacity error.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// An execution lifecycle error.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A request validation error.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// `start()` was called on an already-started manager.
    #[error("manager already started")]
    AlreadyStarted,

    /// An operation requiring a started manager was called before `start()`.
    #[error("manager not started")]
    NotStarted,

    /// The worker pool has not been started.
    #[error("pool not started")]
    PoolNotStarted,
}
