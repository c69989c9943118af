//! Domain models: the data shapes the scheduling core operates on.

pub mod control;
pub mod execution;
pub mod queue_item;
pub mod robot;

pub use control::{CancelToken, ControlHandle, ControlledExecutionView, PauseGate};
pub use execution::{
    ClockContext, DeliveryContent, DeliveryResult, DeliveryTargetResult, Execution,
    ExecutionStatus, Goals, InspirationReport, LearningEntry, Phase, RunProgress, Task,
    TaskExecutorType, TaskResult, TriggerInput, TriggerType, ValidationRule,
};
pub use queue_item::{QueueItem, RankedItem};
pub use robot::{
    ClockConfig, ClockMode, DeliveryChannel, DeliveryTarget, ExecutorMode, Quota, Robot,
    RobotConfig, RobotResources, RobotStatus, RobotView, TriggerFlags,
};
