//! robotsched - scheduling and execution core for an autonomous robot fleet.
//!
//! Three layers: `domain` (models, ports, errors, no I/O), `services`
//! (the eight scheduling components composed by `Manager`), and
//! `infrastructure` (config loading, logging setup).

pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::error::{ExecutionError, ManagerError, QueueError, RobotError, ValidationError};
pub use domain::models::{
    ControlledExecutionView, Execution, ExecutionStatus, ExecutorMode, Phase, Robot, RobotConfig,
    RobotStatus, RobotView, TriggerType,
};
pub use domain::ports::{InMemoryRobotStore, PhaseBody, RobotStore};
pub use services::executor::DryRunPhaseBody;
pub use services::{Manager, ManagerConfig};
