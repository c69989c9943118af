//! Outbound ports the scheduling core depends on. Every port ships at
//! least one in-memory/null adapter so the core is runnable standalone.

pub mod execution_sink;
pub mod phase_executor;
pub mod robot_store;

pub use execution_sink::{ExecutionSink, NullExecutionSink};
pub use phase_executor::{NullPhaseObserver, PhaseBody, PhaseExecutor, PhaseObserver};
pub use robot_store::{InMemoryRobotStore, RobotRecord, RobotStore, LOAD_PAGE_SIZE};
