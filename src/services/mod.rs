//! Application services composing the domain layer into the scheduling
//! core's eight components (C1-C8).

pub mod clock_evaluator;
pub mod executor;
pub mod execution_controller;
pub mod manager;
pub mod priority_queue;
pub mod robot_cache;
pub mod trigger_dispatcher;
pub mod worker_pool;

pub use execution_controller::ExecutionController;
pub use manager::{Manager, ManagerConfig};
pub use priority_queue::PriorityQueue;
pub use robot_cache::RobotCache;
pub use worker_pool::{CompletionHandler, WorkerPool};
