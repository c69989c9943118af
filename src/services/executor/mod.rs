//! Pluggable phase executor (C7): `standard` / `dryrun` / `sandbox`.

pub mod driver;
pub mod dryrun_body;
pub mod validator;

pub use driver::{PhaseBodyExecutor, SIMULATE_FAILURE_SENTINEL};
pub use dryrun_body::DryRunPhaseBody;
pub use validator::validate;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::ExecutorMode;
use crate::domain::ports::{PhaseBody, PhaseExecutor};

/// Default sandbox deadline when a robot's `clock.timeout` doesn't parse.
pub const DEFAULT_SANDBOX_TIMEOUT: Duration = Duration::from_secs(300);

/// Builds the `{mode -> executor}` map the worker pool resolves against.
/// `standard_body` is the real (or test-double) agent/LLM integration;
/// `dryrun`/`sandbox` always use the deterministic mock body regardless of
/// what's passed for `standard_body`, per their contract.
pub fn default_executors(standard_body: Arc<dyn PhaseBody>) -> HashMap<ExecutorMode, Arc<dyn PhaseExecutor>> {
    let dryrun_body: Arc<dyn PhaseBody> = Arc::new(DryRunPhaseBody::new());
    let mut executors: HashMap<ExecutorMode, Arc<dyn PhaseExecutor>> = HashMap::new();
    executors.insert(ExecutorMode::Standard, Arc::new(PhaseBodyExecutor::standard(standard_body)));
    executors.insert(ExecutorMode::DryRun, Arc::new(PhaseBodyExecutor::dryrun(dryrun_body.clone())));
    executors.insert(ExecutorMode::Sandbox, Arc::new(PhaseBodyExecutor::sandbox(dryrun_body, DEFAULT_SANDBOX_TIMEOUT)));
    executors
}
