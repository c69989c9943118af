//! Robot domain model.
//!
//! A `Robot` is a scheduled entity: identity, triggers, quota, and a
//! configured clock. It is not a network endpoint. The cache (C1) owns the
//! canonical mutable `Robot`; executions carry an immutable `RobotView`
//! snapshot instead of a live reference so cache eviction never leaves a
//! dangling pointer (see DESIGN.md, "RobotView vs Robot").

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::RobotError;

/// Lifecycle status of a robot. Paused, error, and maintenance robots are
/// skipped by the clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    /// Idle, eligible to be triggered.
    Idle,
    /// Currently has at least one in-flight execution.
    Working,
    /// Manually paused; skipped by clock tick and rejects new triggers.
    Paused,
    /// In an error state; skipped by clock tick and rejects new triggers.
    Error,
    /// Under maintenance; skipped by clock tick and rejects new triggers.
    Maintenance,
}

impl RobotStatus {
    /// Robots in these statuses are never fired by the clock tick and
    /// reject new manual/event triggers with `RobotError::Paused`.
    pub fn is_runnable(self) -> bool {
        matches!(self, Self::Idle | Self::Working)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Paused => "paused",
            Self::Error => "error",
            Self::Maintenance => "maintenance",
        }
    }
}

/// Clock firing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// Fires at specific `HH:MM` times on specific days.
    Times,
    /// Fires every `every` duration since the last firing.
    Interval,
    /// Fires continuously, throttled only by quota.
    Daemon,
}

/// Per-robot clock trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    pub mode: ClockMode,
    /// `"HH:MM"` strings, used by `times` mode.
    #[serde(default)]
    pub times: Vec<String>,
    /// Weekday abbreviations/full names or `"*"`; empty means all days.
    #[serde(default)]
    pub days: Vec<String>,
    /// Duration string (e.g. `"30m"`, `"2h"`), used by `interval` mode.
    #[serde(default)]
    pub every: Option<String>,
    /// Advisory timeout string; enforced only by the sandbox executor.
    #[serde(default)]
    pub timeout: Option<String>,
    /// IANA timezone name; empty/absent falls back to UTC.
    #[serde(default)]
    pub tz: Option<String>,
}

impl ClockConfig {
    pub fn times_mode(times: Vec<String>) -> Self {
        Self {
            mode: ClockMode::Times,
            times,
            days: Vec::new(),
            every: None,
            timeout: None,
            tz: None,
        }
    }

    pub fn interval_mode(every: impl Into<String>) -> Self {
        Self {
            mode: ClockMode::Interval,
            times: Vec::new(),
            days: Vec::new(),
            every: Some(every.into()),
            timeout: None,
            tz: None,
        }
    }

    pub fn daemon_mode() -> Self {
        Self {
            mode: ClockMode::Daemon,
            times: Vec::new(),
            days: Vec::new(),
            every: None,
            timeout: None,
            tz: None,
        }
    }

    pub fn with_days(mut self, days: Vec<String>) -> Self {
        self.days = days;
        self
    }

    pub fn with_tz(mut self, tz: impl Into<String>) -> Self {
        self.tz = Some(tz.into());
        self
    }
}

/// Per-robot quota: max concurrent executions, per-robot queue cap, priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quota {
    /// Maximum concurrent executions.
    pub max: usize,
    /// Per-robot queue cap; 0 means "use the default of 10".
    #[serde(default)]
    pub queue: usize,
    /// Scheduling priority; higher values schedule first.
    #[serde(default)]
    pub priority: u8,
}

impl Quota {
    /// Effective per-robot queue cap (0 in config means "default to 10").
    pub fn effective_queue(&self) -> usize {
        if self.queue == 0 {
            10
        } else {
            self.queue
        }
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            max: 1,
            queue: 0,
            priority: 0,
        }
    }
}

/// Enable-flags for each trigger kind.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TriggerFlags {
    #[serde(default = "default_true")]
    pub clock: bool,
    #[serde(default = "default_true")]
    pub human: bool,
    #[serde(default = "default_true")]
    pub event: bool,
}

const fn default_true() -> bool {
    true
}

impl TriggerFlags {
    pub const fn all_enabled() -> Self {
        Self {
            clock: true,
            human: true,
            event: true,
        }
    }
}

/// Executor mode a robot prefers when a trigger does not specify one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorMode {
    #[default]
    Standard,
    #[serde(rename = "dryrun")]
    DryRun,
    Sandbox,
}

impl ExecutorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::DryRun => "dryrun",
            Self::Sandbox => "sandbox",
        }
    }
}

/// Resources the P2/P3 phases may assign tasks to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RobotResources {
    pub agents: Vec<String>,
    pub mcp_tools: Vec<String>,
    pub processes: Vec<String>,
}

/// A single delivery target within a channel (e.g. one email address).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub channel: DeliveryChannel,
    pub address: String,
}

/// Delivery sink kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    Email,
    Webhook,
    Process,
}

/// Robot configuration: identity, quota, triggers, clock, resources,
/// delivery targets, and executor preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    pub identity: String,
    pub quota: Quota,
    pub triggers: TriggerFlags,
    pub clock: Option<ClockConfig>,
    #[serde(default)]
    pub resources: RobotResources,
    #[serde(default)]
    pub delivery: Vec<DeliveryTarget>,
    #[serde(default)]
    pub events_enabled: bool,
    /// Preferred executor mode; overridden by a per-request mode.
    #[serde(default)]
    pub executor_mode: ExecutorMode,
    /// Agent allow-list consulted (only) by the sandbox executor.
    #[serde(default)]
    pub agent_allowlist: Vec<String>,
    /// Continue running remaining P3 tasks (marked skipped) after one fails.
    #[serde(default)]
    pub continue_on_failure: bool,
}

impl RobotConfig {
    pub fn validate(&self) -> Result<(), RobotError> {
        if self.identity.is_empty() {
            return Err(RobotError::InvalidConfig(
                "identity must not be empty".to_string(),
            ));
        }
        if self.quota.max == 0 {
            return Err(RobotError::InvalidConfig(
                "quota.max must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot of a robot's identity/config/quota an execution carries, taken
/// at admission time. Cache eviction of the underlying `Robot` must never
/// invalidate a `RobotView` an in-flight execution already holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotView {
    pub member_id: String,
    pub team_id: String,
    pub identity: String,
    pub resources: RobotResources,
    pub quota: Quota,
    pub delivery: Vec<DeliveryTarget>,
    pub executor_mode: ExecutorMode,
    pub agent_allowlist: Vec<String>,
    pub continue_on_failure: bool,
}

/// A scheduled entity the manager may trigger.
///
/// `executions` tracks in-flight execution ids; `try_acquire_slot` /
/// `remove_execution` are the only paths allowed to mutate it, and
/// `try_acquire_slot` is the atomic admission gate: it must check
/// `|executions| < quota.max` and insert under the same lock acquisition.
#[derive(Debug)]
pub struct Robot {
    pub member_id: String,
    pub team_id: String,
    pub status: RobotStatus,
    pub autonomous_mode: bool,
    pub config: RobotConfig,
    last_run: Mutex<Option<DateTime<Utc>>>,
    executions: Mutex<HashSet<String>>,
}

impl Robot {
    pub fn new(member_id: impl Into<String>, team_id: impl Into<String>, config: RobotConfig) -> Self {
        Self {
            member_id: member_id.into(),
            team_id: team_id.into(),
            status: RobotStatus::Idle,
            autonomous_mode: false,
            config,
            last_run: Mutex::new(None),
            executions: Mutex::new(HashSet::new()),
        }
    }

    /// Last time this robot's clock fired, behind a mutex so the shared
    /// `Arc<Robot>` cache entries can be updated from the ticker task.
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        *self.last_run.lock().expect("last_run mutex poisoned")
    }

    pub fn set_last_run(&self, at: DateTime<Utc>) {
        *self.last_run.lock().expect("last_run mutex poisoned") = Some(at);
    }

    pub fn autonomous(mut self) -> Self {
        self.autonomous_mode = true;
        self
    }

    /// Number of executions currently counted against this robot's quota.
    pub fn running_count(&self) -> usize {
        self.executions.lock().expect("executions mutex poisoned").len()
    }

    /// Non-atomic hint used by the worker pool's pre-check; the authoritative
    /// check is `try_acquire_slot`.
    pub fn can_run(&self) -> bool {
        self.running_count() < self.config.quota.max
    }

    /// Atomically admit `exec_id` if a quota slot is free. This is the only
    /// path that may increase the in-flight execution count.
    pub fn try_acquire_slot(&self, exec_id: &str) -> bool {
        let mut executions = self.executions.lock().expect("executions mutex poisoned");
        if executions.len() >= self.config.quota.max {
            return false;
        }
        executions.insert(exec_id.to_string());
        true
    }

    /// Release a quota slot. Idempotent: removing an id that isn't tracked
    /// is a no-op, matching the "any exit path releases the slot" contract.
    pub fn remove_execution(&self, exec_id: &str) {
        self.executions.lock().expect("executions mutex poisoned").remove(exec_id);
    }

    pub fn view(&self) -> RobotView {
        RobotView {
            member_id: self.member_id.clone(),
            team_id: self.team_id.clone(),
            identity: self.config.identity.clone(),
            resources: self.config.resources.clone(),
            quota: self.config.quota,
            delivery: self.config.delivery.clone(),
            executor_mode: self.config.executor_mode,
            agent_allowlist: self.config.agent_allowlist.clone(),
            continue_on_failure: self.config.continue_on_failure,
        }
    }

    /// Whether a clock-mode trigger is even worth evaluating: enabled,
    /// configured, and the robot isn't paused/error/maintenance.
    pub fn clock_eligible(&self) -> bool {
        self.status.is_runnable() && self.config.triggers.clock && self.config.clock.is_some()
    }
}
