//! Execution domain model: one triggered traversal of the six-phase
//! pipeline for one robot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::robot::RobotView;

/// The cause of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Clock,
    Human,
    Event,
}

impl TriggerType {
    /// Scheduling priority contribution: human preempts event preempts clock.
    pub fn priority(self) -> u32 {
        match self {
            Self::Human => 10,
            Self::Event => 5,
            Self::Clock => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Human => "human",
            Self::Event => "event",
        }
    }
}

/// One stage of the six-phase pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Inspiration,
    Goals,
    Tasks,
    Run,
    Delivery,
    Learning,
}

impl Phase {
    /// The fixed pipeline order, index 0 is `Inspiration`.
    pub const ORDER: [Phase; 6] = [
        Phase::Inspiration,
        Phase::Goals,
        Phase::Tasks,
        Phase::Run,
        Phase::Delivery,
        Phase::Learning,
    ];

    /// Starting phase index for a trigger kind: clock runs all six phases,
    /// human/event triggers skip P0 (Inspiration).
    pub fn start_index(trigger: TriggerType) -> usize {
        match trigger {
            TriggerType::Clock => 0,
            TriggerType::Human | TriggerType::Event => 1,
        }
    }

    pub fn index(self) -> usize {
        Self::ORDER.iter().position(|p| *p == self).expect("Phase::ORDER is exhaustive")
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inspiration => "inspiration",
            Self::Goals => "goals",
            Self::Tasks => "tasks",
            Self::Run => "run",
            Self::Delivery => "delivery",
            Self::Learning => "learning",
        }
    }
}

/// Externally observable execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Canonical phase-input shape regardless of trigger source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerInput {
    pub clock: Option<ClockContext>,
    pub action: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
    pub source: Option<String>,
    pub event_type: Option<String>,
    pub data: Option<Value>,
    pub user_id: Option<String>,
}

/// Context handed to P0 Inspiration for a clock-triggered run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockContext {
    pub fired_at: DateTime<Utc>,
    pub mode: String,
}

/// Markdown report produced by P0.
pub type InspirationReport = String;

/// P1 output: a goals document plus an optional delivery target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Goals {
    pub content: String,
    pub delivery_target: Option<String>,
}

/// The kind of adapter a P2 task is routed to in P3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskExecutorType {
    Assistant,
    Mcp,
    Process,
}

/// An ordered unit of work produced by P2, consumed by P3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub executor_type: TaskExecutorType,
    pub executor_id: String,
    pub messages: Vec<String>,
    pub expected_output: String,
    pub validation_rules: Vec<ValidationRule>,
    pub order: u32,
}

/// A deterministic assertion rule applied to a task's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationRule {
    Equals { expected: String },
    Contains { needle: String },
    NotContains { needle: String },
    Regex { pattern: String },
    JsonPath { path: String, expected: Value },
    Type { expected: String },
    Script { source: String },
}

/// P3 progress marker for the task currently in flight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunProgress {
    pub task_index: usize,
    pub progress: String,
}

/// Outcome of one P3 task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub order: u32,
    pub succeeded: bool,
    pub output: String,
    pub skipped: bool,
}

/// Content produced by the P4 delivery agent before fan-out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryContent {
    pub summary: String,
    pub body: String,
    pub attachments: Vec<String>,
}

/// Per-target delivery outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTargetResult {
    pub address: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// Aggregated P4 outcome: succeeds overall if at least one target succeeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub content: DeliveryContent,
    pub targets: Vec<DeliveryTargetResult>,
}

impl DeliveryResult {
    /// At-least-one-target delivery policy: P4 only fails if nothing
    /// succeeded (and there was at least one target to try).
    pub fn overall_succeeded(&self) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|t| t.succeeded)
    }
}

/// A single P5 learning entry written to the robot's knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEntry {
    pub execution_summary: String,
    pub feedback: String,
    pub insight: String,
}

/// One triggered traversal of the six-phase pipeline for one robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub member_id: String,
    pub team_id: String,
    pub trigger_type: TriggerType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub phase: Phase,
    pub input: TriggerInput,

    pub inspiration: Option<InspirationReport>,
    pub goals: Option<Goals>,
    pub tasks: Vec<Task>,
    pub results: Vec<TaskResult>,
    pub delivery: Option<DeliveryResult>,
    pub learning: Vec<LearningEntry>,

    pub current: Option<RunProgress>,
    pub error: Option<String>,

    #[serde(skip)]
    pub robot: Option<RobotView>,
}

impl Execution {
    pub fn new(id: impl Into<String>, robot: RobotView, trigger_type: TriggerType, input: TriggerInput) -> Self {
        let start_index = Phase::start_index(trigger_type);
        Self {
            id: id.into(),
            member_id: robot.member_id.clone(),
            team_id: robot.team_id.clone(),
            trigger_type,
            start_time: Utc::now(),
            end_time: None,
            status: ExecutionStatus::Pending,
            phase: Phase::ORDER[start_index],
            input,
            inspiration: None,
            goals: None,
            tasks: Vec::new(),
            results: Vec::new(),
            delivery: None,
            learning: Vec::new(),
            current: None,
            error: None,
            robot: Some(robot),
        }
    }

    /// Mark running and transition from `pending`.
    pub fn mark_running(&mut self) {
        self.status = ExecutionStatus::Running;
    }

    pub fn mark_completed(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.end_time = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(message.into());
        self.end_time = Some(Utc::now());
    }

    pub fn mark_cancelled(&mut self) {
        self.status = ExecutionStatus::Cancelled;
        self.end_time = Some(Utc::now());
    }

    /// The list of phases this execution is expected to traverse, given its
    /// trigger kind (clock runs all six, human/event skip Inspiration).
    pub fn expected_phases(&self) -> &'static [Phase] {
        &Phase::ORDER[Phase::start_index(self.trigger_type)..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::robot::{ExecutorMode, Quota, RobotResources};

    fn view() -> RobotView {
        RobotView {
            member_id: "m1".to_string(),
            team_id: "t1".to_string(),
            identity: "bot".to_string(),
            resources: RobotResources::default(),
            quota: Quota::default(),
            delivery: Vec::new(),
            executor_mode: ExecutorMode::Standard,
            agent_allowlist: Vec::new(),
            continue_on_failure: false,
        }
    }

    #[test]
    fn clock_trigger_starts_at_inspiration() {
        let exec = Execution::new("e1", view(), TriggerType::Clock, TriggerInput::default());
        assert_eq!(exec.phase, Phase::Inspiration);
        assert_eq!(exec.expected_phases(), &Phase::ORDER[..]);
    }

    #[test]
    fn human_trigger_skips_inspiration() {
        let exec = Execution::new("e1", view(), TriggerType::Human, TriggerInput::default());
        assert_eq!(exec.phase, Phase::Goals);
        assert_eq!(exec.expected_phases(), &Phase::ORDER[1..]);
    }

    #[test]
    fn event_trigger_skips_inspiration() {
        let exec = Execution::new("e1", view(), TriggerType::Event, TriggerInput::default());
        assert_eq!(exec.phase, Phase::Goals);
    }

    #[test]
    fn trigger_priority_ordering() {
        assert!(TriggerType::Human.priority() > TriggerType::Event.priority());
        assert!(TriggerType::Event.priority() > TriggerType::Clock.priority());
    }

    #[test]
    fn terminal_statuses() {
        assert!(ExecutionStatus::Completed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
    }

    #[test]
    fn delivery_result_succeeds_with_one_target() {
        let mut result = DeliveryResult::default();
        result.targets.push(DeliveryTargetResult {
            address: "a@example.com".to_string(),
            succeeded: false,
            error: Some("smtp down".to_string()),
        });
        result.targets.push(DeliveryTargetResult {
            address: "b@example.com".to_string(),
            succeeded: true,
            error: None,
        });
        assert!(result.overall_succeeded());
    }

    #[test]
    fn delivery_result_fails_with_no_successes() {
        let mut result = DeliveryResult::default();
        result.targets.push(DeliveryTargetResult {
            address: "a@example.com".to_string(),
            succeeded: false,
            error: Some("smtp down".to_string()),
        });
        assert!(!result.overall_succeeded());
    }

    #[test]
    fn lifecycle_transitions() {
        let mut exec = Execution::new("e1", view(), TriggerType::Clock, TriggerInput::default());
        assert_eq!(exec.status, ExecutionStatus::Pending);
        exec.mark_running();
        assert_eq!(exec.status, ExecutionStatus::Running);
        exec.mark_completed();
        assert_eq!(exec.status, ExecutionStatus::Completed);
        assert!(exec.end_time.is_some());
    }
}
