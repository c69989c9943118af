//! Deterministic mock phase bodies used by the `dryrun` (and, indirectly,
//! `sandbox`) executor variants: no LLM/agent call, optional synthetic
//! delay, fixed outputs. Used for tests and previews.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::models::{
    DeliveryContent, DeliveryResult, DeliveryTargetResult, Execution, Goals, InspirationReport,
    LearningEntry, Task, TaskExecutorType, TaskResult,
};
use crate::domain::ports::PhaseBody;

pub struct DryRunPhaseBody {
    delay: Option<Duration>,
}

impl DryRunPhaseBody {
    pub fn new() -> Self {
        Self { delay: None }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }

    async fn maybe_delay(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for DryRunPhaseBody {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhaseBody for DryRunPhaseBody {
    async fn inspiration(&self, execution: &Execution) -> Result<InspirationReport, String> {
        self.maybe_delay().await;
        Ok(format!("# Inspiration\n\ndry-run report for {}", execution.member_id))
    }

    async fn goals(&self, execution: &Execution) -> Result<Goals, String> {
        self.maybe_delay().await;
        Ok(Goals {
            content: format!("dry-run goals for {}", execution.member_id),
            delivery_target: None,
        })
    }

    async fn tasks(&self, _execution: &Execution) -> Result<Vec<Task>, String> {
        self.maybe_delay().await;
        Ok(vec![Task {
            executor_type: TaskExecutorType::Assistant,
            executor_id: "dry-run-agent".to_string(),
            messages: vec!["noop".to_string()],
            expected_output: "ok".to_string(),
            validation_rules: Vec::new(),
            order: 0,
        }])
    }

    async fn run_task(&self, _execution: &Execution, task: &Task) -> Result<TaskResult, String> {
        self.maybe_delay().await;
        Ok(TaskResult { order: task.order, succeeded: true, output: "dry-run output".to_string(), skipped: false })
    }

    async fn delivery(&self, execution: &Execution) -> Result<DeliveryResult, String> {
        self.maybe_delay().await;
        let targets = execution
            .robot
            .as_ref()
            .map(|view| {
                view.delivery
                    .iter()
                    .map(|target| DeliveryTargetResult { address: target.address.clone(), succeeded: true, error: None })
                    .collect()
            })
            .unwrap_or_default();
        Ok(DeliveryResult {
            content: DeliveryContent {
                summary: "dry-run delivery".to_string(),
                body: "dry-run body".to_string(),
                attachments: Vec::new(),
            },
            targets,
        })
    }

    async fn learning(&self, execution: &Execution) -> Result<Vec<LearningEntry>, String> {
        self.maybe_delay().await;
        Ok(vec![LearningEntry {
            execution_summary: format!("dry-run execution {}", execution.id),
            feedback: "n/a".to_string(),
            insight: "n/a".to_string(),
        }])
    }
}
