use robotsched::domain::models::{
    ControlHandle, ExecutorMode, Quota, Robot, RobotConfig, RobotResources, TriggerFlags,
    TriggerType,
};
use robotsched::services::PriorityQueue;
use chrono::Utc;
use proptest::prelude::*;
use std::sync::Arc;

fn config(identity: &str, priority: u8) -> RobotConfig {
    RobotConfig {
        identity: identity.to_string(),
        quota: Quota { max: 1, queue: 1000, priority },
        triggers: TriggerFlags::all_enabled(),
        clock: None,
        resources: RobotResources::default(),
        delivery: Vec::new(),
        events_enabled: true,
        executor_mode: ExecutorMode::DryRun,
        agent_allowlist: Vec::new(),
        continue_on_failure: false,
    }
}

fn queue_item(member_id: &str, trigger: TriggerType, robot_priority: u8) -> robotsched::domain::models::QueueItem {
    let robot = Arc::new(Robot::new(member_id, "t1", config(member_id, robot_priority)));
    robotsched::domain::models::QueueItem {
        robot,
        trigger,
        data: serde_json::Value::Null,
        exec_id: uuid::Uuid::new_v4().to_string(),
        control: ControlHandle::new(uuid::Uuid::new_v4().to_string(), member_id, "t1"),
        executor_mode: ExecutorMode::DryRun,
        enqueued_at: Utc::now(),
    }
}

fn trigger_from_tag(tag: u8) -> TriggerType {
    match tag % 3 {
        0 => TriggerType::Clock,
        1 => TriggerType::Event,
        _ => TriggerType::Human,
    }
}

proptest! {
    /// Property: dequeue order is non-increasing in `QueueItem::score()`.
    ///
    /// For any sequence of enqueues with arbitrary trigger kinds and robot
    /// priorities, draining the queue end-to-end must never produce a pair
    /// of consecutive items where the later one outranks the earlier one.
    #[test]
    fn prop_dequeue_is_never_out_of_priority_order(
        tags in prop::collection::vec((0u8..3, 0u8..10), 1..30)
    ) {
        let queue = PriorityQueue::new(1000);

        for (i, (trigger_tag, robot_priority)) in tags.iter().enumerate() {
            let trigger = trigger_from_tag(*trigger_tag);
            let item = queue_item(&format!("bot-{i}"), trigger, *robot_priority);
            queue.enqueue(item).unwrap();
        }

        let mut last_score: Option<u32> = None;
        while let Some(item) = queue.dequeue() {
            let score = item.score();
            if let Some(prev) = last_score {
                prop_assert!(prev >= score, "dequeue produced score {} after {}, violating priority order", score, prev);
            }
            last_score = Some(score);
        }
    }

    /// Property: the queue never yields more items than were enqueued, and
    /// never loses any once accepted (enqueue only rejects on a full cap,
    /// which this test never hits).
    #[test]
    fn prop_dequeue_count_matches_enqueue_count(
        count in 0usize..50
    ) {
        let queue = PriorityQueue::new(1000);
        for i in 0..count {
            let item = queue_item(&format!("bot-{i}"), TriggerType::Human, 0);
            queue.enqueue(item).unwrap();
        }

        let mut drained = 0;
        while queue.dequeue().is_some() {
            drained += 1;
        }
        prop_assert_eq!(drained, count);
    }
}
