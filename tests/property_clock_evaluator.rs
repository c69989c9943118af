use chrono::{Duration as ChronoDuration, Utc};
use proptest::prelude::*;
use robotsched::domain::models::{
    ClockConfig, ExecutorMode, Quota, Robot, RobotConfig, RobotResources, TriggerFlags,
};
use robotsched::services::clock_evaluator::should_fire;

fn robot_with_interval(every_ms: u64) -> Robot {
    let config = RobotConfig {
        identity: "bot".to_string(),
        quota: Quota::default(),
        triggers: TriggerFlags::all_enabled(),
        clock: Some(ClockConfig::interval_mode(format!("{every_ms}ms"))),
        resources: RobotResources::default(),
        delivery: Vec::new(),
        events_enabled: true,
        executor_mode: ExecutorMode::DryRun,
        agent_allowlist: Vec::new(),
        continue_on_failure: false,
    };
    Robot::new("bot-1", "t1", config)
}

proptest! {
    /// Property: an interval-mode clock never fires twice for the same
    /// `last_run` before at least `every` has elapsed, and always fires once
    /// it has.
    #[test]
    fn prop_interval_mode_never_fires_before_its_interval_elapses(
        every_ms in 10u64..5000,
        elapsed_ms in 0u64..10000,
    ) {
        let robot = robot_with_interval(every_ms);
        let t0 = Utc::now();
        robot.set_last_run(t0);
        let now = t0 + ChronoDuration::milliseconds(elapsed_ms as i64);

        let fired = should_fire(&robot, now);
        if elapsed_ms < every_ms {
            prop_assert!(!fired, "fired after only {elapsed_ms}ms with interval {every_ms}ms");
        } else {
            prop_assert!(fired, "did not fire after {elapsed_ms}ms with interval {every_ms}ms");
        }
    }

    /// Property: an interval-mode clock with no prior run always fires,
    /// regardless of the configured interval.
    #[test]
    fn prop_interval_mode_always_fires_on_first_run(every_ms in 10u64..10000) {
        let robot = robot_with_interval(every_ms);
        prop_assert!(should_fire(&robot, Utc::now()));
    }
}
