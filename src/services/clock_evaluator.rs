//! Clock trigger evaluation (C3): a pure function over `(robot, now)`.
//!
//! No shared state, no I/O; kept as free functions rather than a struct so
//! call sites don't need to construct anything to evaluate a tick.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Timelike, Utc};
use chrono_tz::Tz;

use crate::domain::models::{ClockMode, Robot};

/// Evaluates whether `robot`'s clock config matches at `now`. Converts `now`
/// into the robot's configured timezone (UTC if unset/unparseable) before
/// any comparison.
pub fn should_fire(robot: &Robot, now: DateTime<Utc>) -> bool {
    let Some(clock) = &robot.config.clock else {
        return false;
    };
    let tz = resolve_tz(clock.tz.as_deref());
    let local_now = now.with_timezone(&tz);

    match clock.mode {
        ClockMode::Times => times_mode_fires(clock, robot.last_run(), now, local_now, tz),
        ClockMode::Interval => interval_mode_fires(clock, robot.last_run(), now),
        ClockMode::Daemon => robot.can_run(),
    }
}

fn resolve_tz(name: Option<&str>) -> Tz {
    name.and_then(|n| n.parse::<Tz>().ok()).unwrap_or(Tz::UTC)
}

fn times_mode_fires(
    clock: &crate::domain::models::ClockConfig,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    local_now: DateTime<Tz>,
    tz: Tz,
) -> bool {
    let hhmm = format!("{:02}:{:02}", local_now.hour(), local_now.minute());
    if !clock.times.iter().any(|t| t == &hhmm) {
        return false;
    }
    if !day_matches(&clock.days, local_now.weekday()) {
        return false;
    }

    // Dedup: convert lastRun into now's timezone *before* comparing day and
    // minute, not the other way around, or a cross-timezone day boundary is
    // missed.
    if let Some(last_run) = last_run {
        let last_local = last_run.with_timezone(&tz);
        let same_day = last_local.date_naive() == local_now.date_naive();
        let same_minute = last_local.hour() == local_now.hour() && last_local.minute() == local_now.minute();
        if same_day && same_minute {
            return false;
        }
    }
    let _ = now;
    true
}

fn day_matches(days: &[String], weekday: chrono::Weekday) -> bool {
    if days.is_empty() || days.iter().any(|d| d == "*") {
        return true;
    }
    days.iter().any(|d| weekday_matches(d, weekday))
}

fn weekday_matches(token: &str, weekday: chrono::Weekday) -> bool {
    let token = token.to_ascii_lowercase();
    let (abbrev, full) = match weekday {
        chrono::Weekday::Mon => ("mon", "monday"),
        chrono::Weekday::Tue => ("tue", "tuesday"),
        chrono::Weekday::Wed => ("wed", "wednesday"),
        chrono::Weekday::Thu => ("thu", "thursday"),
        chrono::Weekday::Fri => ("fri", "friday"),
        chrono::Weekday::Sat => ("sat", "saturday"),
        chrono::Weekday::Sun => ("sun", "sunday"),
    };
    token == abbrev || token == full
}

fn interval_mode_fires(
    clock: &crate::domain::models::ClockConfig,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let Some(every) = clock.every.as_deref().and_then(parse_duration) else {
        return false;
    };
    match last_run {
        None => true,
        Some(last_run) => now.signed_duration_since(last_run) >= every,
    }
}

/// Parses durations like `"100ms"`, `"30s"`, `"30m"`, `"2h"`, `"1d"`.
fn parse_duration(spec: &str) -> Option<ChronoDuration> {
    let spec = spec.trim();
    let split_at = spec.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = spec.split_at(split_at);
    let value: i64 = digits.parse().ok()?;
    match unit {
        "ms" => Some(ChronoDuration::milliseconds(value)),
        "s" => Some(ChronoDuration::seconds(value)),
        "m" => Some(ChronoDuration::minutes(value)),
        "h" => Some(ChronoDuration::hours(value)),
        "d" => Some(ChronoDuration::days(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ClockConfig, Quota, RobotConfig, RobotResources, TriggerFlags};
    use chrono::TimeZone;

    fn robot_with_clock(clock: ClockConfig) -> Robot {
        let config = RobotConfig {
            identity: "bot".to_string(),
            quota: Quota::default(),
            triggers: TriggerFlags::all_enabled(),
            clock: Some(clock),
            resources: RobotResources::default(),
            delivery: Vec::new(),
            events_enabled: true,
            executor_mode: Default::default(),
            agent_allowlist: Vec::new(),
            continue_on_failure: false,
        };
        Robot::new("bot-1", "t1", config)
    }

    #[test]
    fn times_mode_fires_on_exact_minute() {
        let robot = robot_with_clock(
            ClockConfig::times_mode(vec!["09:00".to_string()]).with_tz("Asia/Shanghai"),
        );
        let tick = Tz::Asia__Shanghai
            .with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert!(should_fire(&robot, tick));
    }

    #[test]
    fn times_mode_dedups_within_same_minute() {
        let robot = robot_with_clock(
            ClockConfig::times_mode(vec!["09:00".to_string()]).with_tz("Asia/Shanghai"),
        );
        let tick = Tz::Asia__Shanghai
            .with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        robot.set_last_run(tick);
        let second = tick + ChronoDuration::seconds(30);
        assert!(!should_fire(&robot, second));
    }

    #[test]
    fn times_mode_reenables_across_day_boundary() {
        let robot = robot_with_clock(
            ClockConfig::times_mode(vec!["09:00".to_string()]).with_tz("Asia/Shanghai"),
        );
        let first = Tz::Asia__Shanghai
            .with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        robot.set_last_run(first);
        let next_day = Tz::Asia__Shanghai
            .with_ymd_and_hms(2025, 1, 16, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert!(should_fire(&robot, next_day));
    }

    #[test]
    fn times_mode_respects_day_filter() {
        let robot = robot_with_clock(
            ClockConfig::times_mode(vec!["09:00".to_string()])
                .with_days(vec!["Mon".to_string()])
                .with_tz("UTC"),
        );
        // 2025-01-15 is a Wednesday.
        let wed = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        assert!(!should_fire(&robot, wed));
        let mon = Utc.with_ymd_and_hms(2025, 1, 13, 9, 0, 0).unwrap();
        assert!(should_fire(&robot, mon));
    }

    #[test]
    fn interval_mode_fires_first_run_immediately() {
        let robot = robot_with_clock(ClockConfig::interval_mode("100ms"));
        assert!(should_fire(&robot, Utc::now()));
    }

    #[test]
    fn interval_mode_honors_elapsed_time() {
        let robot = robot_with_clock(ClockConfig::interval_mode("100ms"));
        let t0 = Utc::now();
        robot.set_last_run(t0);
        assert!(!should_fire(&robot, t0 + ChronoDuration::milliseconds(50)));
        assert!(should_fire(&robot, t0 + ChronoDuration::milliseconds(150)));
    }

    #[test]
    fn daemon_mode_fires_whenever_quota_is_free() {
        let robot = robot_with_clock(ClockConfig::daemon_mode());
        assert!(should_fire(&robot, Utc::now()));
        robot.try_acquire_slot("e1");
        assert!(!should_fire(&robot, Utc::now()));
    }
}
