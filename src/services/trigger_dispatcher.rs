//! Trigger validation and input normalization (C4). Pure; no I/O.

use serde_json::Value;

use crate::domain::error::ValidationError;
use crate::domain::models::TriggerInput;

/// The closed set of recognized `Intervene` actions.
pub const INTERVENTION_ACTIONS: &[&str] = &[
    "task.add",
    "task.cancel",
    "task.update",
    "goal.adjust",
    "goal.add",
    "goal.complete",
    "goal.cancel",
    "instruct",
    "plan.add",
    "plan.remove",
    "plan.update",
];

/// Raw `Intervene` request before validation.
#[derive(Debug, Clone, Default)]
pub struct InterveneRequest {
    pub member_id: String,
    pub team_id: Option<String>,
    pub action: String,
    pub messages: Vec<String>,
    pub plan_time: Option<chrono::DateTime<chrono::Utc>>,
    pub executor_mode: Option<crate::domain::models::ExecutorMode>,
}

/// Raw `HandleEvent` request before validation.
#[derive(Debug, Clone, Default)]
pub struct EventRequest {
    pub member_id: String,
    pub source: String,
    pub event_type: String,
    pub data: Option<Value>,
    pub executor_mode: Option<crate::domain::models::ExecutorMode>,
}

/// `memberID` non-empty, `action` non-empty and a member of
/// `INTERVENTION_ACTIONS`.
pub fn validate_intervention(req: &InterveneRequest) -> Result<(), ValidationError> {
    if req.member_id.is_empty() {
        return Err(ValidationError::MissingField("member_id"));
    }
    if req.action.is_empty() {
        return Err(ValidationError::MissingField("action"));
    }
    if !INTERVENTION_ACTIONS.contains(&req.action.as_str()) {
        return Err(ValidationError::UnknownAction(req.action.clone()));
    }
    Ok(())
}

/// `memberID`, `source`, `eventType` all non-empty.
pub fn validate_event(req: &EventRequest) -> Result<(), ValidationError> {
    if req.member_id.is_empty() {
        return Err(ValidationError::MissingField("member_id"));
    }
    if req.source.is_empty() {
        return Err(ValidationError::MissingField("source"));
    }
    if req.event_type.is_empty() {
        return Err(ValidationError::MissingField("event_type"));
    }
    Ok(())
}

/// Copies `source`, `event_type`, `data` into the canonical phase-input shape.
pub fn build_event_input(req: &EventRequest) -> TriggerInput {
    TriggerInput {
        source: Some(req.source.clone()),
        event_type: Some(req.event_type.clone()),
        data: req.data.clone(),
        ..Default::default()
    }
}

/// `plan.add` with a future `plan_time` is a recognized deferred
/// intervention: the manager short-circuits to a pending result instead of
/// enqueueing (no plan queue exists yet; this just recognizes the shape).
pub fn is_deferred_plan(req: &InterveneRequest, now: chrono::DateTime<chrono::Utc>) -> bool {
    req.action == "plan.add" && req.plan_time.is_some_and(|t| t > now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn validate_intervention_rejects_missing_member_id() {
        let req = InterveneRequest { action: "instruct".to_string(), ..Default::default() };
        assert!(matches!(
            validate_intervention(&req),
            Err(ValidationError::MissingField("member_id"))
        ));
    }

    #[test]
    fn validate_intervention_rejects_unknown_action() {
        let req = InterveneRequest {
            member_id: "m1".to_string(),
            action: "self.destruct".to_string(),
            ..Default::default()
        };
        assert!(matches!(validate_intervention(&req), Err(ValidationError::UnknownAction(_))));
    }

    #[test]
    fn validate_intervention_accepts_known_action() {
        let req = InterveneRequest {
            member_id: "m1".to_string(),
            action: "task.add".to_string(),
            ..Default::default()
        };
        assert!(validate_intervention(&req).is_ok());
    }

    #[test]
    fn validate_event_requires_all_three_fields() {
        let req = EventRequest { member_id: "m1".to_string(), source: "webhook".to_string(), ..Default::default() };
        assert!(matches!(validate_event(&req), Err(ValidationError::MissingField("event_type"))));
    }

    #[test]
    fn build_event_input_copies_fields() {
        let req = EventRequest {
            member_id: "m1".to_string(),
            source: "webhook".to_string(),
            event_type: "lead.created".to_string(),
            data: Some(serde_json::json!({"id": 1})),
            executor_mode: None,
        };
        let input = build_event_input(&req);
        assert_eq!(input.source.as_deref(), Some("webhook"));
        assert_eq!(input.event_type.as_deref(), Some("lead.created"));
        assert!(input.data.is_some());
    }

    #[test]
    fn plan_add_with_future_time_is_deferred() {
        let now = chrono::Utc::now();
        let req = InterveneRequest {
            member_id: "m1".to_string(),
            action: "plan.add".to_string(),
            plan_time: Some(now + Duration::hours(1)),
            ..Default::default()
        };
        assert!(is_deferred_plan(&req, now));
    }

    #[test]
    fn plan_add_with_past_time_is_not_deferred() {
        let now = chrono::Utc::now();
        let req = InterveneRequest {
            member_id: "m1".to_string(),
            action: "plan.add".to_string(),
            plan_time: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        assert!(!is_deferred_plan(&req, now));
    }
}
