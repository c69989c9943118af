//! Deterministic rule-based validation of a task's output (P3 layer (a)).
//!
//! This is the pure, core-owned half of task validation: string/structural
//! assertions with no external call. The LLM-judged "semantic" half the
//! spec describes is out of scope for this core (see `SPEC_FULL.md`) and
//! is left to whatever standard body a `PhaseBody` implementation delegates
//! to; `Script` rules fall into that category too, so they pass here
//! unevaluated rather than being silently dropped from the `Task`.

use serde_json::Value;

use crate::domain::models::ValidationRule;

/// Runs every rule against `output` in order, short-circuiting on the first
/// failure.
pub fn validate(output: &str, rules: &[ValidationRule]) -> Result<(), String> {
    for rule in rules {
        check_rule(output, rule)?;
    }
    Ok(())
}

fn check_rule(output: &str, rule: &ValidationRule) -> Result<(), String> {
    match rule {
        ValidationRule::Equals { expected } => {
            if output != expected {
                return Err(format!("output does not equal expected value '{expected}'"));
            }
        }
        ValidationRule::Contains { needle } => {
            if !output.contains(needle.as_str()) {
                return Err(format!("output does not contain '{needle}'"));
            }
        }
        ValidationRule::NotContains { needle } => {
            if output.contains(needle.as_str()) {
                return Err(format!("output contains forbidden substring '{needle}'"));
            }
        }
        ValidationRule::Regex { pattern } => {
            let re = regex::Regex::new(pattern).map_err(|e| format!("invalid regex '{pattern}': {e}"))?;
            if !re.is_match(output) {
                return Err(format!("output does not match pattern '{pattern}'"));
            }
        }
        ValidationRule::JsonPath { path, expected } => {
            let value: Value = serde_json::from_str(output).map_err(|e| format!("output is not valid JSON: {e}"))?;
            let actual = lookup_path(&value, path).ok_or_else(|| format!("json path '{path}' not found in output"))?;
            if actual != expected {
                return Err(format!("json path '{path}' did not match expected value"));
            }
        }
        ValidationRule::Type { expected } => {
            let value: Value = serde_json::from_str(output).map_err(|e| format!("output is not valid JSON: {e}"))?;
            let actual = json_type_name(&value);
            if actual != expected {
                return Err(format!("expected json type '{expected}', got '{actual}'"));
            }
        }
        ValidationRule::Script { .. } => {}
    }
    Ok(())
}

/// Dotted-path lookup into a JSON object tree, e.g. `"result.status"`.
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = current.get(segment)?;
    }
    Some(current)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_passes_and_fails() {
        let rules = vec![ValidationRule::Equals { expected: "ok".to_string() }];
        assert!(validate("ok", &rules).is_ok());
        assert!(validate("not-ok", &rules).is_err());
    }

    #[test]
    fn contains_and_not_contains() {
        let rules = vec![
            ValidationRule::Contains { needle: "succ".to_string() },
            ValidationRule::NotContains { needle: "error".to_string() },
        ];
        assert!(validate("operation succeeded", &rules).is_ok());
        assert!(validate("operation succeeded with error", &rules).is_err());
    }

    #[test]
    fn regex_matches() {
        let rules = vec![ValidationRule::Regex { pattern: r"^\d+ items$".to_string() }];
        assert!(validate("42 items", &rules).is_ok());
        assert!(validate("forty-two items", &rules).is_err());
    }

    #[test]
    fn json_path_matches_nested_field() {
        let rules = vec![ValidationRule::JsonPath {
            path: "result.status".to_string(),
            expected: Value::String("done".to_string()),
        }];
        assert!(validate(r#"{"result":{"status":"done"}}"#, &rules).is_ok());
        assert!(validate(r#"{"result":{"status":"pending"}}"#, &rules).is_err());
    }

    #[test]
    fn type_check_matches_json_value_kind() {
        let rules = vec![ValidationRule::Type { expected: "array".to_string() }];
        assert!(validate("[1,2,3]", &rules).is_ok());
        assert!(validate(r#"{"a":1}"#, &rules).is_err());
    }

    #[test]
    fn script_rule_is_not_evaluated_here() {
        let rules = vec![ValidationRule::Script { source: "return true".to_string() }];
        assert!(validate("anything", &rules).is_ok());
    }
}
