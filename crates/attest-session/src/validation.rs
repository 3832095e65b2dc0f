//! Output validation operators (§4.3 "Output validation operators").

use attest_core::error::AgentError;
use regex::Regex;
use serde_json::Value;

pub fn validate_output(actual: &str, expected: &Value) -> Result<bool, AgentError> {
    match expected {
        Value::String(text) => validate_string_expectation(actual, text),
        Value::Object(_) => validate_structured_expectation(actual, expected),
        other => Ok(actual.trim() == other.to_string().trim()),
    }
}

fn validate_string_expectation(actual: &str, expected: &str) -> Result<bool, AgentError> {
    if let Some(pattern) = expected.strip_prefix("regex:") {
        let regex = Regex::new(&format!("(?i){pattern}"))
            .map_err(|error| AgentError::action(format!("invalid regex pattern: {error}")))?;
        return Ok(regex.is_match(actual));
    }
    if let Some(substring) = expected.strip_prefix("contains:") {
        return Ok(actual.contains(substring));
    }
    Ok(actual.trim() == expected.trim())
}

fn validate_structured_expectation(actual: &str, expected: &Value) -> Result<bool, AgentError> {
    let kind = expected
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::action("structured expectation requires a 'type' field"))?;
    let value = expected.get("value");
    match kind {
        "json" => {
            let expected_json = value.cloned().unwrap_or(Value::Null);
            let actual_json: Value = serde_json::from_str(actual)
                .map_err(|error| AgentError::action(format!("actual output is not valid json: {error}")))?;
            Ok(actual_json == expected_json)
        }
        "contains" => Ok(actual.contains(value.and_then(Value::as_str).unwrap_or_default())),
        "not_contains" => Ok(!actual.contains(value.and_then(Value::as_str).unwrap_or_default())),
        "starts_with" => Ok(actual.starts_with(value.and_then(Value::as_str).unwrap_or_default())),
        "ends_with" => Ok(actual.ends_with(value.and_then(Value::as_str).unwrap_or_default())),
        "length" => {
            let expected_len = value
                .and_then(Value::as_u64)
                .ok_or_else(|| AgentError::action("length expectation requires a numeric value"))?;
            Ok(actual.len() as u64 == expected_len)
        }
        "empty" => Ok(actual.trim().is_empty()),
        "not_empty" => Ok(!actual.trim().is_empty()),
        other => Err(AgentError::action(format!(
            "unsupported structured expectation type '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::validate_output;

    #[test]
    fn unit_regex_prefix_matches_case_insensitively() {
        assert!(validate_output("Server READY", &json!("regex:server ready")).unwrap());
    }

    #[test]
    fn unit_contains_prefix_matches_substring() {
        assert!(validate_output("listening on :8080", &json!("contains::8080")).unwrap());
    }

    #[test]
    fn functional_plain_string_is_trimmed_equality() {
        assert!(validate_output("  done  ", &json!("done")).unwrap());
        assert!(!validate_output("done!", &json!("done")).unwrap());
    }

    #[test]
    fn integration_structured_json_expectation_deep_compares() {
        let expected = json!({"type": "json", "value": {"ok": true}});
        assert!(validate_output(r#"{"ok":true}"#, &expected).unwrap());
        assert!(!validate_output(r#"{"ok":false}"#, &expected).unwrap());
    }

    #[test]
    fn unit_structured_length_and_empty_operators() {
        assert!(validate_output("abcd", &json!({"type": "length", "value": 4})).unwrap());
        assert!(validate_output("   ", &json!({"type": "empty"})).unwrap());
        assert!(validate_output("x", &json!({"type": "not_empty"})).unwrap());
    }

    #[test]
    fn regression_unknown_structured_type_errors() {
        let error = validate_output("x", &json!({"type": "made_up"})).expect_err("should error");
        assert!(matches!(error, attest_core::error::AgentError::Action(_)));
    }
}
