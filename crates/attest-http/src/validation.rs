//! Response validation contracts (§4.2 "Response validation contracts").
//! None of these throw; they return a boolean success, except for missing
//! response / invalid schema which surface as `AgentError`.

use std::collections::BTreeMap;

use attest_core::error::AgentError;

use crate::history::HttpResponseRecord;

pub fn validate_status(
    response: Option<&HttpResponseRecord>,
    expected: u16,
) -> Result<bool, AgentError> {
    let response = response.ok_or_else(|| {
        AgentError::NoResponse("validate_status called before any request".to_string())
    })?;
    Ok(response.status == expected)
}

pub fn validate_headers(
    response: Option<&HttpResponseRecord>,
    expected: &BTreeMap<String, String>,
) -> Result<bool, AgentError> {
    let response = response.ok_or_else(|| {
        AgentError::NoResponse("validate_headers called before any request".to_string())
    })?;
    for (expected_name, expected_value) in expected {
        let actual = response
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(expected_name))
            .map(|(_, value)| value);
        if actual != Some(expected_value) {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn validate_response(
    response: Option<&HttpResponseRecord>,
    expected: &str,
) -> Result<bool, AgentError> {
    let response = response.ok_or_else(|| {
        AgentError::NoResponse("validate_response called before any request".to_string())
    })?;
    if let Ok(expected_json) = serde_json::from_str::<serde_json::Value>(expected) {
        return Ok(expected_json == response.data);
    }
    let actual_text = match &response.data {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    Ok(actual_text.contains(expected))
}

pub fn validate_schema(
    response: Option<&HttpResponseRecord>,
    validation_enabled: bool,
    schema: &str,
) -> Result<bool, AgentError> {
    let response = response.ok_or_else(|| {
        AgentError::NoResponse("validate_schema called before any request".to_string())
    })?;
    if !validation_enabled {
        return Err(AgentError::Action(
            "validate_schema requires validation.enabled".to_string(),
        ));
    }
    let schema_value: serde_json::Value = serde_json::from_str(schema)
        .map_err(|error| AgentError::InvalidSchema(error.to_string()))?;
    let validator = jsonschema::validator_for(&schema_value)
        .map_err(|error| AgentError::InvalidSchema(error.to_string()))?;
    Ok(validator.is_valid(&response.data))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::{validate_headers, validate_response, validate_schema, validate_status};
    use crate::history::HttpResponseRecord;
    use attest_core::error::AgentError;

    fn response(status: u16, data: serde_json::Value, headers: BTreeMap<String, String>) -> HttpResponseRecord {
        HttpResponseRecord {
            request_id: 1,
            status,
            headers,
            data,
            total_time_ms: 10,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn unit_validate_status_compares_exact_status() {
        let response = response(200, json!({}), BTreeMap::new());
        assert!(validate_status(Some(&response), 200).unwrap());
        assert!(!validate_status(Some(&response), 201).unwrap());
    }

    #[test]
    fn regression_validate_status_without_response_errors() {
        let error = validate_status(None, 200).expect_err("should error");
        assert!(matches!(error, AgentError::NoResponse(_)));
    }

    #[test]
    fn unit_validate_headers_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let response = response(200, json!({}), headers);
        let mut expected = BTreeMap::new();
        expected.insert("content-type".to_string(), "application/json".to_string());
        assert!(validate_headers(Some(&response), &expected).unwrap());
    }

    #[test]
    fn functional_validate_response_parses_json_and_deep_compares() {
        let response = response(200, json!({"ok": true}), BTreeMap::new());
        assert!(validate_response(Some(&response), r#"{"ok":true}"#).unwrap());
        assert!(!validate_response(Some(&response), r#"{"ok":false}"#).unwrap());
    }

    #[test]
    fn functional_validate_response_falls_back_to_substring_match() {
        let response = response(200, json!("hello world"), BTreeMap::new());
        assert!(validate_response(Some(&response), "hello").unwrap());
        assert!(!validate_response(Some(&response), "goodbye").unwrap());
    }

    #[test]
    fn integration_validate_schema_requires_validation_enabled() {
        let response = response(200, json!({"a": 1}), BTreeMap::new());
        let error = validate_schema(Some(&response), false, r#"{"type":"object"}"#)
            .expect_err("should require validation.enabled");
        assert!(matches!(error, AgentError::Action(_)));
    }

    #[test]
    fn integration_validate_schema_validates_against_json_schema() {
        let response = response(200, json!({"a": 1}), BTreeMap::new());
        let schema = r#"{"type":"object","required":["a"]}"#;
        assert!(validate_schema(Some(&response), true, schema).unwrap());

        let response_missing = response(200, json!({}), BTreeMap::new());
        assert!(!validate_schema(Some(&response_missing), true, schema).unwrap());
    }

    #[test]
    fn regression_validate_schema_invalid_schema_string_errors() {
        let response = response(200, json!({}), BTreeMap::new());
        let error = validate_schema(Some(&response), true, "not json")
            .expect_err("invalid schema should fail");
        assert!(matches!(error, AgentError::InvalidSchema(_)));
    }
}
