//! Extracts the first balanced `{ … }` object from a chat-completion text
//! payload (§6: "a text payload that must contain a JSON object, extracted
//! by the first `{ … }` match"). Malformed or empty responses fail.

use attest_core::error::AgentError;
use serde_json::Value;

pub fn extract_first_json_object(text: &str) -> Result<Value, AgentError> {
    let start = text
        .find('{')
        .ok_or_else(|| AgentError::NoResponse("response contains no JSON object".to_string()))?;

    let bytes = text.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (offset, &byte) in bytes.iter().enumerate().skip(start) {
        let ch = byte as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(offset);
                    break;
                }
            }
            _ => {}
        }
    }

    let end = end.ok_or_else(|| {
        AgentError::NoResponse("response contains an unterminated JSON object".to_string())
    })?;

    let candidate = &text[start..=end];
    serde_json::from_str(candidate)
        .map_err(|error| AgentError::NoResponse(format!("response JSON object is malformed: {error}")))
}

#[cfg(test)]
mod tests {
    use super::extract_first_json_object;

    #[test]
    fn functional_extracts_json_object_embedded_in_prose() {
        let text = "Here is the analysis: {\"category\":\"timeout\",\"confidence\":0.8} — done.";
        let value = extract_first_json_object(text).expect("should extract");
        assert_eq!(value.get("category").and_then(|v| v.as_str()), Some("timeout"));
    }

    #[test]
    fn regression_ignores_braces_inside_string_values() {
        let text = r#"prefix {"note": "looks like a brace } but isn't", "ok": true} suffix"#;
        let value = extract_first_json_object(text).expect("should extract");
        assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn unit_empty_response_fails_with_no_response_error() {
        let error = extract_first_json_object("").expect_err("empty text should fail");
        assert!(matches!(error, attest_core::error::AgentError::NoResponse(_)));
    }

    #[test]
    fn unit_response_without_json_object_fails() {
        let error = extract_first_json_object("no structured content here").expect_err("should fail");
        assert!(matches!(error, attest_core::error::AgentError::NoResponse(_)));
    }

    #[test]
    fn regression_unterminated_object_fails() {
        let error = extract_first_json_object("{\"category\":\"timeout\"").expect_err("should fail");
        assert!(matches!(error, attest_core::error::AgentError::NoResponse(_)));
    }
}
