//! Issue fingerprinting (§4.6): a pure function from failure identity to a
//! stable hash used for deduplication.

use md5::{Digest as Md5Digest, Md5};
use serde::Serialize;
use sha2::{Digest as Sha256Digest, Sha256};

#[derive(Debug, Clone, Serialize)]
struct FingerprintInputs<'a> {
    #[serde(rename = "scenarioId")]
    scenario_id: &'a str,
    #[serde(rename = "errorMessage")]
    error_message: &'a str,
    category: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFingerprint {
    pub scenario_id: String,
    pub error_message: String,
    pub category: String,
    pub stack_trace_hash: Option<String>,
    pub hash: String,
}

fn sha256_hex16(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().take(8).map(|byte| format!("{byte:02x}")).collect()
}

fn md5_hex8(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}

/// `hash = sha256(canonical_json({scenarioId, errorMessage, category})).hex[0:16]`.
/// `category` defaults to `"unknown"` when absent so the fingerprint is
/// still well-defined. Identical inputs always yield identical output.
pub fn compute_fingerprint(
    scenario_id: &str,
    error_message: &str,
    category: Option<&str>,
    stack_trace: Option<&str>,
) -> IssueFingerprint {
    let category = category.unwrap_or("unknown");
    let inputs = FingerprintInputs { scenario_id, error_message, category };
    let canonical = serde_json::to_string(&inputs).expect("fingerprint inputs always serialize");
    let hash = sha256_hex16(canonical.as_bytes());
    let stack_trace_hash = stack_trace.map(|trace| md5_hex8(trace.as_bytes()));

    IssueFingerprint {
        scenario_id: scenario_id.to_string(),
        error_message: error_message.to_string(),
        category: category.to_string(),
        stack_trace_hash,
        hash,
    }
}

/// The literal marker embedded in an issue body for later duplicate lookup.
pub fn fingerprint_marker(hash: &str) -> String {
    format!("<!-- fingerprint:{hash} -->")
}

/// Returns the fingerprint hash embedded in `body`, if any.
pub fn find_fingerprint_marker(body: &str) -> Option<String> {
    let prefix = "<!-- fingerprint:";
    let suffix = " -->";
    let start = body.find(prefix)? + prefix.len();
    let end = body[start..].find(suffix)? + start;
    Some(body[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::{compute_fingerprint, find_fingerprint_marker, fingerprint_marker};

    #[test]
    fn functional_identical_inputs_yield_identical_hash() {
        let first = compute_fingerprint("login", "Button not found", Some("ui"), Some("trace"));
        let second = compute_fingerprint("login", "Button not found", Some("ui"), Some("trace"));
        assert_eq!(first.hash, second.hash);
        assert_eq!(first.stack_trace_hash, second.stack_trace_hash);
        assert_eq!(first.hash.len(), 16);
        assert_eq!(first.stack_trace_hash.unwrap().len(), 8);
    }

    #[test]
    fn regression_different_scenario_id_changes_hash() {
        let first = compute_fingerprint("login", "Button not found", Some("ui"), None);
        let second = compute_fingerprint("signup", "Button not found", Some("ui"), None);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn unit_missing_category_defaults_to_unknown() {
        let fingerprint = compute_fingerprint("login", "boom", None, None);
        assert_eq!(fingerprint.category, "unknown");
        assert!(fingerprint.stack_trace_hash.is_none());
    }

    #[test]
    fn functional_marker_round_trips_through_find() {
        let marker = fingerprint_marker("abcdef0123456789");
        let body = format!("some body text\n\n{marker}");
        assert_eq!(find_fingerprint_marker(&body).as_deref(), Some("abcdef0123456789"));
    }

    #[test]
    fn regression_find_fingerprint_marker_returns_none_without_marker() {
        assert!(find_fingerprint_marker("no marker here").is_none());
    }
}
