//! Failure pattern extraction (§4.5): message, category, and time-bucket
//! clustering across a batch of failures.

use std::collections::BTreeMap;

use regex::Regex;
use sha2::{Digest, Sha256};

/// One failure as seen by the pattern extractor.
#[derive(Debug, Clone)]
pub struct FailureObservation {
    pub scenario_id: String,
    pub message: String,
    pub category: Option<String>,
    /// Unix seconds; used for 15-minute bucket clustering.
    pub occurred_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailurePattern {
    pub id: String,
    pub kind: PatternKind,
    pub label: String,
    pub scenario_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Message,
    Category,
    TimeCluster,
}

fn normalize_message(message: &str) -> String {
    let number_re = Regex::new(r"\d+").expect("static regex is valid");
    let hex_re = Regex::new(r"\b0x[0-9a-fA-F]+\b|\b[0-9a-fA-F]{8,}\b").expect("static regex is valid");
    let normalized = hex_re.replace_all(message, "HEX");
    number_re.replace_all(&normalized, "NUMBER").to_string()
}

fn message_pattern_id(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(6).map(|byte| format!("{byte:02x}")).collect();
    format!("msg-{hex}")
}

/// Groups failures whose normalized message matches; singleton groups are
/// dropped (a pattern needs at least two members).
pub fn extract_message_patterns(failures: &[FailureObservation]) -> Vec<FailurePattern> {
    let mut groups: BTreeMap<String, Vec<&FailureObservation>> = BTreeMap::new();
    for failure in failures {
        groups.entry(normalize_message(&failure.message)).or_default().push(failure);
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(normalized, members)| FailurePattern {
            id: message_pattern_id(&normalized),
            kind: PatternKind::Message,
            label: normalized,
            scenario_ids: members.iter().map(|failure| failure.scenario_id.clone()).collect(),
        })
        .collect()
}

/// Groups failures sharing a non-empty `category`; singleton groups dropped.
pub fn extract_category_patterns(failures: &[FailureObservation]) -> Vec<FailurePattern> {
    let mut groups: BTreeMap<String, Vec<&FailureObservation>> = BTreeMap::new();
    for failure in failures {
        if let Some(category) = &failure.category {
            groups.entry(category.clone()).or_default().push(failure);
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(category, members)| FailurePattern {
            id: format!("cat-{category}"),
            kind: PatternKind::Category,
            label: category,
            scenario_ids: members.iter().map(|failure| failure.scenario_id.clone()).collect(),
        })
        .collect()
}

const TIME_BUCKET_SECONDS: i64 = 15 * 60;

/// Clusters failures into 15-minute buckets; buckets with at least 3 members
/// surface as a temporal pattern.
pub fn extract_time_patterns(failures: &[FailureObservation]) -> Vec<FailurePattern> {
    let mut buckets: BTreeMap<i64, Vec<&FailureObservation>> = BTreeMap::new();
    for failure in failures {
        let bucket = failure.occurred_at.div_euclid(TIME_BUCKET_SECONDS);
        buckets.entry(bucket).or_default().push(failure);
    }

    buckets
        .into_iter()
        .filter(|(_, members)| members.len() >= 3)
        .map(|(bucket, members)| FailurePattern {
            id: format!("time-{bucket}"),
            kind: PatternKind::TimeCluster,
            label: format!("{} failures within a 15-minute window", members.len()),
            scenario_ids: members.iter().map(|failure| failure.scenario_id.clone()).collect(),
        })
        .collect()
}

/// Runs all three extractors and concatenates the results. A single-element
/// batch can never satisfy any extractor's minimum group size, so this
/// always returns `[]` for one failure (§8 boundary behaviour).
pub fn analyze_failure_patterns(failures: &[FailureObservation]) -> Vec<FailurePattern> {
    let mut patterns = extract_message_patterns(failures);
    patterns.extend(extract_category_patterns(failures));
    patterns.extend(extract_time_patterns(failures));
    patterns
}
