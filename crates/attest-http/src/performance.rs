//! Performance recording (§4.2 "Performance recording").

use serde::{Deserialize, Serialize};

use crate::config::PerformanceThresholds;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceRecord {
    pub request_id: u64,
    pub total_time_ms: u64,
    pub response_size_bytes: u64,
    pub timestamp_ms: i64,
}

/// Returns `true` when the recorded sample exceeds the configured threshold
/// and a warning should be logged.
pub fn exceeds_threshold(record: &PerformanceRecord, thresholds: &PerformanceThresholds) -> bool {
    record.total_time_ms > thresholds.max_response_time_ms
}
