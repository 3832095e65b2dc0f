//! Request/response history (§4.2 "Request/response history"): an ordered,
//! in-memory record owned by a single `HttpClient`. Readers only ever get a
//! shallow copy, never a handle to the live buffer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpRequestRecord {
    pub id: u64,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpResponseRecord {
    pub request_id: u64,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub data: serde_json::Value,
    pub total_time_ms: u64,
    pub timestamp_ms: i64,
}

#[derive(Debug, Default)]
pub struct RequestHistory {
    requests: Vec<HttpRequestRecord>,
    responses: Vec<HttpResponseRecord>,
    next_id: u64,
}

impl RequestHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves and returns the next monotonically increasing request id,
    /// matching §5's "monotonically non-decreasing request IDs" guarantee.
    pub fn next_request_id(&mut self) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }

    pub fn record_request(&mut self, request: HttpRequestRecord) {
        self.requests.push(request);
    }

    pub fn record_response(&mut self, response: HttpResponseRecord) {
        self.responses.push(response);
    }

    pub fn requests(&self) -> Vec<HttpRequestRecord> {
        self.requests.clone()
    }

    pub fn responses(&self) -> Vec<HttpResponseRecord> {
        self.responses.clone()
    }

    pub fn last_response(&self) -> Option<HttpResponseRecord> {
        self.responses.last().cloned()
    }

    /// Called by `cleanup()`: clears both buffers.
    pub fn reset(&mut self) {
        self.requests.clear();
        self.responses.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{HttpRequestRecord, RequestHistory};

    fn sample_request(id: u64) -> HttpRequestRecord {
        HttpRequestRecord {
            id,
            method: "GET".to_string(),
            url: "https://example.com".to_string(),
            headers: BTreeMap::new(),
            body: None,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn unit_next_request_id_is_monotonic() {
        let mut history = RequestHistory::new();
        let first = history.next_request_id();
        let second = history.next_request_id();
        assert!(second > first);
    }

    #[test]
    fn functional_reset_clears_both_buffers() {
        let mut history = RequestHistory::new();
        history.record_request(sample_request(1));
        history.reset();
        assert!(history.requests().is_empty());
        assert!(history.responses().is_empty());
    }

    #[test]
    fn regression_requests_returns_snapshot_not_live_handle() {
        let mut history = RequestHistory::new();
        history.record_request(sample_request(1));
        let mut snapshot = history.requests();
        snapshot.push(sample_request(2));
        assert_eq!(history.requests().len(), 1);
    }
}
