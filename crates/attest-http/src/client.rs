//! HTTP request dispatch with retry, auth, and history (§4.2).

use std::collections::BTreeMap;
use std::time::Instant;

use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::time_utils::current_unix_timestamp_ms;
use tracing::{debug, warn};

use crate::auth::auth_headers;
use crate::config::HttpAgentConfig;
use crate::history::{HttpRequestRecord, HttpResponseRecord, RequestHistory};
use crate::masking::mask_headers;
use crate::performance::{exceeds_threshold, PerformanceRecord};
use crate::retry::{max_attempts, next_delay_ms, should_retry_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn parse(action: &str) -> Option<Self> {
        match action.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            "patch" => Some(Self::Patch),
            "head" => Some(Self::Head),
            "options" => Some(Self::Options),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

pub struct HttpClient {
    config: HttpAgentConfig,
    http: reqwest::Client,
    history: RequestHistory,
    performance: Vec<PerformanceRecord>,
    session_headers: BTreeMap<String, String>,
}

impl HttpClient {
    pub fn new(config: HttpAgentConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config,
            http,
            history: RequestHistory::new(),
            performance: Vec::new(),
            session_headers: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &HttpAgentConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut HttpAgentConfig {
        &mut self.config
    }

    pub fn set_header(&mut self, name: String, value: String) {
        self.session_headers.insert(name, value);
    }

    pub fn history(&self) -> &RequestHistory {
        &self.history
    }

    pub fn last_response(&self) -> Option<HttpResponseRecord> {
        self.history.last_response()
    }

    pub fn performance_records(&self) -> &[PerformanceRecord] {
        &self.performance
    }

    /// Clears history and performance records. Invoked by `cleanup()`.
    pub fn reset(&mut self) {
        self.history.reset();
        self.performance.clear();
        self.session_headers.clear();
    }

    fn build_headers(&self) -> BTreeMap<String, String> {
        let mut headers = self.config.default_headers.clone();
        if let Some(auth) = &self.config.auth {
            headers.extend(auth_headers(auth));
        }
        headers.extend(self.session_headers.clone());
        headers
    }

    /// Headers as they should appear in a log line: omitted entirely unless
    /// `logHeaders` is set, masked per `sensitiveHeaders` unless
    /// `maskSensitiveData` is explicitly turned off (§4.2 "Header masking").
    fn loggable_headers(&self, headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        if !self.config.logging.log_headers {
            return BTreeMap::new();
        }
        if self.config.logging.mask_sensitive_data {
            mask_headers(headers, &self.config.logging.sensitive_headers)
        } else {
            headers.clone()
        }
    }

    fn resolve_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            target.trim_start_matches('/')
        )
    }

    /// Performs `method target body`, retrying per §4.2's algorithm, and
    /// returns either the final successful-or-exhausted response or a
    /// cooperative-cancellation error.
    pub async fn send(
        &mut self,
        method: HttpMethod,
        target: &str,
        body: Option<serde_json::Value>,
        cancellation: &CancellationToken,
    ) -> Result<HttpResponseRecord, AgentError> {
        let url = self.resolve_url(target);
        let headers = self.build_headers();
        let body_text = body.as_ref().map(|value| value.to_string());
        let mut attempt: u32 = 0;
        let attempts_allowed = max_attempts(&self.config.retry);

        loop {
            if cancellation.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            attempt += 1;
            let request_id = self.history.next_request_id();
            self.history.record_request(HttpRequestRecord {
                id: request_id,
                method: method.as_str().to_string(),
                url: url.clone(),
                headers: headers.clone(),
                body: body_text.clone(),
                timestamp_ms: current_unix_timestamp_ms() as i64,
            });

            if self.config.logging.log_requests {
                debug!(
                    request_id,
                    method = method.as_str(),
                    url = %url,
                    headers = ?self.loggable_headers(&headers),
                    "dispatching http request"
                );
            }

            let started = Instant::now();
            let mut request = self.http.request(method.to_reqwest(), &url);
            for (name, value) in &headers {
                request = request.header(name, value);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let outcome = request.send().await;
            let total_time_ms = started.elapsed().as_millis() as u64;

            let (response_record, transport_error) = match outcome {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let resp_headers: BTreeMap<String, String> = response
                        .headers()
                        .iter()
                        .map(|(name, value)| {
                            (
                                name.to_string(),
                                value.to_str().unwrap_or_default().to_string(),
                            )
                        })
                        .collect();
                    let body_text = response.text().await.unwrap_or_default();
                    let data = serde_json::from_str(&body_text)
                        .unwrap_or(serde_json::Value::String(body_text));
                    (
                        HttpResponseRecord {
                            request_id,
                            status,
                            headers: resp_headers,
                            data,
                            total_time_ms,
                            timestamp_ms: current_unix_timestamp_ms() as i64,
                        },
                        None,
                    )
                }
                Err(error) => (
                    HttpResponseRecord {
                        request_id,
                        status: 0,
                        headers: BTreeMap::new(),
                        data: serde_json::Value::String(error.to_string()),
                        total_time_ms,
                        timestamp_ms: current_unix_timestamp_ms() as i64,
                    },
                    Some(error),
                ),
            };

            self.history.record_response(response_record.clone());

            if self.config.logging.log_responses {
                debug!(
                    request_id,
                    status = response_record.status,
                    total_time_ms,
                    headers = ?self.loggable_headers(&response_record.headers),
                    "received http response"
                );
            }

            if self.config.performance.enabled {
                let record = PerformanceRecord {
                    request_id,
                    total_time_ms,
                    response_size_bytes: response_record.data.to_string().len() as u64,
                    timestamp_ms: response_record.timestamp_ms,
                };
                if exceeds_threshold(&record, &self.config.performance.thresholds) {
                    warn!(
                        request_id,
                        total_time_ms, "response exceeded configured performance threshold"
                    );
                }
                self.performance.push(record);
            }

            let needs_retry = transport_error.is_some()
                || should_retry_status(&self.config.retry, response_record.status);

            if !needs_retry {
                if let Some(error) = transport_error {
                    return Err(AgentError::transport(error.to_string()));
                }
                return Ok(response_record);
            }

            if attempt >= attempts_allowed {
                let message = transport_error
                    .map(|error| error.to_string())
                    .unwrap_or_else(|| format!("request failed with status {}", response_record.status));
                return Err(AgentError::transport(message));
            }

            let delay_ms = next_delay_ms(&self.config.retry, attempt);
            tokio::select! {
                _ = cancellation.cancelled() => return Err(AgentError::Cancelled),
                _ = tokio::time::sleep(std::time::Duration::from_millis(delay_ms)) => {}
            }
        }
    }
}
