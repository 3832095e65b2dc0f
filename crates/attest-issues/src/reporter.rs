//! `IssueReporter` (§4.6): ties fingerprinting, deduplication, template
//! rendering, rate limiting, and screenshot attachment into a single
//! fail-safe submission path.

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::warn;

use crate::client::IssueTrackerClient;
use crate::config::IssueReporterConfig;
use crate::fingerprint::{compute_fingerprint, fingerprint_marker, find_fingerprint_marker};
use crate::priority::classify_issue_priority;
use crate::rate_limit::{should_wait, wait_duration_seconds};
use crate::screenshot::render_screenshot_comment;
use crate::template::render;

#[derive(Debug, Clone)]
pub struct FailureReport {
    pub scenario_id: String,
    pub error_message: String,
    pub category: Option<String>,
    pub stack_trace: Option<String>,
    pub tags: Vec<String>,
    pub screenshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Created { number: u64, url: String },
    Duplicate { number: u64, url: String },
    Skipped { reason: String },
}

/// Per-instance fingerprint cache and submission mutex (§5 shared-resources:
/// "Fingerprint cache: per IssueReporter; not shared", "Rate-limited issue
/// submissions are serialised per IssueReporter instance").
pub struct IssueReporter {
    client: IssueTrackerClient,
    config: IssueReporterConfig,
    fingerprint_cache: Mutex<HashSet<String>>,
    submission_lock: Mutex<()>,
}

impl IssueReporter {
    pub fn new(client: IssueTrackerClient, config: IssueReporterConfig) -> Self {
        Self { client, config, fingerprint_cache: Mutex::new(HashSet::new()), submission_lock: Mutex::new(()) }
    }

    fn build_title_and_body(&self, report: &FailureReport, hash: &str) -> (String, String) {
        let context = json!({
            "scenario": { "id": report.scenario_id },
            "errorMessage": report.error_message,
            "category": report.category,
            "tags": report.tags,
        });
        let title = render(&self.config.title_template, &context);
        let mut body = render(&self.config.body_template, &context);
        if body.len() > self.config.max_body_length {
            body.truncate(self.config.max_body_length);
            body.push_str("\n\n_(truncated)_");
        }
        body.push_str("\n\n");
        body.push_str(&fingerprint_marker(hash));
        (title, body)
    }

    async fn find_duplicate(&self, report: &FailureReport, hash: &str, now_epoch: i64) -> Option<(u64, String)> {
        if !self.config.deduplication_enabled {
            return None;
        }
        let lookback_days = i64::from(self.config.deduplication_lookback_days);
        let lookback_date = chrono::DateTime::from_timestamp(now_epoch, 0)
            .unwrap_or_else(chrono::Utc::now)
            .date_naive()
            - chrono::Duration::days(lookback_days);
        let query =
            format!("repo:{} \"{}\" created:>={}", self.config.repository, report.scenario_id, lookback_date.format("%Y-%m-%d"));
        let results = self.client.search_issues(&query).await;
        results.into_iter().find_map(|issue| {
            (find_fingerprint_marker(&issue.body).as_deref() == Some(hash)).then_some((issue.number, issue.url))
        })
    }

    async fn wait_for_rate_limit(&self, now_epoch: i64) {
        let Some(status) = self.client.rate_limit().await else { return };
        if should_wait(&status, self.config.rate_limit_buffer) {
            let seconds = wait_duration_seconds(&status, now_epoch);
            tokio::time::sleep(std::time::Duration::from_secs(seconds)).await;
        }
    }

    /// Never returns an error: every failure path is caught, logged at warn
    /// level, and reported as `Skipped` so the triage pipeline continues.
    pub async fn submit_failure(&self, report: &FailureReport, now_epoch: i64) -> SubmissionOutcome {
        let fingerprint = compute_fingerprint(
            &report.scenario_id,
            &report.error_message,
            report.category.as_deref(),
            report.stack_trace.as_deref(),
        );

        {
            let cache = self.fingerprint_cache.lock().await;
            if cache.contains(&fingerprint.hash) {
                return SubmissionOutcome::Skipped { reason: "already submitted this run".to_string() };
            }
        }

        let _guard = self.submission_lock.lock().await;

        if let Some((number, url)) = self.find_duplicate(report, &fingerprint.hash, now_epoch).await {
            return SubmissionOutcome::Duplicate { number, url };
        }

        self.wait_for_rate_limit(now_epoch).await;

        let (title, body) = self.build_title_and_body(report, &fingerprint.hash);
        let priority = classify_issue_priority(&report.error_message, report.category.as_deref());
        let mut labels = self.config.labels.clone();
        labels.push(priority.label().to_string());

        let created = match self.client.create_issue(&title, &body, &labels, &self.config.assignees).await {
            Ok(created) => created,
            Err(error) => {
                warn!(scenario_id = %report.scenario_id, %error, "issue submission failed");
                return SubmissionOutcome::Skipped { reason: error.to_string() };
            }
        };

        self.fingerprint_cache.lock().await.insert(fingerprint.hash);

        if let Some(path) = &report.screenshot_path {
            let comment = render_screenshot_comment(path, &chrono::Utc::now().to_rfc3339());
            if let Err(error) = self.client.post_comment(created.number, &comment).await {
                warn!(issue_number = created.number, %error, "screenshot comment failed");
            }
        }

        SubmissionOutcome::Created { number: created.number, url: created.url }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::{FailureReport, IssueReporter, SubmissionOutcome};
    use crate::client::IssueTrackerClient;
    use crate::config::IssueReporterConfig;

    fn report() -> FailureReport {
        FailureReport {
            scenario_id: "login".to_string(),
            error_message: "Button not found".to_string(),
            category: Some("ui".to_string()),
            stack_trace: None,
            tags: vec!["smoke".to_string()],
            screenshot_path: None,
        }
    }

    #[tokio::test]
    async fn functional_submit_failure_creates_issue_and_includes_fingerprint_marker() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search/issues");
            then.status(200).json_body(json!({"items": []}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rate_limit");
            then.status(200).json_body(json!({"rate": {"limit": 100, "used": 1, "remaining": 99, "reset": 0}}));
        });
        let create_mock = server.mock(|when, then| {
            when.method(POST).path("/issues").body_includes("<!-- fingerprint:");
            then.status(201).json_body(json!({"number": 1, "url": "https://example.test/issues/1"}));
        });

        let client = IssueTrackerClient::new(server.base_url(), "token");
        let mut config = IssueReporterConfig::default();
        config.repository = "owner/repo".to_string();
        let reporter = IssueReporter::new(client, config);

        let outcome = reporter.submit_failure(&report(), 0).await;
        assert!(matches!(outcome, SubmissionOutcome::Created { number: 1, .. }));
        create_mock.assert_hits(1);
    }

    #[tokio::test]
    async fn functional_duplicate_search_short_circuits_creation() {
        let server = MockServer::start();
        let fingerprint = crate::fingerprint::compute_fingerprint("login", "Button not found", Some("ui"), None);
        let marker = crate::fingerprint::fingerprint_marker(&fingerprint.hash);
        server.mock(|when, then| {
            when.method(GET).path("/search/issues");
            then.status(200).json_body(json!({"items": [{"number": 9, "url": "https://example.test/issues/9", "body": format!("old body\n\n{marker}")}]}));
        });
        let create_mock = server.mock(|when, then| {
            when.method(POST).path("/issues");
            then.status(201).json_body(json!({"number": 1, "url": "x"}));
        });

        let client = IssueTrackerClient::new(server.base_url(), "token");
        let mut config = IssueReporterConfig::default();
        config.repository = "owner/repo".to_string();
        let reporter = IssueReporter::new(client, config);

        let outcome = reporter.submit_failure(&report(), 0).await;
        assert!(matches!(outcome, SubmissionOutcome::Duplicate { number: 9, .. }));
        create_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn unit_duplicate_search_query_includes_lookback_date() {
        let server = MockServer::start();
        let search_mock = server.mock(|when, then| {
            when.method(GET).path("/search/issues").query_param("q", "repo:owner/repo \"login\" created:>=1969-12-02");
            then.status(200).json_body(json!({"items": []}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rate_limit");
            then.status(200).json_body(json!({"rate": {"limit": 100, "used": 1, "remaining": 99, "reset": 0}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/issues");
            then.status(201).json_body(json!({"number": 1, "url": "x"}));
        });

        let client = IssueTrackerClient::new(server.base_url(), "token");
        let mut config = IssueReporterConfig::default();
        config.repository = "owner/repo".to_string();
        config.deduplication_lookback_days = 30;
        let reporter = IssueReporter::new(client, config);

        reporter.submit_failure(&report(), 0).await;
        search_mock.assert_hits(1);
    }

    #[tokio::test]
    async fn regression_submission_failure_is_caught_and_reported_as_skipped() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search/issues");
            then.status(200).json_body(json!({"items": []}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rate_limit");
            then.status(200).json_body(json!({"rate": {"limit": 100, "used": 1, "remaining": 99, "reset": 0}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/issues");
            then.status(500);
        });

        let client = IssueTrackerClient::new(server.base_url(), "token");
        let mut config = IssueReporterConfig::default();
        config.repository = "owner/repo".to_string();
        let reporter = IssueReporter::new(client, config);

        let outcome = reporter.submit_failure(&report(), 0).await;
        assert!(matches!(outcome, SubmissionOutcome::Skipped { .. }));
    }
}
