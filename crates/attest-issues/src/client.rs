//! Remote issue-tracker client (§6 "Remote protocol contract"). A thin
//! `reqwest` wrapper; missing endpoints log a warning instead of failing —
//! there is no crash path for a tracker that doesn't implement an endpoint.

use attest_core::error::AgentError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::rate_limit::RateLimitStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedComment {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteIssue {
    pub number: u64,
    pub url: String,
    pub body: String,
}

pub struct IssueTrackerClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl IssueTrackerClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), access_token: access_token.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.access_token)
    }

    pub async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
        assignees: &[String],
    ) -> Result<CreatedIssue, AgentError> {
        let request = self.authed(self.http.post(self.url("issues"))).json(&json!({
            "title": title,
            "body": body,
            "labels": labels,
            "assignees": assignees,
        }));
        let response = request.send().await.map_err(|error| AgentError::transport(error.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!("issue tracker has no issues endpoint; submission skipped");
            return Err(AgentError::transport("issues endpoint not found"));
        }
        if !response.status().is_success() {
            return Err(AgentError::transport(format!("create_issue failed with status {}", response.status())));
        }
        response.json::<CreatedIssue>().await.map_err(|error| AgentError::transport(error.to_string()))
    }

    pub async fn post_comment(&self, issue_number: u64, body: &str) -> Result<CreatedComment, AgentError> {
        let path = format!("issues/{issue_number}/comments");
        let request = self.authed(self.http.post(self.url(&path))).json(&json!({ "body": body }));
        let response = request.send().await.map_err(|error| AgentError::transport(error.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!(issue_number, "issue tracker has no comments endpoint; comment skipped");
            return Err(AgentError::transport("comments endpoint not found"));
        }
        if !response.status().is_success() {
            return Err(AgentError::transport(format!("post_comment failed with status {}", response.status())));
        }
        response.json::<CreatedComment>().await.map_err(|error| AgentError::transport(error.to_string()))
    }

    /// Non-fatal: API errors during search are logged and treated as "no
    /// results", matching the deduplication contract's "API errors during
    /// search are non-fatal" rule.
    pub async fn search_issues(&self, query: &str) -> Vec<RemoteIssue> {
        let response = self.authed(self.http.get(self.url("search/issues")).query(&[("q", query)])).send().await;
        match response {
            Ok(response) if response.status().is_success() => {
                response.json::<Value>().await.ok().and_then(|body| parse_search_results(&body)).unwrap_or_default()
            }
            Ok(response) => {
                warn!(status = %response.status(), "issue search returned a non-success status");
                Vec::new()
            }
            Err(error) => {
                warn!(%error, "issue search request failed");
                Vec::new()
            }
        }
    }

    pub async fn rate_limit(&self) -> Option<RateLimitStatus> {
        let response = self.authed(self.http.get(self.url("rate_limit"))).send().await;
        match response {
            Ok(response) if response.status().is_success() => {
                response.json::<Value>().await.ok().and_then(|body| parse_rate_limit(&body))
            }
            Ok(response) => {
                warn!(status = %response.status(), "rate_limit endpoint returned a non-success status");
                None
            }
            Err(error) => {
                warn!(%error, "rate_limit request failed");
                None
            }
        }
    }
}

fn parse_search_results(body: &Value) -> Option<Vec<RemoteIssue>> {
    let items = body.get("items")?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| {
                Some(RemoteIssue {
                    number: item.get("number")?.as_u64()?,
                    url: item.get("url").and_then(Value::as_str).unwrap_or_default().to_string(),
                    body: item.get("body").and_then(Value::as_str).unwrap_or_default().to_string(),
                })
            })
            .collect(),
    )
}

fn parse_rate_limit(body: &Value) -> Option<RateLimitStatus> {
    let rate = body.get("rate")?;
    Some(RateLimitStatus {
        limit: rate.get("limit")?.as_u64()? as u32,
        used: rate.get("used")?.as_u64()? as u32,
        remaining: rate.get("remaining")?.as_u64()? as u32,
        reset_epoch: rate.get("reset")?.as_i64()?,
    })
}
