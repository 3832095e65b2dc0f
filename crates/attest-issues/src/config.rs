//! Issue reporter configuration (§4.6, §6).

use serde::{Deserialize, Serialize};

fn default_title_template() -> String {
    "[{{scenario.id}}] {{errorMessage}}".to_string()
}

fn default_body_template() -> String {
    "**Scenario:** {{scenario.id}}\n**Message:** {{errorMessage}}\n\
     {{#category}}**Category:** {{category}}\n{{/category}}\
     {{#tags}}- {{this}}\n{{/tags}}"
        .to_string()
}

fn default_access_token_env() -> String {
    "ISSUE_TRACKER_TOKEN".to_string()
}

fn default_max_body_length() -> usize {
    4_000
}

fn default_rate_limit_buffer() -> u32 {
    5
}

fn default_deduplication_lookback_days() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueReporterConfig {
    pub base_url: String,
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    pub repository: String,
    #[serde(default = "default_title_template")]
    pub title_template: String,
    #[serde(default = "default_body_template")]
    pub body_template: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default = "default_max_body_length")]
    pub max_body_length: usize,
    #[serde(default = "default_rate_limit_buffer")]
    pub rate_limit_buffer: u32,
    #[serde(default = "default_true")]
    pub deduplication_enabled: bool,
    #[serde(default = "default_deduplication_lookback_days")]
    pub deduplication_lookback_days: u32,
}

impl Default for IssueReporterConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_token_env: default_access_token_env(),
            repository: String::new(),
            title_template: default_title_template(),
            body_template: default_body_template(),
            labels: Vec::new(),
            assignees: Vec::new(),
            max_body_length: default_max_body_length(),
            rate_limit_buffer: default_rate_limit_buffer(),
            deduplication_enabled: default_true(),
            deduplication_lookback_days: default_deduplication_lookback_days(),
        }
    }
}
