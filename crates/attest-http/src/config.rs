use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

fn default_max_retries() -> u32 {
    0
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_backoff_delay_ms() -> u64 {
    30_000
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_sensitive_headers() -> BTreeSet<String> {
    ["authorization", "x-api-key", "cookie"]
        .into_iter()
        .map(|header| header.to_string())
        .collect()
}

fn default_max_response_time_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    Bearer {
        token: String,
    },
    ApiKey {
        key: String,
        #[serde(default = "default_api_key_header")]
        header: String,
    },
    Basic {
        user: String,
        pass: String,
    },
    Custom {
        headers: BTreeMap<String, String>,
    },
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub retry_on_status: BTreeSet<u16>,
    #[serde(default)]
    pub exponential_backoff: bool,
    #[serde(default = "default_max_backoff_delay_ms")]
    pub max_backoff_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_on_status: BTreeSet::new(),
            exponential_backoff: false,
            max_backoff_delay_ms: default_max_backoff_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceThresholds {
    #[serde(default = "default_max_response_time_ms")]
    pub max_response_time_ms: u64,
    #[serde(default)]
    pub max_dns_time_ms: Option<u64>,
    #[serde(default)]
    pub max_connect_time_ms: Option<u64>,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            max_response_time_ms: default_max_response_time_ms(),
            max_dns_time_ms: None,
            max_connect_time_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub thresholds: PerformanceThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_requests: bool,
    #[serde(default)]
    pub log_responses: bool,
    #[serde(default)]
    pub log_headers: bool,
    #[serde(default)]
    pub mask_sensitive_data: bool,
    #[serde(default = "default_sensitive_headers")]
    pub sensitive_headers: BTreeSet<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_requests: false,
            log_responses: false,
            log_headers: false,
            mask_sensitive_data: true,
            sensitive_headers: default_sensitive_headers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpAgentConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for HttpAgentConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: default_timeout_ms(),
            default_headers: BTreeMap::new(),
            auth: None,
            retry: RetryConfig::default(),
            validation: ValidationConfig::default(),
            performance: PerformanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
