use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_grace_period_ms() -> u64 {
    3_000
}

fn default_wait_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionAgentConfig {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    #[serde(default = "default_wait_timeout_ms")]
    pub default_wait_timeout_ms: u64,
}

impl Default for SessionAgentConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            grace_period_ms: default_grace_period_ms(),
            default_wait_timeout_ms: default_wait_timeout_ms(),
        }
    }
}
