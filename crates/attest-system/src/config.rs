use serde::{Deserialize, Serialize};

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_port_connect_timeout_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemAgentConfig {
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_port_connect_timeout_ms")]
    pub port_connect_timeout_ms: u64,
    #[serde(default = "default_host")]
    pub default_host: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for SystemAgentConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            port_connect_timeout_ms: default_port_connect_timeout_ms(),
            default_host: default_host(),
        }
    }
}
