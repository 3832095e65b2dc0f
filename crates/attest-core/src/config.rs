use serde::{Deserialize, Serialize};

fn default_max_parallel() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

/// Orchestrator-level execution settings (§4.4). Loading this from a config
/// file is out of scope; the core consumes the plain record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_true")]
    pub continue_on_failure: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            default_timeout_ms: default_timeout_ms(),
            max_retries: 0,
            continue_on_failure: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionConfig;

    #[test]
    fn unit_execution_config_default_uses_four_way_parallelism() {
        let config = ExecutionConfig::default();
        assert_eq!(config.max_parallel, 4);
        assert_eq!(config.default_timeout_ms, 30_000);
        assert!(config.continue_on_failure);
    }

    #[test]
    fn functional_execution_config_deserializes_partial_json() {
        let config: ExecutionConfig =
            serde_json::from_str(r#"{"maxParallel":8}"#).expect("should deserialize");
        assert_eq!(config.max_parallel, 8);
        assert_eq!(config.default_timeout_ms, 30_000);
    }
}
