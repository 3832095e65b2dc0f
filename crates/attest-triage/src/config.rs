//! Triage pipeline configuration (§4.5): impact-score weights, flaky
//! detection thresholds, and custom impact-rule modifiers.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

fn default_error_severity_weight() -> f64 {
    0.20
}
fn default_user_impact_weight() -> f64 {
    0.20
}
fn default_test_stability_weight() -> f64 {
    0.15
}
fn default_business_priority_weight() -> f64 {
    0.15
}
fn default_security_implications_weight() -> f64 {
    0.10
}
fn default_performance_impact_weight() -> f64 {
    0.10
}
fn default_regression_detection_weight() -> f64 {
    0.10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImpactWeights {
    #[serde(default = "default_error_severity_weight")]
    pub error_severity: f64,
    #[serde(default = "default_user_impact_weight")]
    pub user_impact: f64,
    #[serde(default = "default_test_stability_weight")]
    pub test_stability: f64,
    #[serde(default = "default_business_priority_weight")]
    pub business_priority: f64,
    #[serde(default = "default_security_implications_weight")]
    pub security_implications: f64,
    #[serde(default = "default_performance_impact_weight")]
    pub performance_impact: f64,
    #[serde(default = "default_regression_detection_weight")]
    pub regression_detection: f64,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            error_severity: default_error_severity_weight(),
            user_impact: default_user_impact_weight(),
            test_stability: default_test_stability_weight(),
            business_priority: default_business_priority_weight(),
            security_implications: default_security_implications_weight(),
            performance_impact: default_performance_impact_weight(),
            regression_detection: default_regression_detection_weight(),
        }
    }
}

impl ImpactWeights {
    pub fn sum(&self) -> f64 {
        self.error_severity
            + self.user_impact
            + self.test_stability
            + self.business_priority
            + self.security_implications
            + self.performance_impact
            + self.regression_detection
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomImpactRule {
    pub name: String,
    /// Lowercase substring matched against the failure message.
    #[serde(default)]
    pub message_keyword: String,
    /// Tag that must be present on the scenario for this rule to apply.
    #[serde(default)]
    pub tag: String,
    /// Signed modifier applied to the impact score, divided by 100.
    pub modifier: f64,
}

fn default_flaky_threshold() -> f64 {
    0.3
}

fn default_min_samples_for_trends() -> usize {
    5
}

fn default_history_path() -> String {
    ".priority-history.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriageConfig {
    #[serde(default)]
    pub weights: ImpactWeights,
    #[serde(default)]
    pub custom_rules: Vec<CustomImpactRule>,
    #[serde(default = "default_flaky_threshold")]
    pub flaky_threshold: f64,
    #[serde(default = "default_min_samples_for_trends")]
    pub min_samples_for_trends: usize,
    #[serde(default = "default_history_path")]
    pub history_path: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            weights: ImpactWeights::default(),
            custom_rules: Vec::new(),
            flaky_threshold: default_flaky_threshold(),
            min_samples_for_trends: default_min_samples_for_trends(),
            history_path: default_history_path(),
        }
    }
}

/// §4.5: weights must sum to 1.0 (±0.01); `flakyThreshold` must be in [0,1].
pub fn validate_configuration(config: &TriageConfig) -> Result<()> {
    let sum = config.weights.sum();
    if (sum - 1.0).abs() > 0.01 {
        bail!("impact weight sum {sum:.4} diverges from 1.0 by more than ±0.01");
    }
    if !(0.0..=1.0).contains(&config.flaky_threshold) {
        bail!("flakyThreshold {} is outside [0,1]", config.flaky_threshold);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_configuration, ImpactWeights, TriageConfig};

    #[test]
    fn unit_default_weights_sum_to_one() {
        let weights = ImpactWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn functional_validate_configuration_accepts_defaults() {
        validate_configuration(&TriageConfig::default()).expect("defaults should validate");
    }

    #[test]
    fn regression_validate_configuration_rejects_skewed_weights() {
        let mut config = TriageConfig::default();
        config.weights.error_severity = 0.9;
        let error = validate_configuration(&config).expect_err("should reject");
        assert!(error.to_string().contains("diverges from 1.0"));
    }

    #[test]
    fn regression_validate_configuration_rejects_out_of_range_flaky_threshold() {
        let mut config = TriageConfig::default();
        config.flaky_threshold = 1.5;
        let error = validate_configuration(&config).expect_err("should reject");
        assert!(error.to_string().contains("flakyThreshold"));
    }
}
