//! Impact score computation (§4.5): a weighted sum of seven sub-scores,
//! each in `[0,1]`, multiplied by 100, plus signed custom-rule modifiers.

use std::collections::BTreeSet;

use attest_core::model::{Priority, PriorityHint};
use serde::{Deserialize, Serialize};

use crate::config::{ImpactWeights, TriageConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Api,
    Cli,
    Tui,
    Ui,
    Mixed,
}

/// Everything the impact-score formula needs about one failure. Constructed
/// by the caller from `TestFailure` + scenario + historical signals; kept
/// separate from `attest_core::model::TestFailure` so this crate stays
/// independent of how the orchestrator gathers those signals.
#[derive(Debug, Clone)]
pub struct ImpactContext {
    pub message: String,
    pub category: Option<String>,
    pub tags: BTreeSet<String>,
    pub interface: InterfaceKind,
    pub priority_hint: Option<PriorityHint>,
    /// Fraction of failing runs for this scenario over the last 7 days, in `[0,1]`.
    pub failure_rate_7d: f64,
    /// Whether any PASS has been observed for this scenario in the last 30 days.
    pub any_pass_30d: bool,
}

const SECURITY_KEYWORDS: &[&str] = &["auth", "token", "credential", "permission", "crypto"];
const PERFORMANCE_KEYWORDS: &[&str] = &["timeout", "slow", "memory", "cpu"];

pub(crate) fn error_severity(message: &str) -> f64 {
    let lower = message.to_ascii_lowercase();
    if lower.contains("crash") || lower.contains("fatal") {
        1.0
    } else if lower.contains("error") || lower.contains("exception") {
        0.8
    } else if lower.contains("warning") || lower.contains("timeout") {
        0.6
    } else {
        0.4
    }
}

fn user_impact(interface: InterfaceKind) -> f64 {
    match interface {
        InterfaceKind::Ui => 0.9,
        InterfaceKind::Mixed => 0.7,
        InterfaceKind::Cli | InterfaceKind::Tui => 0.6,
        InterfaceKind::Api => 0.4,
    }
}

pub(crate) fn test_stability(failure_rate_7d: f64) -> f64 {
    (failure_rate_7d * 2.0).min(1.0)
}

fn business_priority(priority_hint: Option<PriorityHint>) -> f64 {
    match priority_hint {
        Some(PriorityHint::Critical) => 1.0,
        Some(PriorityHint::High) => 0.8,
        Some(PriorityHint::Medium) => 0.6,
        Some(PriorityHint::Low) | None => 0.4,
    }
}

fn security_implications(message: &str, tags: &BTreeSet<String>) -> f64 {
    let lower = message.to_ascii_lowercase();
    let keyword_hit = SECURITY_KEYWORDS.iter().any(|keyword| lower.contains(keyword));
    let tag_hit = tags.iter().any(|tag| {
        let tag = tag.to_ascii_lowercase();
        SECURITY_KEYWORDS.iter().any(|keyword| tag.contains(keyword))
    });
    if keyword_hit || tag_hit {
        1.0
    } else {
        0.2
    }
}

fn performance_impact(message: &str, tags: &BTreeSet<String>) -> f64 {
    let lower = message.to_ascii_lowercase();
    if PERFORMANCE_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        0.9
    } else if tags.iter().any(|tag| tag.eq_ignore_ascii_case("perf") || tag.eq_ignore_ascii_case("performance")) {
        0.8
    } else {
        0.3
    }
}

fn regression_detection(any_pass_30d: bool) -> f64 {
    if any_pass_30d {
        0.9
    } else {
        0.4
    }
}

fn custom_modifier(config: &TriageConfig, context: &ImpactContext) -> f64 {
    let lower_message = context.message.to_ascii_lowercase();
    config
        .custom_rules
        .iter()
        .filter(|rule| {
            let keyword_matches =
                rule.message_keyword.is_empty() || lower_message.contains(&rule.message_keyword.to_ascii_lowercase());
            let tag_matches = rule.tag.is_empty() || context.tags.iter().any(|tag| tag.eq_ignore_ascii_case(&rule.tag));
            keyword_matches && tag_matches
        })
        .map(|rule| rule.modifier / 100.0)
        .sum()
}

/// The seven `[0,1]` sub-scores the impact formula weighs (§4.5). Carried
/// on `PriorityAssignment` so a consumer can see which signal drove a
/// score, not just the final number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactFactors {
    pub error_severity: f64,
    pub user_impact: f64,
    pub test_stability: f64,
    pub business_priority: f64,
    pub security_implications: f64,
    pub performance_impact: f64,
    pub regression_detection: f64,
}

pub fn compute_impact_factors(context: &ImpactContext) -> ImpactFactors {
    ImpactFactors {
        error_severity: error_severity(&context.message),
        user_impact: user_impact(context.interface),
        test_stability: test_stability(context.failure_rate_7d),
        business_priority: business_priority(context.priority_hint),
        security_implications: security_implications(&context.message, &context.tags),
        performance_impact: performance_impact(&context.message, &context.tags),
        regression_detection: regression_detection(context.any_pass_30d),
    }
}

fn weighted_score(weights: &ImpactWeights, factors: &ImpactFactors) -> f64 {
    weights.error_severity * factors.error_severity
        + weights.user_impact * factors.user_impact
        + weights.test_stability * factors.test_stability
        + weights.business_priority * factors.business_priority
        + weights.security_implications * factors.security_implications
        + weights.performance_impact * factors.performance_impact
        + weights.regression_detection * factors.regression_detection
}

/// Returns the raw `[0,100]` impact score (already includes custom-rule
/// modifiers and is clamped to `[0,100]`).
pub fn compute_impact_score(config: &TriageConfig, context: &ImpactContext) -> f64 {
    let factors = compute_impact_factors(context);
    let score = weighted_score(&config.weights, &factors) * 100.0 + custom_modifier(config, context);
    score.clamp(0.0, 100.0)
}

pub fn priority_for_score(score: f64) -> Priority {
    Priority::from_impact_score(score)
}

/// Human-readable notes on which factors drove the score, highest
/// contribution first; only factors scoring `>= 0.6` are surfaced, since
/// the rest are background noise rather than a rationale.
pub fn describe_factors(weights: &ImpactWeights, factors: &ImpactFactors) -> Vec<String> {
    let mut contributions = [
        ("errorSeverity", factors.error_severity, weights.error_severity * factors.error_severity),
        ("userImpact", factors.user_impact, weights.user_impact * factors.user_impact),
        ("testStability", factors.test_stability, weights.test_stability * factors.test_stability),
        ("businessPriority", factors.business_priority, weights.business_priority * factors.business_priority),
        (
            "securityImplications",
            factors.security_implications,
            weights.security_implications * factors.security_implications,
        ),
        ("performanceImpact", factors.performance_impact, weights.performance_impact * factors.performance_impact),
        (
            "regressionDetection",
            factors.regression_detection,
            weights.regression_detection * factors.regression_detection,
        ),
    ];
    contributions.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    contributions
        .into_iter()
        .filter(|(_, raw, _)| *raw >= 0.6)
        .map(|(name, raw, contribution)| format!("{name} scored {raw:.2}, contributing {:.1} of the impact score", contribution * 100.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use attest_core::model::PriorityHint;

    use super::{compute_impact_factors, compute_impact_score, describe_factors, priority_for_score, ImpactContext, InterfaceKind};
    use crate::config::{CustomImpactRule, TriageConfig};

    fn base_context() -> ImpactContext {
        ImpactContext {
            message: "Button not found".to_string(),
            category: Some("ui".to_string()),
            tags: BTreeSet::new(),
            interface: InterfaceKind::Ui,
            priority_hint: Some(PriorityHint::Medium),
            failure_rate_7d: 0.1,
            any_pass_30d: true,
        }
    }

    #[test]
    fn functional_crash_in_ui_with_critical_priority_scores_high() {
        let config = TriageConfig::default();
        let mut context = base_context();
        context.message = "fatal crash in renderer".to_string();
        context.priority_hint = Some(PriorityHint::Critical);
        context.any_pass_30d = false;
        let score = compute_impact_score(&config, &context);
        assert!(score >= 60.0, "expected a high score, got {score}");
        assert!(priority_for_score(score).rank() <= attest_core::model::Priority::High.rank());
    }

    #[test]
    fn regression_low_severity_api_warning_scores_low() {
        let config = TriageConfig::default();
        let context = ImpactContext {
            message: "minor formatting difference".to_string(),
            category: None,
            tags: BTreeSet::new(),
            interface: InterfaceKind::Api,
            priority_hint: Some(PriorityHint::Low),
            failure_rate_7d: 0.0,
            any_pass_30d: true,
        };
        let score = compute_impact_score(&config, &context);
        assert!(score < 60.0, "expected a low/medium score, got {score}");
    }

    #[test]
    fn functional_custom_rule_modifier_shifts_score() {
        let mut config = TriageConfig::default();
        config.custom_rules.push(CustomImpactRule {
            name: "payments".to_string(),
            message_keyword: "payment".to_string(),
            tag: String::new(),
            modifier: 15.0,
        });
        let mut context = base_context();
        context.message = "payment declined unexpectedly".to_string();

        let baseline = compute_impact_score(&TriageConfig::default(), &context);
        let boosted = compute_impact_score(&config, &context);
        assert!(boosted > baseline);
        assert!((boosted - baseline - 15.0).abs() < 1e-9);
    }

    #[test]
    fn unit_score_is_clamped_to_one_hundred() {
        let mut config = TriageConfig::default();
        config.custom_rules.push(CustomImpactRule {
            name: "huge".to_string(),
            message_keyword: "".to_string(),
            tag: String::new(),
            modifier: 500.0,
        });
        let context = base_context();
        let score = compute_impact_score(&config, &context);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn functional_describe_factors_surfaces_only_elevated_signals_highest_first() {
        let config = TriageConfig::default();
        let mut context = base_context();
        context.message = "fatal crash in renderer".to_string();
        context.priority_hint = Some(PriorityHint::Critical);
        context.any_pass_30d = false;

        let factors = compute_impact_factors(&context);
        let reasoning = describe_factors(&config.weights, &factors);
        assert!(!reasoning.is_empty());
        assert!(reasoning[0].starts_with("errorSeverity") || reasoning[0].starts_with("userImpact"));
        assert!(reasoning.iter().all(|line| !line.contains("testStability")));
    }
}
