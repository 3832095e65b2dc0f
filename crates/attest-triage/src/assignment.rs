//! `PriorityAssignment` records and the fix-order recommendation (§4.5).

use attest_core::model::Priority;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::TriageConfig;
use crate::impact::{compute_impact_factors, compute_impact_score, describe_factors, ImpactContext, ImpactFactors};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityAssignment {
    pub scenario_id: String,
    pub priority: Priority,
    pub impact_score: f64,
    pub confidence: f64,
    /// ISO-8601 timestamp (§6 "Persisted state layout").
    pub timestamp: String,
    /// Human-readable notes on which factors drove the score.
    pub reasoning: Vec<String>,
    pub factors: ImpactFactors,
    pub estimated_fix_effort_hours: f64,
}

impl PriorityAssignment {
    /// Computes the impact score and its seven sub-factors from `context`
    /// and `config`, so the stored record carries the full rationale
    /// (§4.5 `reasoning[]`/`factors{…}`), not just the final number.
    pub fn new(
        scenario_id: impl Into<String>,
        config: &TriageConfig,
        context: &ImpactContext,
        confidence: f64,
        estimated_fix_effort_hours: f64,
    ) -> Self {
        let impact_score = compute_impact_score(config, context);
        let factors = compute_impact_factors(context);
        let reasoning = describe_factors(&config.weights, &factors);
        Self {
            scenario_id: scenario_id.into(),
            priority: Priority::from_impact_score(impact_score),
            impact_score,
            confidence,
            timestamp: Utc::now().to_rfc3339(),
            reasoning,
            factors,
            estimated_fix_effort_hours,
        }
    }
}

/// Sorts by priority tier (CRITICAL → LOW) then ascending fix effort within
/// a tier, so quick wins surface first.
pub fn suggest_fix_order(mut assignments: Vec<PriorityAssignment>) -> Vec<PriorityAssignment> {
    assignments.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then(a.estimated_fix_effort_hours.partial_cmp(&b.estimated_fix_effort_hours).unwrap_or(std::cmp::Ordering::Equal))
    });
    assignments
}

#[cfg(test)]
mod tests {
    use attest_core::model::Priority;

    use super::{suggest_fix_order, PriorityAssignment};

    fn assignment(scenario_id: &str, priority: Priority, effort: f64) -> PriorityAssignment {
        use crate::impact::ImpactFactors;

        PriorityAssignment {
            scenario_id: scenario_id.to_string(),
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            impact_score: match priority {
                Priority::Critical => 90.0,
                Priority::High => 70.0,
                Priority::Medium => 50.0,
                Priority::Low => 20.0,
            },
            priority,
            confidence: 0.8,
            reasoning: Vec::new(),
            factors: ImpactFactors {
                error_severity: 0.0,
                user_impact: 0.0,
                test_stability: 0.0,
                business_priority: 0.0,
                security_implications: 0.0,
                performance_impact: 0.0,
                regression_detection: 0.0,
            },
            estimated_fix_effort_hours: effort,
        }
    }

    #[test]
    fn functional_fix_order_respects_priority_then_ascending_effort() {
        let a = assignment("A", Priority::Critical, 4.0);
        let b = assignment("B", Priority::Critical, 1.0);
        let c = assignment("C", Priority::High, 0.5);
        let ordered = suggest_fix_order(vec![a, b, c]);
        let ids: Vec<&str> = ordered.iter().map(|assignment| assignment.scenario_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }
}
