//! Flaky-test detection from historical results (§4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoricalOutcome {
    Pass,
    Fail,
}

#[derive(Debug, Clone)]
pub struct HistoricalResult {
    pub scenario_id: String,
    /// Monotonic ordering key (e.g. a unix timestamp); results are sorted by
    /// this before flip-counting.
    pub sequence: i64,
    pub outcome: HistoricalOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Quarantine,
    Investigate,
    Stabilize,
    Monitor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlakyResult {
    pub scenario_id: String,
    pub failure_rate: f64,
    pub flip_rate: f64,
    pub flakiness_score: f64,
    pub recommended_action: RecommendedAction,
}

fn recommended_action(flakiness_score: f64) -> RecommendedAction {
    if flakiness_score >= 0.7 {
        RecommendedAction::Quarantine
    } else if flakiness_score >= 0.5 {
        RecommendedAction::Investigate
    } else if flakiness_score >= 0.3 {
        RecommendedAction::Stabilize
    } else {
        RecommendedAction::Monitor
    }
}

/// Groups `history` by `scenario_id`; scenarios with fewer than
/// `min_samples_for_trends` results are skipped entirely (§8 boundary
/// behaviour: returns `[]` below the threshold).
pub fn identify_flaky(
    history: &[HistoricalResult],
    min_samples_for_trends: usize,
    flaky_threshold: f64,
) -> Vec<FlakyResult> {
    let mut by_scenario: std::collections::BTreeMap<&str, Vec<&HistoricalResult>> = std::collections::BTreeMap::new();
    for result in history {
        by_scenario.entry(result.scenario_id.as_str()).or_default().push(result);
    }

    let mut flaky = Vec::new();
    for (scenario_id, mut results) in by_scenario {
        if results.len() < min_samples_for_trends {
            continue;
        }
        results.sort_by_key(|result| result.sequence);

        let n = results.len();
        let failures = results.iter().filter(|result| result.outcome == HistoricalOutcome::Fail).count();
        let flips = results
            .windows(2)
            .filter(|pair| pair[0].outcome != pair[1].outcome)
            .count();

        let failure_rate = failures as f64 / n as f64;
        let flip_rate = if n > 1 { flips as f64 / (n - 1) as f64 } else { 0.0 };
        let flakiness_score = 0.6 * failure_rate + 0.4 * flip_rate;

        if flakiness_score >= flaky_threshold {
            flaky.push(FlakyResult {
                scenario_id: scenario_id.to_string(),
                failure_rate,
                flip_rate,
                flakiness_score,
                recommended_action: recommended_action(flakiness_score),
            });
        }
    }
    flaky
}
