//! Failure triage pipeline (§4.5): impact scoring, confidence and fix-effort
//! estimation, flaky-test detection, failure-pattern extraction, and
//! file-backed priority history, wired into a `PriorityAgent`.

pub mod agent;
pub mod assignment;
pub mod confidence;
pub mod config;
pub mod flaky;
pub mod history;
pub mod impact;
pub mod patterns;

pub use agent::{recommend_fix_order, PriorityAgent};
pub use assignment::{suggest_fix_order, PriorityAssignment};
pub use confidence::{compute_confidence, compute_fix_effort};
pub use config::{validate_configuration, CustomImpactRule, ImpactWeights, TriageConfig};
pub use flaky::{identify_flaky, FlakyResult, HistoricalOutcome, HistoricalResult, RecommendedAction};
pub use history::{resolve_history_path, PriorityHistoryStore};
pub use impact::{
    compute_impact_factors, compute_impact_score, describe_factors, priority_for_score, ImpactContext, ImpactFactors, InterfaceKind,
};
pub use patterns::{
    analyze_failure_patterns, extract_category_patterns, extract_message_patterns, extract_time_patterns,
    FailureObservation, FailurePattern, PatternKind,
};
