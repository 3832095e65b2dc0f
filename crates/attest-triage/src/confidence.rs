//! Confidence and fix-effort estimation (§4.5).

use crate::impact::InterfaceKind;

/// Starts at 0.5, gains up to +0.3 from historical coverage and +0.2 from
/// scenario-descriptor context, clipped to 1.0.
pub fn compute_confidence(history_sample_count: usize, has_scenario_context: bool) -> f64 {
    let mut confidence = 0.5;
    confidence += (history_sample_count as f64 / 10.0).min(1.0) * 0.3;
    if has_scenario_context {
        confidence += 0.2;
    }
    confidence.clamp(0.0, 1.0)
}

/// Base 2h, ×1.5 UI / ×1.3 mixed, then scaled by `(1 + severity)` and
/// `(1 + stability)`, rounded to one decimal place.
pub fn compute_fix_effort(interface: InterfaceKind, severity: f64, stability: f64) -> f64 {
    let interface_multiplier = match interface {
        InterfaceKind::Ui => 1.5,
        InterfaceKind::Mixed => 1.3,
        InterfaceKind::Api | InterfaceKind::Cli | InterfaceKind::Tui => 1.0,
    };
    let hours = 2.0 * interface_multiplier * (1.0 + severity) * (1.0 + stability);
    (hours * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::{compute_confidence, compute_fix_effort};
    use crate::impact::InterfaceKind;

    #[test]
    fn unit_confidence_starts_at_half_with_no_history_or_context() {
        assert_eq!(compute_confidence(0, false), 0.5);
    }

    #[test]
    fn functional_confidence_caps_at_one_with_full_history_and_context() {
        let confidence = compute_confidence(50, true);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn regression_confidence_history_contribution_is_proportional_below_ten_samples() {
        let confidence = compute_confidence(5, false);
        assert!((confidence - 0.65).abs() < 1e-9);
    }

    #[test]
    fn functional_ui_fix_effort_multiplier_exceeds_api() {
        let ui_effort = compute_fix_effort(InterfaceKind::Ui, 0.5, 0.2);
        let api_effort = compute_fix_effort(InterfaceKind::Api, 0.5, 0.2);
        assert!(ui_effort > api_effort);
    }

    #[test]
    fn unit_fix_effort_is_rounded_to_one_decimal() {
        let effort = compute_fix_effort(InterfaceKind::Api, 0.33, 0.11);
        assert_eq!((effort * 10.0).round(), effort * 10.0);
    }
}
