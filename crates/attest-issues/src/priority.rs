//! Issue priority classification (§4.6), independent of the triage
//! pipeline's numeric impact score: a coarse three-tier label used for the
//! `priority:<lowercase>` issue label.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuePriority {
    Critical,
    High,
    Medium,
}

impl IssuePriority {
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "priority:critical",
            Self::High => "priority:high",
            Self::Medium => "priority:medium",
        }
    }
}

/// `Critical` when `category == "critical"` or the message contains
/// "critical"; `High` when the message contains "error"; `Medium` otherwise.
pub fn classify_issue_priority(message: &str, category: Option<&str>) -> IssuePriority {
    let lower_message = message.to_ascii_lowercase();
    let is_critical_category = category.map(|c| c.eq_ignore_ascii_case("critical")).unwrap_or(false);
    if is_critical_category || lower_message.contains("critical") {
        IssuePriority::Critical
    } else if lower_message.contains("error") {
        IssuePriority::High
    } else {
        IssuePriority::Medium
    }
}
