//! Issue submission with deduplication (§4.6): fingerprinting, duplicate
//! search, mustache-lite template rendering, rate-limited submission, and
//! screenshot attachment-by-reference, wired into an `IssueAgent`.

pub mod agent;
pub mod client;
pub mod config;
pub mod fingerprint;
pub mod priority;
pub mod rate_limit;
pub mod reporter;
pub mod screenshot;
pub mod template;

pub use agent::IssueAgent;
pub use client::{CreatedComment, CreatedIssue, IssueTrackerClient, RemoteIssue};
pub use config::IssueReporterConfig;
pub use fingerprint::{compute_fingerprint, find_fingerprint_marker, fingerprint_marker, IssueFingerprint};
pub use priority::{classify_issue_priority, IssuePriority};
pub use rate_limit::{should_wait, wait_duration_seconds, RateLimitStatus};
pub use reporter::{FailureReport, IssueReporter, SubmissionOutcome};
pub use screenshot::render_screenshot_comment;
pub use template::render as render_template;
