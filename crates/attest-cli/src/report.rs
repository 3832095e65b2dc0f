//! Persists a finished `TestSession` to the configured report directory
//! (§6 "Screenshots and reports: directories configured by caller; core
//! writes, never reads back"), using the same atomic-write helper the
//! priority history store uses.

use std::path::Path;

use anyhow::{Context, Result};
use attest_orchestrator::TestSession;

pub fn write_session_report(report_directory: &Path, session: &TestSession) -> Result<()> {
    std::fs::create_dir_all(report_directory)
        .with_context(|| format!("failed to create report directory {}", report_directory.display()))?;
    let path = report_directory.join(format!("{}.json", session.session_id));
    let body = serde_json::to_string_pretty(session).context("failed to serialize session report")?;
    attest_core::write_text_atomic(&path, &body)
        .with_context(|| format!("failed to write session report {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_orchestrator::TestSession;

    #[test]
    fn functional_write_session_report_creates_file_named_by_session_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = TestSession::new("session-42".to_string(), 0, 10, Vec::new());
        write_session_report(dir.path(), &session).expect("should write report");
        assert!(dir.path().join("session-42.json").exists());
    }
}
