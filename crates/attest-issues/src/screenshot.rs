//! Screenshot attachment-by-reference (§4.6): screenshots are never
//! uploaded. A comment referencing the local path is posted instead, and
//! the return value is always a local path, never an http(s) URL — a
//! deliberate security contract against transmitting image bytes.

use std::path::Path;

/// Builds the comment body for a screenshot attachment. `timestamp` is an
/// ISO-8601 string supplied by the caller.
pub fn render_screenshot_comment(local_path: &Path, timestamp: &str) -> String {
    let filename = local_path.file_name().and_then(|name| name.to_str()).unwrap_or("screenshot.png");
    format!("![{filename}]({})\n\n_captured at {timestamp}_", local_path.display())
}
