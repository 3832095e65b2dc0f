//! Append-only output buffer shared between a process's reader tasks and
//! whoever polls for expected output (§4.3 "Output buffer").

use std::sync::Arc;

use attest_core::time_utils::current_unix_timestamp_ms;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct OutputEvent {
    pub kind: OutputKind,
    pub data: String,
    pub timestamp_ms: i64,
}

/// Result of `captureOutput()`: stdout/stderr split plus a timestamp-merged
/// combined view.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: Vec<OutputEvent>,
    pub stderr: Vec<OutputEvent>,
    pub combined: Vec<OutputEvent>,
}

impl CapturedOutput {
    pub fn combined_text(&self) -> String {
        self.combined
            .iter()
            .map(|event| event.data.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone)]
pub struct OutputBuffer {
    events: Arc<Mutex<Vec<OutputEvent>>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push(&self, kind: OutputKind, data: String) {
        let mut events = self.events.lock().await;
        events.push(OutputEvent {
            kind,
            data,
            timestamp_ms: current_unix_timestamp_ms() as i64,
        });
    }

    pub async fn capture(&self) -> CapturedOutput {
        let events = self.events.lock().await;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        for event in events.iter() {
            match event.kind {
                OutputKind::Stdout => stdout.push(event.clone()),
                OutputKind::Stderr => stderr.push(event.clone()),
            }
        }
        let mut combined = events.clone();
        combined.sort_by_key(|event| event.timestamp_ms);
        CapturedOutput {
            stdout,
            stderr,
            combined,
        }
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputBuffer, OutputKind};

    #[tokio::test]
    async fn unit_capture_splits_stdout_and_stderr() {
        let buffer = OutputBuffer::new();
        buffer.push(OutputKind::Stdout, "out".to_string()).await;
        buffer.push(OutputKind::Stderr, "err".to_string()).await;
        let captured = buffer.capture().await;
        assert_eq!(captured.stdout.len(), 1);
        assert_eq!(captured.stderr.len(), 1);
        assert_eq!(captured.combined.len(), 2);
    }

    #[tokio::test]
    async fn functional_combined_text_joins_in_timestamp_order() {
        let buffer = OutputBuffer::new();
        buffer.push(OutputKind::Stdout, "first".to_string()).await;
        buffer.push(OutputKind::Stdout, "second".to_string()).await;
        let captured = buffer.capture().await;
        assert_eq!(captured.combined_text(), "first\nsecond");
    }
}
