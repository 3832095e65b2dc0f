//! One child process under the session subsystem: spawn, write, poll for
//! expected output, and teardown (§4.3 "Process lifecycle").

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::warn;

use crate::output::{CapturedOutput, OutputBuffer, OutputKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Spawned,
    Ready,
    Busy,
    Exited,
}

const OUTPUT_POLL_INTERVAL_MS: u64 = 100;

pub struct SessionProcess {
    pid: u32,
    state: ProcessState,
    child: Child,
    buffer: OutputBuffer,
}

impl SessionProcess {
    pub fn spawn(
        program: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        cwd: Option<&str>,
    ) -> Result<Self, AgentError> {
        let mut command = Command::new(program);
        command.args(args);
        command.envs(env);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|error| AgentError::initialization(format!("failed to spawn '{program}': {error}")))?;
        let pid = child
            .id()
            .ok_or_else(|| AgentError::initialization("spawned process exited before a pid was observed"))?;

        let buffer = OutputBuffer::new();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, buffer.clone(), OutputKind::Stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, buffer.clone(), OutputKind::Stderr);
        }

        Ok(Self {
            pid,
            state: ProcessState::Spawned,
            child,
            buffer,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub async fn write_line(&mut self, text: &str) -> Result<(), AgentError> {
        self.state = ProcessState::Busy;
        let result = async {
            let stdin = self
                .child
                .stdin
                .as_mut()
                .ok_or_else(|| AgentError::action("process stdin is closed"))?;
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|error| AgentError::transport(error.to_string()))?;
            stdin
                .write_all(b"\n")
                .await
                .map_err(|error| AgentError::transport(error.to_string()))
        }
        .await;
        self.state = ProcessState::Ready;
        result
    }

    pub async fn wait_for_output(
        &mut self,
        pattern: &str,
        timeout_ms: u64,
        cancellation: &CancellationToken,
    ) -> Result<CapturedOutput, AgentError> {
        let regex = Regex::new(&format!("(?i){pattern}"))
            .map_err(|error| AgentError::action(format!("invalid pattern: {error}")))?;
        self.state = ProcessState::Busy;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let captured = self.buffer.capture().await;
            if regex.is_match(&captured.combined_text()) {
                self.state = ProcessState::Ready;
                return Ok(captured);
            }
            if Instant::now() >= deadline {
                self.state = ProcessState::Ready;
                return Err(AgentError::timeout(format!(
                    "waitForOutput: pattern '{pattern}' not observed within {timeout_ms}ms"
                )));
            }
            tokio::select! {
                _ = cancellation.cancelled() => {
                    self.state = ProcessState::Ready;
                    return Err(AgentError::Cancelled);
                }
                _ = tokio::time::sleep(Duration::from_millis(OUTPUT_POLL_INTERVAL_MS)) => {}
            }
        }
    }

    pub async fn capture_output(&self) -> CapturedOutput {
        self.buffer.capture().await
    }

    /// Non-blocking exit-code probe; `None` means the process is still running.
    pub fn try_exit_code(&mut self) -> Option<i32> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.state = ProcessState::Exited;
                status.code()
            }
            _ => None,
        }
    }

    /// Sends `SIGTERM`, waits up to `grace_period_ms`, then `SIGKILL`s.
    pub async fn terminate(&mut self, grace_period_ms: u64) {
        if self.state == ProcessState::Exited {
            return;
        }
        if let Some(pid) = self.child.id() {
            let result = nix::sys::signal::kill(
                nix::unistd::Pid::from_raw(pid as i32),
                nix::sys::signal::Signal::SIGTERM,
            );
            if let Err(error) = result {
                warn!(pid, %error, "SIGTERM delivery failed, proceeding to grace period");
            }
        }
        let exited = tokio::time::timeout(Duration::from_millis(grace_period_ms), self.child.wait()).await;
        if exited.is_err() {
            if let Err(error) = self.child.start_kill() {
                warn!(pid = self.pid, %error, "SIGKILL request failed");
            }
            let _ = self.child.wait().await;
        }
        self.state = ProcessState::Exited;
    }
}

fn spawn_reader<R>(reader: R, buffer: OutputBuffer, kind: OutputKind)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => buffer.push(kind, line).await,
                _ => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use attest_core::cancellation::CancellationToken;

    use super::{ProcessState, SessionProcess};

    #[tokio::test]
    async fn functional_spawn_echo_and_wait_for_output_observes_stdout() {
        let mut process = SessionProcess::spawn(
            "sh",
            &["-c".to_string(), "echo hello-session".to_string()],
            &BTreeMap::new(),
            None,
        )
        .expect("should spawn");
        let cancellation = CancellationToken::new();
        let captured = process
            .wait_for_output("hello-session", 2_000, &cancellation)
            .await
            .expect("should observe output");
        assert!(captured.combined_text().contains("hello-session"));
    }

    #[tokio::test]
    async fn regression_wait_for_output_times_out_when_pattern_never_appears() {
        let mut process = SessionProcess::spawn(
            "sh",
            &["-c".to_string(), "sleep 1".to_string()],
            &BTreeMap::new(),
            None,
        )
        .expect("should spawn");
        let cancellation = CancellationToken::new();
        let error = process
            .wait_for_output("never-appears", 50, &cancellation)
            .await
            .expect_err("should time out");
        assert!(matches!(error, attest_core::error::AgentError::Timeout(_)));
    }

    #[tokio::test]
    async fn integration_terminate_transitions_state_to_exited() {
        let mut process = SessionProcess::spawn(
            "sh",
            &["-c".to_string(), "sleep 5".to_string()],
            &BTreeMap::new(),
            None,
        )
        .expect("should spawn");
        process.terminate(200).await;
        assert_eq!(process.state(), ProcessState::Exited);
    }
}
