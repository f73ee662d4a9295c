/// Execution Engine - Abstraction for Isolated Test Execution
///
/// **Core Responsibility:**
/// Run one execution request as its own child process and capture raw output.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to execute (child process, simulated toolchain, etc.)
/// - Engine does NOT classify outcomes
/// - Engine returns raw outputs for the Evaluator to judge
///
/// Isolation comes purely from the process boundary: a panic, crash or hang
/// in one child cannot touch the next one. Requests run one at a time.

use crate::invocation::ExecutionRequest;
use anyhow::{Context, Result};
use std::future::Future;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Raw execution output for a single request
/// Produced by an ExecutionEngine, consumed by the Evaluator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub execution_time_ms: u64,
    pub timed_out: bool,
}

impl ExecutionOutput {
    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

pub trait ExecutionEngine {
    /// Never fails: spawn errors and timeouts come back as unsuccessful outputs
    fn execute(&self, request: &ExecutionRequest) -> impl Future<Output = ExecutionOutput> + Send;
}

/// Runs the toolchain as a real child process
#[derive(Debug, Clone, Default)]
pub struct ProcessEngine {
    timeout: Option<Duration>,
}

impl ProcessEngine {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    async fn run_child(&self, request: &ExecutionRequest) -> Result<ExecutionOutput> {
        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .env_clear()
            .envs(request.env.vars().iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a timeout also reaches the test binary that
        // `go test` runs as a grandchild
        #[cfg(unix)]
        command.process_group(0);

        let start_time = Instant::now();
        let child = command
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", request.program))?;
        let pid = child.id();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output.context("Failed to wait for child process")?,
                Err(_) => {
                    if let Some(pid) = pid {
                        kill_process_group(pid);
                    }
                    let elapsed = start_time.elapsed().as_millis() as u64;
                    warn!(
                        test = %request.name(),
                        timeout_ms = limit.as_millis() as u64,
                        "Execution timed out; process group killed"
                    );
                    return Ok(ExecutionOutput {
                        stdout: String::new(),
                        stderr: format!("[Execution timed out after {}ms]", limit.as_millis()),
                        success: false,
                        exit_code: None,
                        execution_time_ms: elapsed,
                        timed_out: true,
                    });
                }
            },
            None => child
                .wait_with_output()
                .await
                .context("Failed to wait for child process")?,
        };

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        debug!(
            test = %request.name(),
            exit_code = ?output.status.code(),
            execution_ms = execution_time_ms,
            "Child exited"
        );

        Ok(ExecutionOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            exit_code: output.status.code(),
            execution_time_ms,
            timed_out: false,
        })
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        warn!(pid, error = %e, "Failed to kill process group");
    }
}

// Without process groups only the direct child is killed (kill_on_drop)
#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

impl ExecutionEngine for ProcessEngine {
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionOutput {
        match self.run_child(request).await {
            Ok(output) => output,
            Err(e) => {
                warn!(test = %request.name(), error = %e, "Execution error");
                ExecutionOutput {
                    stderr: format!("Execution error: {:#}", e),
                    ..Default::default()
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::invocation::EnvSnapshot;
    use peace_common::types::TestIdentifier;
    use std::sync::Arc;

    fn shell(script: &str, env: EnvSnapshot) -> ExecutionRequest {
        ExecutionRequest {
            identifier: TestIdentifier::plain("TestShell"),
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: Arc::new(env),
        }
    }

    #[tokio::test]
    async fn test_successful_child() {
        let engine = ProcessEngine::default();
        let output = engine
            .execute(&shell("echo ok", EnvSnapshot::default()))
            .await;

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "ok");
        assert!(!output.timed_out);
    }

    #[tokio::test]
    async fn test_failing_child_captures_both_streams() {
        let engine = ProcessEngine::default();
        let output = engine
            .execute(&shell("echo out; echo err 1>&2; exit 3", EnvSnapshot::default()))
            .await;

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.combined(), "out\n\nerr\n");
    }

    #[tokio::test]
    async fn test_child_sees_only_snapshot_env() {
        let env = EnvSnapshot::from_vars([("PEACE_MARKER", "from-snapshot")]);
        let engine = ProcessEngine::default();
        let output = engine
            .execute(&shell("echo \"$PEACE_MARKER:${HOME:-unset}\"", env))
            .await;

        assert!(output.success);
        assert_eq!(output.stdout.trim(), "from-snapshot:unset");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let engine = ProcessEngine::new(Some(Duration::from_millis(100)));
        let output = engine
            .execute(&shell("sleep 5", EnvSnapshot::default()))
            .await;

        assert!(!output.success);
        assert!(output.timed_out);
        assert!(output.stderr.contains("timed out"));
        assert!(output.execution_time_ms < 5000);
    }

    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("still_running");
        let script = format!(
            "/bin/sh -c 'sleep 1; touch {}'; true",
            marker.display()
        );
        let env = EnvSnapshot::from_vars([("PATH", "/usr/bin:/bin")]);

        let engine = ProcessEngine::new(Some(Duration::from_millis(100)));
        let output = engine.execute(&shell(&script, env)).await;
        assert!(output.timed_out);

        tokio::time::sleep(Duration::from_millis(1800)).await;
        assert!(!marker.exists(), "grandchild outlived the timeout");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_a_failed_output() {
        let mut request = shell("", EnvSnapshot::default());
        request.program = "/nonexistent/toolchain".to_string();

        let output = ProcessEngine::default().execute(&request).await;
        assert!(!output.success);
        assert_eq!(output.exit_code, None);
        assert!(output.stderr.contains("Failed to spawn"));
    }
}
