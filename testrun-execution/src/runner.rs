//! External test process lifecycle
//!
//! One `run` call spawns one OS-level child process executing the given test
//! file batch, bounded by a wall-clock timeout. The child is always reaped:
//! the timeout path kills and then waits on the process explicitly, and
//! `kill_on_drop` covers the remaining paths. Launch failure and timeout are
//! reported as failure outcomes, never as errors: the coordinator must keep
//! running whatever the child does.

use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use testrun_config::ExecutionConfig;

/// How long to keep draining the output pipes once the child itself is gone.
/// A lingering grandchild holding the pipe open must not stall the run.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Result of one external test process run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Process exit code; `None` when the process was killed, timed out, or
    /// never started
    pub exit_code: Option<i32>,

    /// Combined stdout/stderr, possibly partial on timeout
    pub output: String,

    /// Whether the run was cut off by the wall-clock timeout
    pub timed_out: bool,
}

impl RunOutcome {
    /// Whether the test batch passed
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Runs a batch of test files as one external process
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
}

impl ProcessRunner {
    /// Create a runner from the execution configuration
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    /// Execute the file batch, blocking the calling task until the process
    /// exits or the timeout elapses
    pub async fn run(&self, file_paths: &[String], timeout: Duration) -> RunOutcome {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(file_paths)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            "Running {} with {} test files, timeout {}s",
            self.program,
            file_paths.len(),
            timeout.as_secs()
        );

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start test process {}: {}", self.program, e);
                return RunOutcome {
                    exit_code: None,
                    output: format!("Failed to start test process: {}", e),
                    timed_out: false,
                };
            }
        };

        // Drain both pipes concurrently with waiting so a chatty child can
        // never fill a pipe buffer and deadlock against our wait
        let stdout = PipeCapture::new(child.stdout.take());
        let stderr = PipeCapture::new(child.stderr.take());

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => RunOutcome {
                exit_code: status.code(),
                output: combine(stdout.finish().await, stderr.finish().await),
                timed_out: false,
            },
            Ok(Err(e)) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                RunOutcome {
                    exit_code: None,
                    output: format!("Failed to wait for test process: {}", e),
                    timed_out: false,
                }
            }
            Err(_) => {
                // Kill and reap before reporting; whatever the pipes held at
                // that point is the partial output we surface
                let _ = child.start_kill();
                let _ = child.wait().await;
                let mut output = combine(stdout.finish().await, stderr.finish().await);
                if !output.is_empty() {
                    output.push('\n');
                }
                output.push_str(&format!(
                    "Test run timed out after {} seconds.",
                    timeout.as_secs()
                ));
                warn!("Test process {} timed out", self.program);
                RunOutcome {
                    exit_code: None,
                    output,
                    timed_out: true,
                }
            }
        }
    }
}

/// Incremental capture of one child pipe
///
/// Reads chunk by chunk into a shared buffer so the bytes received so far
/// remain available even when the reader has to be abandoned.
struct PipeCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl PipeCapture {
    fn new<R>(stream: Option<R>) -> Self
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = buffer.clone();
        let task = tokio::spawn(async move {
            let Some(mut stream) = stream else { return };
            let mut chunk = [0u8; 4096];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => writer.lock().extend_from_slice(&chunk[..n]),
                }
            }
        });
        Self { buffer, task }
    }

    /// Wait briefly for EOF, then take whatever has been read
    async fn finish(mut self) -> Vec<u8> {
        if tokio::time::timeout(DRAIN_GRACE, &mut self.task).await.is_err() {
            self.task.abort();
        }
        let bytes = self.buffer.lock();
        bytes.clone()
    }
}

/// Merge captured stdout and stderr into one output string
fn combine(stdout: Vec<u8>, stderr: Vec<u8>) -> String {
    let mut output = String::from_utf8_lossy(&stdout).into_owned();
    if !stderr.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&String::from_utf8_lossy(&stderr));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(program: &str, args: &[&str]) -> ProcessRunner {
        ProcessRunner::new(&ExecutionConfig {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_successful_run_captures_output() {
        let outcome = runner("echo", &[])
            .run(&paths(&["path1", "path2"]), Duration::from_secs(5))
            .await;
        assert!(outcome.success());
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.output.contains("path1 path2"));
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let outcome = runner("sh", &["-c"])
            .run(&paths(&["exit 3"]), Duration::from_secs(5))
            .await;
        assert!(!outcome.success());
        assert_eq!(outcome.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_stderr_is_captured() {
        let outcome = runner("sh", &["-c"])
            .run(
                &paths(&["echo to-stdout; echo to-stderr 1>&2"]),
                Duration::from_secs(5),
            )
            .await;
        assert!(outcome.success());
        assert!(outcome.output.contains("to-stdout"));
        assert!(outcome.output.contains("to-stderr"));
    }

    #[tokio::test]
    async fn test_timeout_kills_and_reports() {
        let outcome = runner("sh", &["-c"])
            .run(&paths(&["echo started; sleep 30"]), Duration::from_secs(1))
            .await;
        assert!(!outcome.success());
        assert!(outcome.timed_out);
        assert_eq!(outcome.exit_code, None);
        // Partial output survives the kill
        assert!(outcome.output.contains("started"));
        assert!(outcome.output.contains("Test run timed out after 1 seconds."));
    }

    #[tokio::test]
    async fn test_missing_program_is_failure_outcome() {
        let outcome = runner("definitely-not-a-real-test-binary", &[])
            .run(&paths(&["path1"]), Duration::from_secs(5))
            .await;
        assert!(!outcome.success());
        assert!(outcome.output.contains("Failed to start test process"));
        assert!(!outcome.timed_out);
    }
}
