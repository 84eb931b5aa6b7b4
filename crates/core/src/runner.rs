//! Child-process execution of the ScrapPY analysis engine.
//!
//! The engine is untrusted-content analysis and deliberately runs out of
//! process. [`EngineRunner`] is the seam the orchestrator depends on, so
//! tests can substitute scripted runners without spawning real processes.
//! [`ScrapPyRunner`] is the production implementation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::job::ScrapMode;

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output exceeding this limit is truncated to prevent memory exhaustion
/// from a runaway engine process.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default wall-clock budget for one analysis run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything one engine invocation needs.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// The uploaded document to analyze.
    pub input_path: PathBuf,
    /// Where the engine is told to write its result artifact (`-o`).
    pub output_path: PathBuf,
    /// Analysis mode (`-m`).
    pub mode: ScrapMode,
}

/// Captured outcome of a completed engine process.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Complete stdout captured from the process.
    pub stdout: String,
    /// Complete stderr captured from the process.
    pub stderr: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Errors that can occur while running the engine process.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The engine process could not be started at all.
    #[error("Failed to start analysis engine: {0}")]
    Spawn(#[source] std::io::Error),

    /// The engine exceeded its wall-clock budget and was killed.
    #[error("Analysis run timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// An I/O error occurred while waiting on the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for invoking the ScrapPY engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interpreter used to launch the engine (e.g. `python3`).
    pub interpreter: PathBuf,
    /// Path to the ScrapPY engine script.
    pub engine_path: PathBuf,
    /// Wall-clock budget per run; the child is killed when it expires.
    pub timeout: Duration,
}

// ---------------------------------------------------------------------------
// Runner seam
// ---------------------------------------------------------------------------

/// Executes one analysis run as an isolated child process.
#[async_trait]
pub trait EngineRunner: Send + Sync {
    async fn run(&self, request: &EngineRequest) -> Result<ProcessOutcome, RunnerError>;
}

/// Production runner: spawns the engine as
/// `<interpreter> <engine_path> -f <input> -m <mode> -o <output>`.
pub struct ScrapPyRunner {
    config: EngineConfig,
}

impl ScrapPyRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineRunner for ScrapPyRunner {
    async fn run(&self, request: &EngineRequest) -> Result<ProcessOutcome, RunnerError> {
        // Arguments are passed as a vector, never through a shell, so
        // user-influenced values are immune to metacharacter expansion.
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(&self.config.engine_path)
            .arg("-f")
            .arg(&request.input_path)
            .arg("-m")
            .arg(request.mode.as_str())
            .arg("-o")
            .arg(&request.output_path);

        run_command(&mut cmd, self.config.timeout).await
    }
}

// ---------------------------------------------------------------------------
// Subprocess plumbing
// ---------------------------------------------------------------------------

/// Spawn `cmd`, capture stdout/stderr, and enforce `timeout`.
///
/// `kill_on_drop(true)` plus an explicit kill on expiry guarantee the child
/// never outlives this call, on any exit path.
async fn run_command(cmd: &mut Command, timeout: Duration) -> Result<ProcessOutcome, RunnerError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(RunnerError::Spawn)?;

    // Take stdout/stderr handles and read them in spawned tasks so we can
    // still call `child.wait()` (which borrows `&mut child`).
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let wait_result = tokio::time::timeout(timeout, child.wait()).await;

    match wait_result {
        Ok(Ok(status)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_bytes = stderr_task.await.unwrap_or_default();

            Ok(ProcessOutcome {
                exit_code: status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                duration_ms,
            })
        }
        Ok(Err(e)) => Err(RunnerError::Io(e)),
        Err(_elapsed) => {
            // Timeout expired: kill the child before reporting. The drop
            // guard would kill it anyway, but an explicit kill also reaps it.
            let _ = child.kill().await;
            Err(RunnerError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

/// Derived result artifact path: `<input_path>.txt` (fixed suffix).
pub fn derived_output_path(input_path: &Path) -> PathBuf {
    let mut name = input_path.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
