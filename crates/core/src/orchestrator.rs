//! Top-level job coordinator.
//!
//! `submit` creates the registry record and hands execution off to a
//! spawned task so the caller gets the job id back immediately. The task
//! drives the status transitions, invokes the engine runner, extracts the
//! result, and guarantees the uploaded input file is deleted no matter how
//! the run concludes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::extractor;
use crate::job::{Job, ScrapMode};
use crate::registry::JobRegistry;
use crate::runner::{derived_output_path, EngineRequest, EngineRunner, RunnerError};

/// Maximum length of an error message stored on a job (4 KiB).
///
/// Engine stderr is adversary-influenced text; storing it unbounded would
/// let a hostile document grow the registry without limit.
const MAX_ERROR_LEN: usize = 4 * 1024;

/// Fixed error recorded when a run exceeds its wall-clock budget.
const TIMEOUT_ERROR: &str = "Job timed out";

/// Sanitized error recorded when the engine process could not be started.
const SPAWN_ERROR: &str = "Analysis engine could not be started";

/// Sanitized error recorded for local faults while handling outcomes.
const LOCAL_FAULT_ERROR: &str = "Failed to read analysis output";

/// Coordinates job submission and background execution.
///
/// Cheaply cloneable; all shared state lives behind `Arc`. Construct one at
/// process start and hand clones to the submission path.
#[derive(Clone)]
pub struct JobOrchestrator {
    registry: Arc<JobRegistry>,
    runner: Arc<dyn EngineRunner>,
}

impl JobOrchestrator {
    pub fn new(registry: Arc<JobRegistry>, runner: Arc<dyn EngineRunner>) -> Self {
        Self { registry, runner }
    }

    /// Accept a validated upload for analysis.
    ///
    /// Creates the job record in `Queued` state, schedules execution on the
    /// runtime, and returns the job id before the run starts. Never blocks
    /// on the analysis itself.
    pub async fn submit(
        &self,
        owner: &str,
        mode: ScrapMode,
        input_path: PathBuf,
        filename: String,
    ) -> Uuid {
        let job = Job::new(owner, mode, input_path.clone(), filename);
        let id = job.id;
        self.registry.create(job).await;

        tracing::info!(job_id = %id, mode = mode.as_str(), owner, "Job submitted");

        let this = self.clone();
        tokio::spawn(async move {
            this.execute(id, input_path, mode).await;
        });

        id
    }

    /// Run one job to its terminal state.
    ///
    /// Every failure is absorbed into the job's `error` field; nothing here
    /// propagates to other jobs or the caller.
    async fn execute(&self, id: Uuid, input_path: PathBuf, mode: ScrapMode) {
        // Deletes the uploaded file on every exit path, including panics.
        let _input = InputFileGuard::new(input_path.clone());

        if let Err(e) = self.registry.mark_processing(id).await {
            tracing::error!(job_id = %id, error = %e, "Failed to mark job as processing");
            return;
        }

        tracing::info!(job_id = %id, mode = mode.as_str(), "Starting analysis run");

        let output_path = derived_output_path(&input_path);
        let request = EngineRequest {
            input_path,
            output_path: output_path.clone(),
            mode,
        };

        let terminal = match self.runner.run(&request).await {
            Ok(outcome) if outcome.exit_code != 0 => {
                tracing::error!(
                    job_id = %id,
                    exit_code = outcome.exit_code,
                    "Analysis engine failed",
                );
                self.registry
                    .fail(id, truncate_error(&outcome.stderr))
                    .await
            }
            Ok(outcome) => match extractor::extract(mode, &output_path, &outcome).await {
                Ok(lines) => {
                    tracing::info!(
                        job_id = %id,
                        lines = lines.len(),
                        duration_ms = outcome.duration_ms,
                        "Job completed",
                    );
                    self.registry.complete(id, lines).await
                }
                Err(e) => {
                    tracing::error!(job_id = %id, error = %e, "Failed to extract result");
                    self.registry.fail(id, LOCAL_FAULT_ERROR.to_string()).await
                }
            },
            Err(RunnerError::Timeout { elapsed_ms }) => {
                tracing::error!(job_id = %id, elapsed_ms, "Job timed out");
                self.registry.fail(id, TIMEOUT_ERROR.to_string()).await
            }
            Err(RunnerError::Spawn(e)) => {
                tracing::error!(job_id = %id, error = %e, "Failed to spawn analysis engine");
                self.registry.fail(id, SPAWN_ERROR.to_string()).await
            }
            Err(RunnerError::Io(e)) => {
                tracing::error!(job_id = %id, error = %e, "I/O error during analysis run");
                self.registry.fail(id, LOCAL_FAULT_ERROR.to_string()).await
            }
        };

        if let Err(e) = terminal {
            tracing::error!(job_id = %id, error = %e, "Failed to record terminal state");
        }
    }
}

/// Truncate untrusted engine stderr to a bounded length on a char boundary.
fn truncate_error(stderr: &str) -> String {
    if stderr.len() <= MAX_ERROR_LEN {
        return stderr.to_string();
    }
    let mut end = MAX_ERROR_LEN;
    while !stderr.is_char_boundary(end) {
        end -= 1;
    }
    stderr[..end].to_string()
}

/// Drop guard that deletes the uploaded input file, if it still exists.
struct InputFileGuard {
    path: PathBuf,
}

impl InputFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for InputFileGuard {
    fn drop(&mut self) {
        if remove_if_exists(&self.path) {
            tracing::debug!(path = %self.path.display(), "Deleted uploaded input file");
        }
    }
}

fn remove_if_exists(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete input file");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
