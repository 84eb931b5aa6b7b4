//! In-memory job table shared between the orchestrator and the query paths.
//!
//! Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
//! constructed once at process start so tests can use fresh instances.
//! Jobs are never evicted; retention policy is an acknowledged gap.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::CoreError;
use crate::job::{Job, JobResult, JobStatus};

/// Registry of all jobs known to this process, keyed by job id.
///
/// Status reads always observe a fully-written record: every mutation is
/// applied as one atomic unit under the write lock.
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a freshly created job. The job is queryable from this point on.
    pub async fn create(&self, job: Job) {
        self.jobs.write().await.insert(job.id, job);
    }

    /// Fetch a snapshot of a job by id.
    pub async fn get(&self, id: Uuid) -> Result<Job, CoreError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound { id })
    }

    /// Fetch the terminal outcome of a job.
    ///
    /// Returns `NotReady` while the job has not reached a terminal state,
    /// which is a distinct condition from a failure.
    pub async fn result(&self, id: Uuid) -> Result<JobResult, CoreError> {
        let jobs = self.jobs.read().await;
        let job = jobs.get(&id).ok_or(CoreError::NotFound { id })?;

        if !job.status.is_terminal() {
            return Err(CoreError::NotReady { id });
        }

        Ok(JobResult {
            job_id: job.id,
            status: job.status,
            output: job.output.clone(),
            error: job.error.clone(),
        })
    }

    /// Transition a job to `Processing`.
    pub async fn mark_processing(&self, id: Uuid) -> Result<(), CoreError> {
        self.update(id, |job| {
            job.status = JobStatus::Processing;
        })
        .await
    }

    /// Transition a job to `Completed` with its output lines.
    pub async fn complete(&self, id: Uuid, output: Vec<String>) -> Result<(), CoreError> {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.output = output;
            job.error = None;
        })
        .await
    }

    /// Transition a job to `Failed` with a descriptive error.
    pub async fn fail(&self, id: Uuid, error: String) -> Result<(), CoreError> {
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error);
            job.output = Vec::new();
        })
        .await
    }

    /// Number of jobs currently tracked.
    pub async fn count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Apply a mutation to a job as one atomic unit.
    ///
    /// Refuses to touch a job that is already terminal, enforcing the
    /// single-terminal-transition invariant.
    async fn update<F>(&self, id: Uuid, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(CoreError::NotFound { id })?;

        if job.status.is_terminal() {
            return Err(CoreError::Conflict(format!(
                "Job {id} is already in a terminal state"
            )));
        }

        f(job);
        Ok(())
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use assert_matches::assert_matches;

    use super::*;
    use crate::job::ScrapMode;

    fn sample_job() -> Job {
        Job::new(
            "admin",
            ScrapMode::Full,
            PathBuf::from("/tmp/doc.pdf"),
            "doc.pdf".to_string(),
        )
    }

    #[tokio::test]
    async fn created_job_is_immediately_queryable() {
        let registry = JobRegistry::new();
        let job = sample_job();
        let id = job.id;

        registry.create(job).await;

        let found = registry.get(id).await.unwrap();
        assert_eq!(found.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let registry = JobRegistry::new();
        let err = registry.get(Uuid::new_v4()).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }

    #[tokio::test]
    async fn result_before_terminal_is_not_ready() {
        let registry = JobRegistry::new();
        let job = sample_job();
        let id = job.id;
        registry.create(job).await;
        registry.mark_processing(id).await.unwrap();

        let err = registry.result(id).await.unwrap_err();
        assert_matches!(err, CoreError::NotReady { .. });
    }

    #[tokio::test]
    async fn completed_job_has_output_and_no_error() {
        let registry = JobRegistry::new();
        let job = sample_job();
        let id = job.id;
        registry.create(job).await;
        registry.mark_processing(id).await.unwrap();
        registry
            .complete(id, vec!["line one".to_string()])
            .await
            .unwrap();

        let result = registry.result(id).await.unwrap();
        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.output, vec!["line one".to_string()]);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn failed_job_has_error_and_no_output() {
        let registry = JobRegistry::new();
        let job = sample_job();
        let id = job.id;
        registry.create(job).await;
        registry.mark_processing(id).await.unwrap();
        registry.fail(id, "engine exploded".to_string()).await.unwrap();

        let result = registry.result(id).await.unwrap();
        assert_eq!(result.status, JobStatus::Failed);
        assert!(result.output.is_empty());
        assert_eq!(result.error.as_deref(), Some("engine exploded"));
    }

    #[tokio::test]
    async fn terminal_job_rejects_further_transitions() {
        let registry = JobRegistry::new();
        let job = sample_job();
        let id = job.id;
        registry.create(job).await;
        registry.mark_processing(id).await.unwrap();
        registry.complete(id, Vec::new()).await.unwrap();

        assert_matches!(
            registry.fail(id, "late".to_string()).await.unwrap_err(),
            CoreError::Conflict(_)
        );
        assert_matches!(
            registry.mark_processing(id).await.unwrap_err(),
            CoreError::Conflict(_)
        );

        // The terminal record is unchanged.
        let result = registry.result(id).await.unwrap();
        assert_eq!(result.status, JobStatus::Completed);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn count_tracks_inserts() {
        let registry = JobRegistry::new();
        assert_eq!(registry.count().await, 0);
        registry.create(sample_job()).await;
        registry.create(sample_job()).await;
        assert_eq!(registry.count().await, 2);
    }
}
