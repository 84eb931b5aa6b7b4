//! Handlers for the `/jobs` resource.
//!
//! All endpoints require authentication via [`AuthUser`]. Submission is
//! multipart (file + mode + consent); status and result are plain polls
//! against the shared job registry.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use scrappy_core::job::{Job, JobResult, JobStatus, ScrapMode};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::upload;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Job status view returned by submission and status polls.
///
/// Deliberately excludes `output` / `error`; those live on the result
/// endpoint.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub mode: ScrapMode,
    pub filename: String,
    pub owner: String,
}

impl From<&Job> for JobResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            created_at: job.created_at,
            mode: job.mode,
            filename: job.filename.clone(),
            owner: job.owner.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Submit a document for analysis. Validates the upload, stages it on
/// disk, and returns 201 with the queued job. The analysis itself runs
/// out-of-band; poll the status endpoint to follow it.
pub async fn submit_job(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let submission = upload::read_submission(multipart).await?;
    upload::validate(&submission, state.config.max_file_size_bytes)?;

    let input_path = upload::persist(&state.config.upload_dir, &submission.file).await?;

    let job_id = state
        .orchestrator
        .submit(
            &auth.username,
            submission.mode,
            input_path,
            submission.filename,
        )
        .await;

    let job = state.registry.get(job_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: JobResponse::from(&job),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}
///
/// Poll a job's current lifecycle state. 404 for unknown ids.
pub async fn get_job_status(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let job = state.registry.get(job_id).await?;

    Ok(Json(DataResponse {
        data: JobResponse::from(&job),
    }))
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}/result
///
/// Fetch the terminal outcome of a job. 404 for unknown ids; 400 with code
/// `NOT_READY` while the job has not finished.
pub async fn get_job_result(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<DataResponse<JobResult>>> {
    let result = state.registry.result(job_id).await?;

    Ok(Json(DataResponse { data: result }))
}
