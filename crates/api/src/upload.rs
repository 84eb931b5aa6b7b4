//! Upload validation and staging for job submissions.
//!
//! A submission is a multipart form with three fields: `file` (the PDF),
//! `mode` (analysis mode), and `consent_acknowledged`. The file must carry
//! the `application/pdf` content type, start with the PDF magic bytes, and
//! fit within the configured size limit. Validated uploads are staged under
//! the upload directory with a fresh UUID filename before the job is
//! admitted.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use scrappy_core::job::ScrapMode;
use uuid::Uuid;

use crate::error::AppError;

/// PDF files must begin with this byte sequence.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Only content type accepted for uploads.
const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A fully parsed (but not yet validated) job submission form.
pub struct JobSubmission {
    pub mode: ScrapMode,
    pub consent_acknowledged: bool,
    pub filename: String,
    pub content_type: String,
    pub file: Bytes,
}

/// Read all fields out of the multipart form.
///
/// Missing fields surface as `BadRequest`; no validation beyond presence
/// happens here.
pub async fn read_submission(mut multipart: Multipart) -> Result<JobSubmission, AppError> {
    let mut mode: Option<ScrapMode> = None;
    let mut consent = false;
    let mut file: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("mode") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable mode field: {e}")))?;
                mode = Some(raw.parse().map_err(AppError::Core)?);
            }
            Some("consent_acknowledged") => {
                let raw = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Unreadable consent field: {e}"))
                })?;
                consent = raw == "true";
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable file field: {e}")))?;
                file = Some((filename, content_type, bytes));
            }
            _ => {}
        }
    }

    let mode = mode.ok_or_else(|| AppError::BadRequest("Missing mode field".into()))?;
    let (filename, content_type, file) =
        file.ok_or_else(|| AppError::BadRequest("Missing file field".into()))?;

    Ok(JobSubmission {
        mode,
        consent_acknowledged: consent,
        filename,
        content_type,
        file,
    })
}

/// Validate a submission against the upload policy.
pub fn validate(submission: &JobSubmission, max_file_size_bytes: usize) -> Result<(), AppError> {
    if !submission.consent_acknowledged {
        return Err(AppError::BadRequest("Explicit consent required".into()));
    }

    if submission.content_type != PDF_CONTENT_TYPE {
        return Err(AppError::BadRequest("Only PDF files are allowed".into()));
    }

    if submission.file.len() > max_file_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Maximum size is {} bytes",
            max_file_size_bytes
        )));
    }

    if !submission.file.starts_with(PDF_MAGIC) {
        return Err(AppError::BadRequest("Invalid PDF file".into()));
    }

    Ok(())
}

/// Write the validated upload to the staging directory.
///
/// The file lands at `<upload_dir>/<uuid>.pdf`; the returned path is what
/// the orchestrator takes ownership of.
pub async fn persist(upload_dir: &Path, file: &Bytes) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;

    let path = upload_dir.join(format!("{}.pdf", Uuid::new_v4()));
    tokio::fs::write(&path, file)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to persist upload: {e}")))?;

    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
