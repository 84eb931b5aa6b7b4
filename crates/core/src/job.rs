//! Job domain types: analysis modes, lifecycle states, and the job record.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Analysis mode
// ---------------------------------------------------------------------------

/// Analysis mode passed to the ScrapPY engine via its `-m` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrapMode {
    WordFrequency,
    Full,
    Metadata,
    Entropy,
}

impl ScrapMode {
    /// The engine's command-line value for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WordFrequency => "word-frequency",
            Self::Full => "full",
            Self::Metadata => "metadata",
            Self::Entropy => "entropy",
        }
    }
}

impl FromStr for ScrapMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "word-frequency" => Ok(Self::WordFrequency),
            "full" => Ok(Self::Full),
            "metadata" => Ok(Self::Metadata),
            "entropy" => Ok(Self::Entropy),
            other => Err(CoreError::Validation(format!(
                "Unknown analysis mode: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Job status
// ---------------------------------------------------------------------------

/// Lifecycle state of a job. Transitions are monotonic:
/// `Queued -> Processing -> Completed | Failed`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// Job record
// ---------------------------------------------------------------------------

/// A single unit of analysis work tracked by the registry.
///
/// Exactly one of `output` / `error` is populated once the job reaches a
/// terminal state. `input_path` is owned by the executing job and is deleted
/// when the run concludes; it is never exposed over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub mode: ScrapMode,
    pub created_at: DateTime<Utc>,
    /// Principal identifier of the submitter.
    pub owner: String,
    /// Original filename of the uploaded document.
    pub filename: String,
    /// Location of the uploaded artifact on disk.
    #[serde(skip)]
    pub input_path: PathBuf,
    /// Analysis output lines, populated on transition to `Completed`.
    pub output: Vec<String>,
    /// Failure description, populated on transition to `Failed`.
    pub error: Option<String>,
}

impl Job {
    /// Create a new job in `Queued` state with a fresh unique id.
    pub fn new(owner: &str, mode: ScrapMode, input_path: PathBuf, filename: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            mode,
            created_at: Utc::now(),
            owner: owner.to_string(),
            filename,
            input_path,
            output: Vec::new(),
            error: None,
        }
    }
}

/// Terminal outcome of a finished job: the `{ output, error }` pair.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub output: Vec<String>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
