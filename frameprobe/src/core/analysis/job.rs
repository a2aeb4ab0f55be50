//! Job Handle & Status
//!
//! A job is the service-side unit of asynchronous analysis work. The client
//! only ever sees its opaque identifier and the status reported per poll.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::request::MediaKind;
use crate::core::{short_job_id, JobId};

/// Handle for tracking a submitted analysis job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Service-assigned job ID
    pub job_id: JobId,
    /// What was submitted
    pub media_kind: MediaKind,
    /// Unix timestamp when submitted
    pub submitted_at: i64,
}

impl JobHandle {
    pub fn new(job_id: impl Into<JobId>, media_kind: MediaKind) -> Self {
        Self {
            job_id: job_id.into(),
            media_kind,
            submitted_at: chrono::Utc::now().timestamp(),
        }
    }

    /// First characters of the job id, for messages and file names
    pub fn short_id(&self) -> &str {
        short_job_id(&self.job_id)
    }
}

/// Status of an analysis job as reported by one poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted but not started
    Queued,
    /// Being analyzed
    Processing,
    /// Findings are ready to fetch
    Completed,
    /// Analysis failed on the service
    Failed { error: String },
}

impl JobStatus {
    /// Whether the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed { .. })
    }

    /// Map a wire status string (plus optional error) to a typed status.
    ///
    /// Unknown status strings are treated as still processing.
    pub fn from_wire(status: &str, error: Option<String>) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed {
                error: error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string()),
            },
            other => {
                warn!("Unknown job status '{}', treating as processing", other);
                JobStatus::Processing
            }
        }
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
