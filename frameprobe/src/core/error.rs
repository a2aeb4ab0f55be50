//! Frameprobe Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

/// Core client error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {operation} exceeded {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    // =========================================================================
    // Service Errors
    // =========================================================================
    #[error("{operation} failed with status {status}: {body}")]
    Service {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    // =========================================================================
    // Job Errors
    // =========================================================================
    #[error("Analysis failed: {0}")]
    JobFailed(String),

    #[error("Job did not finish after {attempts} status checks ({elapsed_secs}s elapsed)")]
    PollingExhausted { attempts: u32, elapsed_secs: u64 },

    #[error("Polling cancelled")]
    Cancelled,

    #[error("No active job in this session")]
    NoActiveJob,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core client result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether the service could not be reached at all (network or timeout)
    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::Transport(_) | CoreError::Timeout { .. })
    }

    /// HTTP status code carried by a service error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CoreError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Convert to a user-facing message
    pub fn to_user_message(&self) -> String {
        match self {
            CoreError::JobFailed(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
