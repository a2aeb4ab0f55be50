//! Analysis Service Transport
//!
//! Abstraction over the remote analysis API. The client performs no retries;
//! retry and wait policy belongs to the polling loop.

mod http;
mod mock;

pub use http::{HttpAnalysisService, ServiceTimeouts};
pub use mock::{MockAnalysisService, MockCalls, ScriptedStatus};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::analysis::{AnalysisRequest, JobHandle, JobStatus};
use crate::core::{CoreError, CoreResult};

/// Reachability of the analysis service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HealthStatus {
    /// Health endpoint answered 2xx
    Online,
    /// Service answered with a non-2xx status
    Error { status: u16 },
    /// Service could not be reached
    Offline { reason: String },
}

impl HealthStatus {
    /// Classify the outcome of a health call
    pub fn from_result(result: CoreResult<()>) -> Self {
        match result {
            Ok(()) => HealthStatus::Online,
            Err(CoreError::Service { status, .. }) => HealthStatus::Error { status },
            Err(other) => HealthStatus::Offline {
                reason: other.to_string(),
            },
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, HealthStatus::Online)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Online => write!(f, "API Online"),
            HealthStatus::Error { status } => write!(f, "API Error ({})", status),
            HealthStatus::Offline { .. } => write!(f, "API Offline"),
        }
    }
}

/// Trait for analysis service transports
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Returns the transport name
    fn name(&self) -> &str;

    /// Checks that the service is reachable
    async fn health(&self) -> CoreResult<()>;

    /// Uploads media and starts an analysis job
    async fn submit(&self, request: &AnalysisRequest) -> CoreResult<JobHandle>;

    /// Queries the current status of a job
    async fn job_status(&self, job_id: &str) -> CoreResult<JobStatus>;

    /// Fetches the raw findings payload of a completed job
    async fn fetch_result(&self, job_id: &str) -> CoreResult<serde_json::Value>;

    /// Fetches the pre-rendered PDF report of a completed job
    async fn fetch_pdf(&self, job_id: &str) -> CoreResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_from_result() {
        assert_eq!(HealthStatus::from_result(Ok(())), HealthStatus::Online);
        assert_eq!(
            HealthStatus::from_result(Err(CoreError::Service {
                operation: "Health check".to_string(),
                status: 503,
                body: String::new(),
            })),
            HealthStatus::Error { status: 503 }
        );
        assert!(matches!(
            HealthStatus::from_result(Err(CoreError::Transport("refused".to_string()))),
            HealthStatus::Offline { .. }
        ));
    }

    #[test]
    fn test_health_status_display() {
        assert_eq!(HealthStatus::Online.to_string(), "API Online");
        assert_eq!(
            HealthStatus::Error { status: 500 }.to_string(),
            "API Error (500)"
        );
        assert_eq!(
            HealthStatus::Offline {
                reason: "x".to_string()
            }
            .to_string(),
            "API Offline"
        );
    }
}
