//! Analysis Session
//!
//! Explicit per-user context holding the active job and its result. A session
//! runs at most one job at a time; submitting again replaces the active job.
//! Operations that fail leave the previous job and result in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::analysis::{normalize_result, AnalysisRequest, AnalysisResult, JobHandle, MediaKind};
use crate::core::export;
use crate::core::fs::validate_job_id;
use crate::core::polling::{JobPoller, PollConfig, PollOutcome, PollProgress};
use crate::core::service::{AnalysisService, HealthStatus};
use crate::core::{CoreError, CoreResult, SessionId};

/// One user's analysis workflow
pub struct AnalysisSession {
    id: SessionId,
    service: Arc<dyn AnalysisService>,
    poll_config: PollConfig,
    active_job: Option<JobHandle>,
    result: Option<AnalysisResult>,
}

impl std::fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("id", &self.id)
            .field("service", &self.service.name())
            .field("active_job", &self.active_job)
            .field("has_result", &self.result.is_some())
            .finish()
    }
}

impl AnalysisSession {
    pub fn new(service: Arc<dyn AnalysisService>, poll_config: PollConfig) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            service,
            poll_config,
            active_job: None,
            result: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll_config
    }

    pub fn active_job(&self) -> Option<&JobHandle> {
        self.active_job.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    fn require_job(&self) -> CoreResult<&JobHandle> {
        self.active_job.as_ref().ok_or(CoreError::NoActiveJob)
    }

    /// Probe the service. Never fails; unreachable services report Offline.
    pub async fn check_health(&self) -> HealthStatus {
        let status = HealthStatus::from_result(self.service.health().await);
        if !status.is_online() {
            warn!("Analysis service health: {}", status);
        }
        status
    }

    /// Validate and upload a request, making the new job active.
    ///
    /// Validation failures never reach the service.
    pub async fn submit(&mut self, request: &AnalysisRequest) -> CoreResult<&JobHandle> {
        request.validate().map_err(CoreError::ValidationError)?;

        let handle = self.service.submit(request).await?;
        info!(
            "Session {}: {} job {}... submitted",
            self.id,
            handle.media_kind,
            handle.short_id()
        );

        self.result = None;
        Ok(&*self.active_job.insert(handle))
    }

    /// Poll the active job to a terminal state and keep its result.
    ///
    /// Failure, exhaustion and cancellation map to errors and leave any
    /// earlier result untouched.
    pub async fn await_result(
        &mut self,
        cancel: &CancellationToken,
        progress: Option<mpsc::UnboundedSender<PollProgress>>,
    ) -> CoreResult<&AnalysisResult> {
        let job = self.require_job()?.clone();

        let mut poller = JobPoller::new(Arc::clone(&self.service), self.poll_config);
        if let Some(sender) = progress {
            poller = poller.with_progress(sender);
        }

        match poller.poll(&job, cancel).await? {
            PollOutcome::Completed(result) => Ok(&*self.result.insert(result)),
            PollOutcome::Failed { error, .. } => Err(CoreError::JobFailed(error)),
            PollOutcome::Exhausted {
                attempts,
                elapsed_secs,
            } => {
                warn!(
                    "Session {}: job {}... did not finish within the polling budget",
                    self.id,
                    job.short_id()
                );
                Err(CoreError::PollingExhausted {
                    attempts,
                    elapsed_secs,
                })
            }
            PollOutcome::Cancelled { .. } => Err(CoreError::Cancelled),
        }
    }

    /// Submit then wait for the result
    pub async fn analyze(
        &mut self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
        progress: Option<mpsc::UnboundedSender<PollProgress>>,
    ) -> CoreResult<&AnalysisResult> {
        self.submit(request).await?;
        self.await_result(cancel, progress).await
    }

    /// Fetch the result of an already completed job and adopt it as active.
    pub async fn load_result(
        &mut self,
        job_id: &str,
        media_kind: MediaKind,
    ) -> CoreResult<&AnalysisResult> {
        validate_job_id(job_id).map_err(CoreError::ValidationError)?;

        let raw = self.service.fetch_result(job_id).await?;
        let result = normalize_result(raw);

        self.active_job = Some(JobHandle::new(job_id, media_kind));
        Ok(&*self.result.insert(result))
    }

    /// Write the held result as JSON into `dir`
    pub fn export_json(&self, dir: &Path) -> CoreResult<PathBuf> {
        let job = self.require_job()?;
        let result = self.result.as_ref().ok_or_else(|| {
            CoreError::ValidationError(format!(
                "Job {}... has no result to export yet",
                job.short_id()
            ))
        })?;
        export::write_json_export(dir, &job.job_id, result)
    }

    /// Fetch the PDF report of the active job and write it into `dir`
    pub async fn export_pdf(&self, dir: &Path) -> CoreResult<PathBuf> {
        let job = self.require_job()?;
        let pdf = self.service.fetch_pdf(&job.job_id).await?;
        export::write_pdf_export(dir, &job.job_id, &pdf)
    }
}
