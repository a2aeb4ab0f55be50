//! Mock Analysis Service
//!
//! In-memory stand-in for the analysis API. Status responses are scripted and
//! every call is counted, so polling and session behavior can be exercised
//! without a server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::AnalysisService;
use crate::core::analysis::{AnalysisRequest, JobHandle, JobStatus};
use crate::core::{CoreError, CoreResult};

/// One scripted answer to a job status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedStatus {
    Status(JobStatus),
    /// Service unreachable for this poll
    TransportFailure,
    /// Service answered with this non-2xx status
    ServiceFailure(u16),
}

impl From<JobStatus> for ScriptedStatus {
    fn from(status: JobStatus) -> Self {
        ScriptedStatus::Status(status)
    }
}

/// Snapshot of how often each endpoint was called
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub health: u32,
    pub submit: u32,
    pub status: u32,
    pub result: u32,
    pub pdf: u32,
}

#[derive(Debug, Default)]
struct CallCounters {
    health: AtomicU32,
    submit: AtomicU32,
    status: AtomicU32,
    result: AtomicU32,
    pdf: AtomicU32,
}

/// Mock service for tests and offline runs
#[derive(Debug)]
pub struct MockAnalysisService {
    job_id: String,
    statuses: Mutex<VecDeque<ScriptedStatus>>,
    /// Returned once the script runs out
    fallback_status: JobStatus,
    result: Value,
    pdf: Option<Vec<u8>>,
    health_failure: Option<ScriptedStatus>,
    submit_failure: Option<u16>,
    result_failure: Option<u16>,
    calls: CallCounters,
    last_request: Mutex<Option<AnalysisRequest>>,
}

impl Default for MockAnalysisService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnalysisService {
    /// Creates a mock whose jobs complete on the first poll with no findings
    pub fn new() -> Self {
        Self {
            job_id: format!("mock-{}", ulid::Ulid::new().to_string().to_lowercase()),
            statuses: Mutex::new(VecDeque::new()),
            fallback_status: JobStatus::Completed,
            result: json!({"media_info": {}, "findings": []}),
            pdf: Some(b"%PDF-1.4\n% mock report\n".to_vec()),
            health_failure: None,
            submit_failure: None,
            result_failure: None,
            calls: CallCounters::default(),
            last_request: Mutex::new(None),
        }
    }

    /// Sets the job id handed out on submit
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    /// Scripts the status answers, consumed one per poll
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = ScriptedStatus>) -> Self {
        self.statuses = Mutex::new(statuses.into_iter().collect());
        self
    }

    /// Status returned after the script is exhausted
    pub fn with_fallback_status(mut self, status: JobStatus) -> Self {
        self.fallback_status = status;
        self
    }

    /// Raw result payload returned by `fetch_result`
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    /// PDF bytes; `None` makes PDF export fail with status 500
    pub fn with_pdf(mut self, pdf: Option<Vec<u8>>) -> Self {
        self.pdf = pdf;
        self
    }

    /// Makes health checks fail with the given scripted answer
    pub fn with_health_failure(mut self, failure: ScriptedStatus) -> Self {
        self.health_failure = Some(failure);
        self
    }

    /// Makes uploads fail with the given HTTP status
    pub fn with_submit_failure(mut self, status: u16) -> Self {
        self.submit_failure = Some(status);
        self
    }

    /// Makes result fetches fail with the given HTTP status
    pub fn with_result_failure(mut self, status: u16) -> Self {
        self.result_failure = Some(status);
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn calls(&self) -> MockCalls {
        MockCalls {
            health: self.calls.health.load(Ordering::SeqCst),
            submit: self.calls.submit.load(Ordering::SeqCst),
            status: self.calls.status.load(Ordering::SeqCst),
            result: self.calls.result.load(Ordering::SeqCst),
            pdf: self.calls.pdf.load(Ordering::SeqCst),
        }
    }

    /// The last request that reached `submit`
    pub fn last_request(&self) -> Option<AnalysisRequest> {
        lock(&self.last_request).clone()
    }

    fn next_status(&self) -> ScriptedStatus {
        lock(&self.statuses)
            .pop_front()
            .unwrap_or_else(|| ScriptedStatus::Status(self.fallback_status.clone()))
    }

    fn check_job_id(&self, operation: &str, job_id: &str) -> CoreResult<()> {
        if job_id == self.job_id {
            Ok(())
        } else {
            Err(service_failure(operation, 404, "Job not found"))
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn service_failure(operation: &str, status: u16, body: &str) -> CoreError {
    CoreError::Service {
        operation: operation.to_string(),
        status,
        body: body.to_string(),
    }
}

fn scripted_error(operation: &str, scripted: ScriptedStatus) -> CoreResult<JobStatus> {
    match scripted {
        ScriptedStatus::Status(status) => Ok(status),
        ScriptedStatus::TransportFailure => Err(CoreError::Transport(format!(
            "{} request failed: connection refused",
            operation
        ))),
        ScriptedStatus::ServiceFailure(status) => {
            Err(service_failure(operation, status, "scripted failure"))
        }
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health(&self) -> CoreResult<()> {
        self.calls.health.fetch_add(1, Ordering::SeqCst);
        match self.health_failure.clone() {
            None => Ok(()),
            Some(failure) => scripted_error("Health check", failure).map(|_| ()),
        }
    }

    async fn submit(&self, request: &AnalysisRequest) -> CoreResult<JobHandle> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        request.validate().map_err(CoreError::ValidationError)?;
        *lock(&self.last_request) = Some(request.clone());

        if let Some(status) = self.submit_failure {
            return Err(service_failure("Upload", status, "scripted failure"));
        }

        Ok(JobHandle::new(self.job_id.clone(), request.media_kind()))
    }

    async fn job_status(&self, job_id: &str) -> CoreResult<JobStatus> {
        self.calls.status.fetch_add(1, Ordering::SeqCst);
        self.check_job_id("Job status", job_id)?;
        scripted_error("Job status", self.next_status())
    }

    async fn fetch_result(&self, job_id: &str) -> CoreResult<Value> {
        self.calls.result.fetch_add(1, Ordering::SeqCst);
        self.check_job_id("Result fetch", job_id)?;
        if let Some(status) = self.result_failure {
            return Err(service_failure("Result fetch", status, "scripted failure"));
        }
        Ok(self.result.clone())
    }

    async fn fetch_pdf(&self, job_id: &str) -> CoreResult<Vec<u8>> {
        self.calls.pdf.fetch_add(1, Ordering::SeqCst);
        self.check_job_id("PDF generation", job_id)?;
        self.pdf
            .clone()
            .ok_or_else(|| service_failure("PDF generation", 500, "report unavailable"))
    }
}
