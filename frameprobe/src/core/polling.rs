//! Job Polling Loop
//!
//! Polls a submitted job at a fixed interval until it completes, fails, runs
//! out of attempts or is cancelled. Progress is a linear estimate against the
//! attempt budget and stays below 100 until completion is observed.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::analysis::{normalize_result, AnalysisResult, JobHandle, JobStatus};
use crate::core::service::AnalysisService;
use crate::core::CoreResult;

/// Default attempt budget (150 × 2 s = 5 minutes)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 150;

/// Default delay between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Highest progress reported before the job is seen completed
pub const MAX_PENDING_PROGRESS: u8 = 95;

/// Attempt budget and delay for the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollConfig {
    /// Upper bound on time spent waiting between attempts
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

/// Progress estimate for a pending job: `min(attempt / max * 100, 95)`.
pub fn estimate_progress(attempt: u32, max_attempts: u32) -> u8 {
    if max_attempts == 0 {
        return 0;
    }
    let percent = u64::from(attempt) * 100 / u64::from(max_attempts);
    percent.min(u64::from(MAX_PENDING_PROGRESS)) as u8
}

/// Progress event published after each status check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollProgress {
    /// Zero-based attempt that produced this event
    pub attempt: u32,
    pub percent: u8,
    /// Waiting time so far (`attempt × interval`)
    pub elapsed_secs: u64,
    pub status: JobStatus,
}

/// How a polling run ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Job completed and its result was fetched
    Completed(AnalysisResult),
    /// Service reported a terminal failure
    Failed { error: String, attempts: u32 },
    /// Attempt budget ran out while the job was still pending
    Exhausted { attempts: u32, elapsed_secs: u64 },
    /// Cancel token fired
    Cancelled { attempts: u32 },
}

/// Drives the status checks for one job
pub struct JobPoller {
    service: Arc<dyn AnalysisService>,
    config: PollConfig,
    progress: Option<mpsc::UnboundedSender<PollProgress>>,
}

impl JobPoller {
    pub fn new(service: Arc<dyn AnalysisService>, config: PollConfig) -> Self {
        Self {
            service,
            config,
            progress: None,
        }
    }

    /// Publish progress events on this channel
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<PollProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn publish(&self, event: PollProgress) {
        if let Some(sender) = &self.progress {
            // Receiver gone means nobody is watching; keep polling.
            let _ = sender.send(event);
        }
    }

    /// Poll `job` until a terminal outcome.
    ///
    /// Transport and service errors abort the loop with `Err` and publish no
    /// further progress.
    pub async fn poll(&self, job: &JobHandle, cancel: &CancellationToken) -> CoreResult<PollOutcome> {
        let max_attempts = self.config.max_attempts;
        let interval_secs = self.config.interval.as_secs();
        let started = tokio::time::Instant::now();

        for attempt in 0..max_attempts {
            if cancel.is_cancelled() {
                info!("Polling for job {} cancelled", job.short_id());
                return Ok(PollOutcome::Cancelled { attempts: attempt });
            }

            let status = self.service.job_status(&job.job_id).await?;
            debug!(
                "Job {} attempt {}/{}: {}",
                job.short_id(),
                attempt + 1,
                max_attempts,
                status
            );

            match status {
                JobStatus::Completed => {
                    self.publish(PollProgress {
                        attempt,
                        percent: 100,
                        elapsed_secs: u64::from(attempt) * interval_secs,
                        status: JobStatus::Completed,
                    });

                    let raw = self.service.fetch_result(&job.job_id).await?;
                    let result = normalize_result(raw);
                    info!(
                        "Job {} completed with {} finding(s)",
                        job.short_id(),
                        result.findings.len()
                    );
                    return Ok(PollOutcome::Completed(result));
                }
                JobStatus::Failed { error } => {
                    warn!("Job {} failed: {}", job.short_id(), error);
                    return Ok(PollOutcome::Failed {
                        error,
                        attempts: attempt + 1,
                    });
                }
                pending => {
                    self.publish(PollProgress {
                        attempt,
                        percent: estimate_progress(attempt, max_attempts),
                        elapsed_secs: u64::from(attempt) * interval_secs,
                        status: pending,
                    });
                }
            }

            if attempt + 1 == max_attempts {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Polling for job {} cancelled", job.short_id());
                    return Ok(PollOutcome::Cancelled { attempts: attempt + 1 });
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        let elapsed_secs = started.elapsed().as_secs();
        warn!(
            "Job {} still pending after {} attempts ({}s)",
            job.short_id(),
            max_attempts,
            elapsed_secs
        );
        Ok(PollOutcome::Exhausted {
            attempts: max_attempts,
            elapsed_secs,
        })
    }
}
