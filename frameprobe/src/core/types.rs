//! Frameprobe Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

// =============================================================================
// ID Types
// =============================================================================

/// Service-assigned analysis job identifier (opaque)
pub type JobId = String;

/// Client session identifier (ULID)
pub type SessionId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Frame index within an image sequence or video
pub type FrameIndex = i64;

/// Number of leading job-id characters shown to users and used in file names
pub const SHORT_ID_LEN: usize = 8;

/// Returns the user-facing short form of a job id.
pub fn short_job_id(job_id: &str) -> &str {
    match job_id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &job_id[..idx],
        None => job_id,
    }
}
