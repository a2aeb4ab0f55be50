//! Analysis Domain
//!
//! Requests, job handles, findings and severity classification.

pub mod finding;
pub mod input_validation;
pub mod job;
pub mod request;
pub mod severity;

// Re-export main types
pub use finding::{
    normalize_finding, normalize_result, AnalysisResult, Finding, Location, MetricValue,
};
pub use job::{JobHandle, JobStatus};
pub use request::{
    AnalysisMode, AnalysisRequest, MediaKind, MediaParams, MediaPayload, SamplingMode,
    SequenceType,
};
pub use severity::{
    classify, unclassified, SeverityBucket, SeverityBuckets, SeverityCounts, SeverityFilter,
};
