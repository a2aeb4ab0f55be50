//! Export Adapter
//!
//! Writes the held analysis result as indented JSON and stores PDF reports
//! fetched from the service. File names carry the short job id.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::analysis::{normalize_result, AnalysisResult};
use crate::core::fs::{atomic_write_bytes, sanitize_file_component};
use crate::core::{short_job_id, CoreError, CoreResult};

/// Fallback name segment for job ids with no file-safe characters
const FALLBACK_NAME: &str = "job";

/// Serializes a result to pretty-printed JSON.
///
/// Results fetched from the service are written as received, including fields
/// the normalizer defaulted or replaced.
pub fn export_json(result: &AnalysisResult) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(&result.export_value()?)?)
}

/// Parses a JSON export back into a normalized result.
pub fn parse_json_export(text: &str) -> CoreResult<AnalysisResult> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    Ok(normalize_result(raw))
}

fn name_segment(job_id: &str) -> String {
    sanitize_file_component(short_job_id(job_id), FALLBACK_NAME)
}

/// `frame-analysis-{short id}.json`
pub fn json_file_name(job_id: &str) -> String {
    format!("frame-analysis-{}.json", name_segment(job_id))
}

/// `frame-analysis-report-{short id}.pdf`
pub fn pdf_file_name(job_id: &str) -> String {
    format!("frame-analysis-report-{}.pdf", name_segment(job_id))
}

/// Writes the JSON export into `dir`, returning the file path.
pub fn write_json_export(dir: &Path, job_id: &str, result: &AnalysisResult) -> CoreResult<PathBuf> {
    let text = export_json(result)?;
    let path = dir.join(json_file_name(job_id));
    atomic_write_bytes(&path, text.as_bytes())?;
    info!("Wrote JSON export to {}", path.display());
    Ok(path)
}

/// Writes PDF bytes into `dir`, returning the file path.
pub fn write_pdf_export(dir: &Path, job_id: &str, pdf: &[u8]) -> CoreResult<PathBuf> {
    if pdf.is_empty() {
        return Err(CoreError::MalformedResponse(
            "PDF generation returned an empty report".to_string(),
        ));
    }
    let path = dir.join(pdf_file_name(job_id));
    atomic_write_bytes(&path, pdf)?;
    info!("Wrote PDF report to {} ({} bytes)", path.display(), pdf.len());
    Ok(path)
}
