//! Shared input normalization and validation for analysis requests.

use std::path::Path;

use super::request::{AnalysisMode, MediaKind, SamplingMode, SequenceType};

/// Video container extensions accepted for upload.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

/// Raster image extensions accepted for sequence upload.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Advisory upload size for videos (500 MB). Not enforced, only reported.
pub const SOFT_VIDEO_SIZE_CAP_BYTES: u64 = 500 * 1024 * 1024;

/// Minimum number of images in a sequence request.
pub const MIN_SEQUENCE_IMAGES: usize = 2;

/// Normalize enum-like string inputs from the command line.
pub fn normalize_enum_input(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('-', "_")
}

/// Parse a user-facing analysis mode string into a typed enum.
pub fn parse_mode(mode: &str) -> Result<AnalysisMode, String> {
    match normalize_enum_input(mode).as_str() {
        "standard" => Ok(AnalysisMode::Standard),
        "high_sensitivity" => Ok(AnalysisMode::HighSensitivity),
        "deep_scan" => Ok(AnalysisMode::DeepScan),
        _ => Err(format!(
            "Invalid analysis mode: '{}'. Valid: standard, high_sensitivity, deep_scan",
            mode
        )),
    }
}

/// Parse a user-facing sampling mode string into a typed enum.
pub fn parse_sampling_mode(value: &str) -> Result<SamplingMode, String> {
    match normalize_enum_input(value).as_str() {
        "sampled" => Ok(SamplingMode::Sampled),
        "full" => Ok(SamplingMode::Full),
        _ => Err(format!(
            "Invalid sampling mode: '{}'. Valid: sampled, full",
            value
        )),
    }
}

/// Parse a user-facing sequence type string into a typed enum.
pub fn parse_sequence_type(value: &str) -> Result<SequenceType, String> {
    match normalize_enum_input(value).as_str() {
        "ordered" => Ok(SequenceType::Ordered),
        "unordered" => Ok(SequenceType::Unordered),
        _ => Err(format!(
            "Invalid sequence type: '{}'. Valid: ordered, unordered",
            value
        )),
    }
}

/// Extensions accepted for a media kind.
pub fn accepted_extensions(kind: MediaKind) -> &'static [&'static str] {
    match kind {
        MediaKind::Video => VIDEO_EXTENSIONS,
        MediaKind::ImageSequence => IMAGE_EXTENSIONS,
    }
}

/// Check that a file name carries an extension accepted for the media kind.
pub fn validate_extension(file_name: &str, kind: MediaKind) -> Result<(), String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let accepted = accepted_extensions(kind);
    if accepted.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(format!(
            "Unsupported file type for {}: '{}'. Accepted: {}",
            kind,
            file_name,
            accepted.join(", ")
        ))
    }
}

/// Guess the upload content type from a file name.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Validate and normalize the analysis-service base URL.
///
/// - Requires http/https
/// - Trims whitespace
/// - Removes trailing slash
pub fn validate_base_url(url: &str) -> Result<String, String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err("Base URL cannot be empty".to_string());
    }

    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| format!("Invalid base URL '{}': {}", trimmed, e))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.trim_end_matches('/').to_string()),
        scheme => Err(format!(
            "Invalid base URL scheme '{}'. Use http or https.",
            scheme
        )),
    }
}
