//! Analysis Request Types
//!
//! Data models for submitting a video or an image sequence to the analysis
//! service. A request carries the shared analysis mode, exactly one
//! kind-specific parameter, and the binary payloads to upload.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use super::input_validation::{
    validate_extension, MIN_SEQUENCE_IMAGES, SOFT_VIDEO_SIZE_CAP_BYTES,
};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Enums
// =============================================================================

/// Kind of media submitted for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A single video file
    Video,
    /// Two or more still images
    ImageSequence,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::ImageSequence => write!(f, "image sequence"),
        }
    }
}

/// Analysis depth requested from the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Standard,
    HighSensitivity,
    DeepScan,
}

impl AnalysisMode {
    /// Stable wire string sent in the `mode` form field
    pub fn as_wire(&self) -> &'static str {
        match self {
            AnalysisMode::Standard => "standard",
            AnalysisMode::HighSensitivity => "high_sensitivity",
            AnalysisMode::DeepScan => "deep_scan",
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Standard => write!(f, "Standard (Default)"),
            AnalysisMode::HighSensitivity => write!(f, "High Sensitivity"),
            AnalysisMode::DeepScan => write!(f, "Deep Scan"),
        }
    }
}

/// Frame sampling strategy for video analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// 2-5 frames per second
    #[default]
    Sampled,
    /// Every frame
    Full,
}

impl SamplingMode {
    pub fn as_wire(&self) -> &'static str {
        match self {
            SamplingMode::Sampled => "sampled",
            SamplingMode::Full => "full",
        }
    }
}

impl std::fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingMode::Sampled => write!(f, "Sampled (2-5 fps)"),
            SamplingMode::Full => write!(f, "Full Scan (All Frames)"),
        }
    }
}

/// Whether an image sequence has a meaningful order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceType {
    #[default]
    Ordered,
    Unordered,
}

impl SequenceType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            SequenceType::Ordered => "ordered",
            SequenceType::Unordered => "unordered",
        }
    }
}

impl std::fmt::Display for SequenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceType::Ordered => write!(f, "Ordered Sequence"),
            SequenceType::Unordered => write!(f, "Unordered Batch"),
        }
    }
}

/// Kind-specific request parameter. Exactly one exists per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "media_kind", rename_all = "snake_case")]
pub enum MediaParams {
    Video { sampling_mode: SamplingMode },
    ImageSequence { sequence_type: SequenceType },
}

impl MediaParams {
    pub fn media_kind(&self) -> MediaKind {
        match self {
            MediaParams::Video { .. } => MediaKind::Video,
            MediaParams::ImageSequence { .. } => MediaKind::ImageSequence,
        }
    }
}

// =============================================================================
// Payload
// =============================================================================

/// One binary file to upload
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    /// File name reported in the multipart part
    pub file_name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPayload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl MediaPayload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads a file from disk, checking its extension against the media kind.
    ///
    /// Videos above the advisory size cap are accepted with a warning.
    pub async fn from_path(path: &Path, kind: MediaKind) -> CoreResult<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CoreError::ValidationError(format!("Invalid file path: {}", path.display()))
            })?
            .to_string();

        validate_extension(&file_name, kind).map_err(CoreError::ValidationError)?;

        let bytes = tokio::fs::read(path).await?;

        if kind == MediaKind::Video && bytes.len() as u64 > SOFT_VIDEO_SIZE_CAP_BYTES {
            warn!(
                "{} is {:.2} MB, above the advisory 500 MB upload size",
                file_name,
                bytes.len() as f64 / 1024.0 / 1024.0
            );
        }

        Ok(Self { file_name, bytes })
    }
}

// =============================================================================
// Request
// =============================================================================

/// A single analysis submission, built per user action
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Analysis depth
    pub mode: AnalysisMode,
    /// Kind-specific parameter
    pub params: MediaParams,
    /// Files to upload
    pub payloads: Vec<MediaPayload>,
}

impl AnalysisRequest {
    /// Video request with a single payload
    pub fn video(payload: MediaPayload, mode: AnalysisMode, sampling_mode: SamplingMode) -> Self {
        Self {
            mode,
            params: MediaParams::Video { sampling_mode },
            payloads: vec![payload],
        }
    }

    /// Image sequence request
    pub fn images(
        payloads: Vec<MediaPayload>,
        mode: AnalysisMode,
        sequence_type: SequenceType,
    ) -> Self {
        Self {
            mode,
            params: MediaParams::ImageSequence { sequence_type },
            payloads,
        }
    }

    pub fn media_kind(&self) -> MediaKind {
        self.params.media_kind()
    }

    /// Total upload size in bytes
    pub fn total_bytes(&self) -> u64 {
        self.payloads.iter().map(|p| p.len() as u64).sum()
    }

    /// Validate the request before any network call
    pub fn validate(&self) -> Result<(), String> {
        match self.params {
            MediaParams::Video { .. } => {
                if self.payloads.len() != 1 {
                    return Err(format!(
                        "Video analysis takes exactly one file, got {}",
                        self.payloads.len()
                    ));
                }
            }
            MediaParams::ImageSequence { .. } => {
                if self.payloads.len() < MIN_SEQUENCE_IMAGES {
                    return Err(format!(
                        "at least {} images required, got {}",
                        MIN_SEQUENCE_IMAGES,
                        self.payloads.len()
                    ));
                }
            }
        }

        if let Some(empty) = self.payloads.iter().find(|p| p.is_empty()) {
            return Err(format!("File '{}' is empty", empty.file_name));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
