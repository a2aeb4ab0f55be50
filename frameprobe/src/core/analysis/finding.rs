//! Findings & Result Normalization
//!
//! Converts the raw findings payload returned by the service into a stable
//! in-memory shape. Missing or odd-shaped fields are replaced by defaults
//! instead of failing the whole result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::core::{FrameIndex, TimeSec};

/// Default `type` for findings that do not carry one
pub const UNKNOWN_FINDING_TYPE: &str = "Unknown";

// =============================================================================
// Metric Values
// =============================================================================

/// A single metric reported with a finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(Number),
    Text(String),
    Flag(bool),
    /// Arrays, objects and nulls are kept as received
    Other(Value),
}

impl MetricValue {
    /// Builds a metric from a float, falling back to its string form when
    /// JSON cannot represent it (NaN, infinities).
    pub fn from_f64(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => MetricValue::Number(n),
            None => MetricValue::Text(value.to_string()),
        }
    }

    /// Numeric value, if the metric is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl From<Value> for MetricValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => MetricValue::Number(n),
            Value::String(s) => MetricValue::Text(s),
            Value::Bool(b) => MetricValue::Flag(b),
            other => MetricValue::Other(other),
        }
    }
}

// =============================================================================
// Location
// =============================================================================

/// Typed view over a finding's raw location mapping
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// Time range within a video, in seconds
    TimeRange { start: TimeSec, end: TimeSec },
    /// Frame indices within an image sequence
    Frames(Vec<FrameIndex>),
    /// Missing or unrecognized location
    Unspecified,
}

impl Location {
    /// Interpret a raw location mapping.
    ///
    /// A mapping with numeric `start` and `end` is a time range; otherwise a
    /// `frames` array is read, skipping non-integer entries.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        if let (Some(start), Some(end)) = (
            map.get("start").and_then(Value::as_f64),
            map.get("end").and_then(Value::as_f64),
        ) {
            return Location::TimeRange { start, end };
        }

        if let Some(frames) = map.get("frames").and_then(Value::as_array) {
            return Location::Frames(frames.iter().filter_map(Value::as_i64).collect());
        }

        Location::Unspecified
    }
}

// =============================================================================
// Finding & Result
// =============================================================================

/// One detected anomaly signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Free-text category, possibly qualified (e.g. `FindingType.FRAME_DROP`)
    #[serde(rename = "type")]
    pub finding_type: String,
    /// Free-text severity, matched case-insensitively
    pub severity: String,
    /// Raw location mapping (`{start, end}` or `{frames}`)
    pub location: Map<String, Value>,
    /// Human-readable explanation
    pub explanation: String,
    /// Metric name to value
    pub metrics: Map<String, Value>,
    /// Fields the client does not interpret, kept for export
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Finding {
    fn default() -> Self {
        Self {
            finding_type: UNKNOWN_FINDING_TYPE.to_string(),
            severity: String::new(),
            location: Map::new(),
            explanation: String::new(),
            metrics: Map::new(),
            extra: Map::new(),
        }
    }
}

impl Finding {
    /// Typed view of the location
    pub fn location(&self) -> Location {
        Location::from_map(&self.location)
    }

    /// Metrics in server order, as typed values
    pub fn metric_values(&self) -> Vec<(&str, MetricValue)> {
        self.metrics
            .iter()
            .map(|(k, v)| (k.as_str(), MetricValue::from(v.clone())))
            .collect()
    }

    /// Sets a metric value
    pub fn with_metric(mut self, name: impl Into<String>, value: MetricValue) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.metrics.insert(name.into(), value);
        self
    }
}

/// Normalized analysis result held by the session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Descriptive key/value pairs about the analyzed media, in server order
    pub media_info: Map<String, Value>,
    /// Findings in server order, never re-sorted
    pub findings: Vec<Finding>,
    /// Top-level fields the client does not interpret, kept for export
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Payload exactly as received; `Null` for results built in memory
    #[serde(skip)]
    pub raw: Value,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Payload as received when available, otherwise the normalized form
    pub fn export_value(&self) -> serde_json::Result<Value> {
        if self.raw.is_null() {
            serde_json::to_value(self)
        } else {
            Ok(self.raw.clone())
        }
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Renders a JSON value as text; `null` becomes `None` and non-strings use
/// their compact JSON form.
pub(crate) fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn object_field(value: Option<&Value>, field: &str) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            warn!("Ignoring non-object '{}' field: {}", field, other);
            Map::new()
        }
    }
}

/// Normalizes one raw finding, defaulting every absent sub-field.
pub fn normalize_finding(raw: &Value) -> Finding {
    let Some(obj) = raw.as_object() else {
        warn!("Finding is not an object, using defaults: {}", raw);
        return Finding::default();
    };

    let mut extra = obj.clone();
    for key in ["type", "severity", "location", "explanation", "metrics"] {
        extra.remove(key);
    }

    Finding {
        finding_type: text_field(obj.get("type"))
            .unwrap_or_else(|| UNKNOWN_FINDING_TYPE.to_string()),
        severity: text_field(obj.get("severity")).unwrap_or_default(),
        location: object_field(obj.get("location"), "location"),
        explanation: text_field(obj.get("explanation")).unwrap_or_default(),
        metrics: object_field(obj.get("metrics"), "metrics"),
        extra,
    }
}

/// Normalizes a raw result payload into an [`AnalysisResult`].
///
/// Never fails: a missing `media_info` yields an empty mapping and a missing
/// or non-array `findings` yields an empty sequence. The payload itself is
/// kept in `raw` so exports can reproduce it.
pub fn normalize_result(raw: Value) -> AnalysisResult {
    let Value::Object(mut obj) = raw.clone() else {
        warn!("Result payload is not an object, using empty result");
        return AnalysisResult {
            raw,
            ..AnalysisResult::default()
        };
    };

    let media_info = object_field(obj.get("media_info"), "media_info");

    let findings = match obj.get("findings") {
        Some(Value::Array(items)) => items.iter().map(normalize_finding).collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            warn!("Ignoring non-array 'findings' field: {}", other);
            Vec::new()
        }
    };

    obj.remove("media_info");
    obj.remove("findings");

    AnalysisResult {
        media_info,
        findings,
        extra: obj,
        raw,
    }
}

// =============================================================================
// Tests
// =============================================================================
