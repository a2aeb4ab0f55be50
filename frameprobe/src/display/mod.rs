//! Presentation Layer
//!
//! Turns a normalized result into the labels, cards and text report shown to
//! the user. Nothing here changes the underlying findings.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::analysis::{
    classify, AnalysisResult, Finding, JobStatus, Location, SeverityBucket, SeverityCounts,
    SeverityFilter,
};
use crate::core::polling::PollProgress;

/// Frame indices listed before the list is truncated
const MAX_LISTED_FRAMES: usize = 5;

pub const NOTICE_TITLE: &str = "Important Notice";
pub const NOTICE_TEXT: &str = "Findings represent anomaly signals, not proof of manipulation. \
Platform recompression may affect results.";
pub const NO_ANOMALIES_TEXT: &str = "No anomalies detected - media appears consistent";
pub const ANALYSIS_COMPLETE_TEXT: &str = "Analysis complete!";

// =============================================================================
// Labels & Values
// =============================================================================

/// Enum qualifier the service puts in front of finding types
const FINDING_TYPE_QUALIFIER: &str = "FindingType.";

/// Finding type for display: the `FindingType.` qualifier is dropped and
/// underscores become spaces (`FindingType.FRAME_DROP` → `FRAME DROP`).
pub fn display_finding_type(finding_type: &str) -> String {
    let bare = finding_type
        .strip_prefix(FINDING_TYPE_QUALIFIER)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(finding_type);
    bare.replace('_', " ")
}

/// `frame_count` → `Frame Count`
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders a location as `1.50s - 3.20s`, `Frames: 1, 2, 3, 4, 5... (12 total)` or `N/A`.
pub fn format_location(location: &Location) -> String {
    match location {
        Location::TimeRange { start, end } => format!("{:.2}s - {:.2}s", start, end),
        Location::Frames(frames) => {
            let listed: Vec<String> = frames
                .iter()
                .take(MAX_LISTED_FRAMES)
                .map(|f| f.to_string())
                .collect();
            let mut text = format!("Frames: {}", listed.join(", "));
            if frames.len() > MAX_LISTED_FRAMES {
                let _ = write!(text, "... ({} total)", frames.len());
            }
            text
        }
        Location::Unspecified => "N/A".to_string(),
    }
}

/// Metric values: floats to 4 decimals, other scalars as-is
pub fn format_metric_value(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) => format!("{:.4}", f),
            None => n.to_string(),
        },
        other => format_value(other),
    }
}

/// Plain rendering of a JSON value: strings without quotes, `null` as `N/A`
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

/// Media info as `(label, value)` pairs in server order
pub fn media_info_rows(media_info: &Map<String, Value>) -> Vec<(String, String)> {
    media_info
        .iter()
        .map(|(key, value)| (humanize_key(key), format_value(value)))
        .collect()
}

/// Hex color used for a severity tone
pub fn tone_color(bucket: SeverityBucket) -> &'static str {
    match bucket {
        SeverityBucket::High => "#dc2626",
        SeverityBucket::Medium => "#ea580c",
        SeverityBucket::Low => "#f59e0b",
    }
}

// =============================================================================
// Status Lines
// =============================================================================

/// Job id as shown to users: first 8 characters followed by `...`
pub fn display_job_id(job_id: &str) -> String {
    format!("{}...", crate::core::short_job_id(job_id))
}

/// One status line for a progress event
pub fn format_progress(progress: &PollProgress) -> String {
    match progress.status {
        JobStatus::Completed => format!("[{}] {}", progress_bar(100), ANALYSIS_COMPLETE_TEXT),
        _ => format!(
            "[{}] {:>3}% Processing... ({}s elapsed)",
            progress_bar(progress.percent),
            progress.percent,
            progress.elapsed_secs
        ),
    }
}

fn progress_bar(percent: u8) -> String {
    const WIDTH: usize = 20;
    let filled = (usize::from(percent.min(100)) * WIDTH) / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(WIDTH - filled))
}

// =============================================================================
// Cards & Markers
// =============================================================================

/// Everything shown for one finding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingCard {
    pub bucket: SeverityBucket,
    pub title: String,
    pub location: String,
    pub explanation: String,
    /// `(label, formatted value)` in server order
    pub metrics: Vec<(String, String)>,
}

impl FindingCard {
    pub fn new(finding: &Finding, bucket: SeverityBucket) -> Self {
        Self {
            bucket,
            title: display_finding_type(&finding.finding_type),
            location: format_location(&finding.location()),
            explanation: finding.explanation.clone(),
            metrics: finding
                .metrics
                .iter()
                .map(|(key, value)| (humanize_key(key), format_metric_value(value)))
                .collect(),
        }
    }
}

/// A finding placed on the timeline overview
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMarker {
    pub start: f64,
    pub end: f64,
    /// Single tone with High > Medium > Low precedence; unmatched is Low
    pub tone: SeverityBucket,
    pub finding_type: String,
}

impl TimelineMarker {
    pub fn new(finding: &Finding) -> Self {
        let bound = |key: &str| finding.location.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        Self {
            start: bound("start"),
            end: bound("end"),
            tone: SeverityBucket::dominant(&finding.severity),
            finding_type: finding.finding_type.clone(),
        }
    }

    pub fn color(&self) -> &'static str {
        tone_color(self.tone)
    }
}

// =============================================================================
// Report
// =============================================================================

/// Display state for a result under a severity filter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub media_info: Vec<(String, String)>,
    pub counts: SeverityCounts,
    pub total_findings: usize,
    pub timeline: Vec<TimelineMarker>,
    /// Visible groups in High → Low order, empty groups omitted
    pub groups: Vec<(SeverityBucket, Vec<FindingCard>)>,
}

impl ReportView {
    pub fn new(result: &AnalysisResult, filter: &SeverityFilter) -> Self {
        let buckets = classify(&result.findings);
        let groups = buckets
            .visible(filter)
            .into_iter()
            .map(|(bucket, findings)| {
                let cards = findings.iter().map(|f| FindingCard::new(f, bucket)).collect();
                (bucket, cards)
            })
            .collect();

        Self {
            media_info: media_info_rows(&result.media_info),
            counts: buckets.counts(),
            total_findings: result.findings.len(),
            timeline: result.findings.iter().map(TimelineMarker::new).collect(),
            groups,
        }
    }

    /// True when the service reported no findings at all
    pub fn no_anomalies(&self) -> bool {
        self.total_findings == 0
    }
}

/// Plain-text report for terminals and logs
pub fn render_report(result: &AnalysisResult, filter: &SeverityFilter) -> String {
    let view = ReportView::new(result, filter);
    let mut out = String::new();

    let _ = writeln!(out, "!! {}", NOTICE_TITLE);
    let _ = writeln!(out, "{}", NOTICE_TEXT);
    let _ = writeln!(out);

    let _ = writeln!(out, "Media Information");
    if view.media_info.is_empty() {
        let _ = writeln!(out, "  (none reported)");
    }
    for (label, value) in &view.media_info {
        let _ = writeln!(out, "  {}: {}", label, value);
    }
    let _ = writeln!(out);

    if view.no_anomalies() {
        let _ = writeln!(out, "{}", NO_ANOMALIES_TEXT);
        return out;
    }

    let _ = writeln!(out, "Timeline Overview");
    for marker in &view.timeline {
        let _ = writeln!(
            out,
            "  [{:<6}] {:>8.2}s - {:>8.2}s  {}",
            marker.tone.to_string(),
            marker.start,
            marker.end,
            display_finding_type(&marker.finding_type)
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Anomaly Distribution: High {} | Medium {} | Low {}",
        view.counts.high, view.counts.medium, view.counts.low
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Findings ({})", view.total_findings);
    if view.groups.is_empty() {
        let _ = writeln!(out, "  (no findings match the selected severities)");
    }
    for (bucket, cards) in &view.groups {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} Severity Findings", bucket);
        for card in cards {
            let _ = writeln!(out, "  * {} - {}", card.title, card.location);
            if !card.explanation.is_empty() {
                let _ = writeln!(out, "    {}", card.explanation);
            }
            for (label, value) in &card.metrics {
                let _ = writeln!(out, "      {}: {}", label, value);
            }
        }
    }

    out
}
