//! End-to-end workflow tests
//!
//! Drive a session against the mock service from submission through
//! classification and display, and check the progress guarantees of the
//! polling loop across many scripted sequences.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::analysis::{
    classify, AnalysisMode, AnalysisRequest, JobStatus, MediaParams, MediaPayload, SamplingMode,
    SequenceType, SeverityBucket, SeverityFilter,
};
use crate::core::export::{export_json, parse_json_export};
use crate::core::polling::{PollConfig, PollProgress};
use crate::core::service::{MockAnalysisService, ScriptedStatus};
use crate::core::session::AnalysisSession;
use crate::core::CoreError;
use crate::display::{
    format_location, render_report, FindingCard, ReportView, NO_ANOMALIES_TEXT,
};

fn config(max_attempts: u32) -> PollConfig {
    PollConfig {
        max_attempts,
        interval: Duration::from_secs(2),
    }
}

fn video_request() -> AnalysisRequest {
    AnalysisRequest::video(
        MediaPayload::new("clip.mp4", vec![0; 64]),
        AnalysisMode::Standard,
        SamplingMode::Sampled,
    )
}

fn drain(rx: &mut mpsc::UnboundedReceiver<PollProgress>) -> Vec<PollProgress> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn scenario_clean_video_reports_no_anomalies() {
    let mock = Arc::new(
        MockAnalysisService::new()
            .with_job_id("abc123")
            .with_statuses([
                ScriptedStatus::from(JobStatus::Processing),
                ScriptedStatus::from(JobStatus::Processing),
            ])
            .with_result(json!({"media_info": {"duration": 12.5}, "findings": []})),
    );
    let mut session = AnalysisSession::new(mock.clone(), PollConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let result = session
        .analyze(&video_request(), &CancellationToken::new(), Some(tx))
        .await
        .unwrap()
        .clone();

    let sent = mock.last_request().unwrap();
    assert_eq!(sent.mode, AnalysisMode::Standard);
    assert_eq!(
        sent.params,
        MediaParams::Video {
            sampling_mode: SamplingMode::Sampled
        }
    );
    assert_eq!(session.active_job().unwrap().job_id, "abc123");
    assert_eq!(mock.calls().status, 3);

    let counts = classify(&result.findings).counts();
    assert_eq!((counts.high, counts.medium, counts.low), (0, 0, 0));

    let view = ReportView::new(&result, &SeverityFilter::all());
    assert!(view.no_anomalies());
    assert!(render_report(&result, &SeverityFilter::all()).contains(NO_ANOMALIES_TEXT));

    let percents: Vec<u8> = drain(&mut rx).iter().map(|e| e.percent).collect();
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn scenario_single_image_is_rejected_before_transport() {
    let mock = Arc::new(MockAnalysisService::new());
    let mut session = AnalysisSession::new(mock.clone(), PollConfig::default());
    let request = AnalysisRequest::images(
        vec![MediaPayload::new("only.png", vec![1, 2, 3])],
        AnalysisMode::Standard,
        SequenceType::Ordered,
    );

    let err = session.submit(&request).await.unwrap_err();
    match err {
        CoreError::ValidationError(message) => {
            assert!(message.contains("at least 2 images required"))
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(mock.calls(), Default::default());
}

#[tokio::test(start_paused = true)]
async fn scenario_high_confidence_lands_in_high_only() {
    let mock = Arc::new(MockAnalysisService::new().with_result(json!({
        "findings": [{"type": "splice", "severity": "HIGH confidence"}]
    })));
    let mut session = AnalysisSession::new(mock, PollConfig::default());

    let result = session
        .analyze(&video_request(), &CancellationToken::new(), None)
        .await
        .unwrap();
    let buckets = classify(&result.findings);
    assert_eq!(buckets.high.len(), 1);
    assert!(buckets.medium.is_empty());
    assert!(buckets.low.is_empty());
}

#[tokio::test(start_paused = true)]
async fn scenario_failed_job_surfaces_message() {
    let mock = Arc::new(MockAnalysisService::new().with_statuses([ScriptedStatus::Status(
        JobStatus::Failed {
            error: "corrupt file".to_string(),
        },
    )]));
    let mut session = AnalysisSession::new(mock.clone(), PollConfig::default());

    let err = session
        .analyze(&video_request(), &CancellationToken::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_user_message(), "corrupt file");
    assert_eq!(mock.calls().status, 1);
    assert_eq!(mock.calls().result, 0);
}

#[tokio::test(start_paused = true)]
async fn scenario_missing_location_renders_na() {
    let mock = Arc::new(MockAnalysisService::new().with_result(json!({
        "findings": [{"type": "FindingType.BLUR", "severity": "low", "explanation": "soft"}]
    })));
    let mut session = AnalysisSession::new(mock, PollConfig::default());

    let result = session
        .analyze(&video_request(), &CancellationToken::new(), None)
        .await
        .unwrap();
    let finding = &result.findings[0];
    assert!(finding.location.is_empty());
    assert_eq!(format_location(&finding.location()), "N/A");
    assert_eq!(FindingCard::new(finding, SeverityBucket::Low).location, "N/A");
}

#[tokio::test(start_paused = true)]
async fn progress_is_monotonic_and_hits_100_only_on_completion() {
    for completes_at in [0u32, 1, 2, 7, 49, 149] {
        let pending = (0..completes_at).map(|i| {
            if i % 3 == 0 {
                ScriptedStatus::Status(JobStatus::Queued)
            } else {
                ScriptedStatus::Status(JobStatus::Processing)
            }
        });
        let mock = Arc::new(MockAnalysisService::new().with_statuses(pending));
        let mut session = AnalysisSession::new(mock, config(150));
        let (tx, mut rx) = mpsc::unbounded_channel();

        session
            .analyze(&video_request(), &CancellationToken::new(), Some(tx))
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len() as u32, completes_at + 1);
        assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
        for event in &events[..events.len() - 1] {
            assert!(event.percent <= 95, "pending progress {}", event.percent);
        }
        let last = &events[events.len() - 1];
        assert_eq!(last.percent, 100);
        assert_eq!(last.attempt, completes_at);
    }
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_terminates_without_reaching_100() {
    let mock = Arc::new(MockAnalysisService::new().with_fallback_status(JobStatus::Processing));
    let mut session = AnalysisSession::new(mock.clone(), PollConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let started = tokio::time::Instant::now();
    let err = session
        .analyze(&video_request(), &CancellationToken::new(), Some(tx))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::PollingExhausted { attempts: 150, .. }));
    assert!(started.elapsed() <= PollConfig::default().budget());
    assert_eq!(mock.calls().status, 150);
    assert_eq!(mock.calls().result, 0);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 150);
    assert!(events.iter().all(|e| e.percent < 100));
}

#[tokio::test(start_paused = true)]
async fn classification_is_idempotent() {
    let mock = Arc::new(MockAnalysisService::new().with_result(json!({
        "findings": [
            {"severity": "high"},
            {"severity": "Medium-Low"},
            {"severity": "unknown"},
            {"severity": "LOW"}
        ]
    })));
    let mut session = AnalysisSession::new(mock, PollConfig::default());
    let result = session
        .analyze(&video_request(), &CancellationToken::new(), None)
        .await
        .unwrap();

    let first = classify(&result.findings);
    let second = classify(&result.findings);
    assert_eq!(first, second);
    assert_eq!(first.counts(), second.counts());
    assert_eq!(first.counts().low, 2);
}

#[tokio::test(start_paused = true)]
async fn export_round_trip_preserves_result() {
    let mock = Arc::new(MockAnalysisService::new().with_result(json!({
        "media_info": {"width": 1920, "codec": "hevc", "bitrate_kbps": 8000.5},
        "findings": [
            {
                "type": "FindingType.DUPLICATE_FRAME",
                "severity": "medium",
                "location": {"frames": [4, 5, 6]},
                "explanation": "Identical frames",
                "metrics": {"similarity": 0.9991, "pairs": 2, "flags": ["x"]},
                "debug": null
            },
            {"severity": "low"}
        ],
        "engine": {"version": "3.0"}
    })));
    let mut session = AnalysisSession::new(mock, PollConfig::default());
    let result = session
        .analyze(&video_request(), &CancellationToken::new(), None)
        .await
        .unwrap()
        .clone();

    let parsed = parse_json_export(&export_json(&result).unwrap()).unwrap();
    assert_eq!(parsed.findings.len(), result.findings.len());
    assert_eq!(parsed, result);
}

#[tokio::test(start_paused = true)]
async fn export_of_malformed_result_matches_service_payload() {
    let payload = json!({
        "media_info": ["1920x1080", "h264"],
        "findings": [
            {"type": "FindingType.SPLICE", "severity": 0.8, "metrics": "n/a"},
            {"severity": "high", "location": [12, 13]},
            42,
            {"explanation": null}
        ],
        "warnings": ["decoder fell back to software"]
    });
    let mock = Arc::new(MockAnalysisService::new().with_result(payload.clone()));
    let mut session = AnalysisSession::new(mock, PollConfig::default());
    let result = session
        .analyze(&video_request(), &CancellationToken::new(), None)
        .await
        .unwrap()
        .clone();

    assert!(result.media_info.is_empty());
    assert_eq!(result.findings.len(), 4);
    assert!(result.findings[1].location.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = session.export_json(dir.path()).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    let exported: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(exported, payload);

    let parsed = parse_json_export(&text).unwrap();
    assert_eq!(parsed, result);
    assert_eq!(export_json(&parsed).unwrap(), text);
}
