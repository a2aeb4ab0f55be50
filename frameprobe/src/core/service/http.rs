//! HTTP Analysis Service
//!
//! reqwest client for the analysis REST API. Every call carries its own
//! timeout; failures are mapped to transport, service or malformed-response
//! errors and returned without retrying.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::AnalysisService;
use crate::core::analysis::input_validation::{content_type_for, validate_base_url};
use crate::core::analysis::{AnalysisRequest, JobHandle, JobStatus, MediaKind, MediaParams};
use crate::core::analysis::finding::text_field;
use crate::core::fs::validate_job_id;
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Constants
// =============================================================================

/// Maximum number of error body characters kept in a service error
const MAX_ERROR_BODY_CHARS: usize = 500;

const OP_HEALTH: &str = "Health check";
const OP_UPLOAD: &str = "Upload";
const OP_STATUS: &str = "Job status";
const OP_RESULT: &str = "Result fetch";
const OP_PDF: &str = "PDF generation";

// =============================================================================
// Timeouts
// =============================================================================

/// Per-call timeouts for the analysis API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTimeouts {
    pub health: Duration,
    pub submit: Duration,
    /// Used for both job status and result fetches
    pub poll: Duration,
    pub pdf: Duration,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(5),
            submit: Duration::from_secs(60),
            poll: Duration::from_secs(5),
            pdf: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// API Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
    /// Free-form failure detail; any JSON shape is accepted
    #[serde(default)]
    error: Option<Value>,
}

impl JobStatusResponse {
    fn into_status(self) -> JobStatus {
        JobStatus::from_wire(&self.status, text_field(self.error.as_ref()))
    }
}

// =============================================================================
// Multipart Form
// =============================================================================

/// One multipart field, described before it is turned into a reqwest form
#[derive(Debug, Clone, PartialEq, Eq)]
enum FormField<'a> {
    Text {
        name: &'static str,
        value: &'static str,
    },
    File {
        name: &'static str,
        file_name: &'a str,
        content_type: &'static str,
        bytes: &'a [u8],
    },
}

/// Lists the multipart fields for a request, in send order.
fn form_fields(request: &AnalysisRequest) -> Vec<FormField<'_>> {
    let file_field = match request.media_kind() {
        MediaKind::Video => "video",
        MediaKind::ImageSequence => "images",
    };

    let mut fields: Vec<FormField<'_>> = request
        .payloads
        .iter()
        .map(|payload| FormField::File {
            name: file_field,
            file_name: &payload.file_name,
            content_type: content_type_for(&payload.file_name),
            bytes: &payload.bytes,
        })
        .collect();

    match request.params {
        MediaParams::Video { sampling_mode } => {
            fields.push(FormField::Text {
                name: "mode",
                value: request.mode.as_wire(),
            });
            fields.push(FormField::Text {
                name: "sampling_mode",
                value: sampling_mode.as_wire(),
            });
        }
        MediaParams::ImageSequence { sequence_type } => {
            fields.push(FormField::Text {
                name: "sequence_type",
                value: sequence_type.as_wire(),
            });
            fields.push(FormField::Text {
                name: "mode",
                value: request.mode.as_wire(),
            });
        }
    }

    fields
}

fn build_form(request: &AnalysisRequest) -> CoreResult<Form> {
    let mut form = Form::new();
    for field in form_fields(request) {
        form = match field {
            FormField::Text { name, value } => form.text(name, value),
            FormField::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let part = Part::bytes(bytes.to_vec())
                    .file_name(file_name.to_string())
                    .mime_str(content_type)
                    .map_err(|e| {
                        CoreError::Internal(format!("Invalid content type '{}': {}", content_type, e))
                    })?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

// =============================================================================
// HttpAnalysisService
// =============================================================================

/// Analysis service reached over HTTP
pub struct HttpAnalysisService {
    client: reqwest::Client,
    base_url: String,
    timeouts: ServiceTimeouts,
}

impl std::fmt::Debug for HttpAnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAnalysisService")
            .field("base_url", &self.base_url)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl HttpAnalysisService {
    /// Create a client for the service at `base_url` (http or https)
    pub fn new(base_url: &str) -> CoreResult<Self> {
        let base_url = validate_base_url(base_url).map_err(CoreError::ValidationError)?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeouts: ServiceTimeouts::default(),
        })
    }

    /// Override the per-call timeouts
    pub fn with_timeouts(mut self, timeouts: ServiceTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeouts(&self) -> ServiceTimeouts {
        self.timeouts
    }

    fn health_url(&self) -> String {
        format!("{}/api/health", self.base_url)
    }

    fn submit_url(&self, kind: MediaKind) -> String {
        match kind {
            MediaKind::Video => format!("{}/api/analyze/video", self.base_url),
            MediaKind::ImageSequence => format!("{}/api/analyze/images", self.base_url),
        }
    }

    /// `{base}/{segments...}/{job_id}` with the job id percent-encoded as a
    /// single path segment
    fn job_endpoint(&self, segments: &[&str], job_id: &str) -> CoreResult<String> {
        validate_job_id(job_id).map_err(CoreError::ValidationError)?;

        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| CoreError::Internal(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CoreError::Internal(format!("Base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments)
            .push(job_id);
        Ok(url.into())
    }

    fn job_url(&self, job_id: &str) -> CoreResult<String> {
        self.job_endpoint(&["api", "job"], job_id)
    }

    fn result_url(&self, job_id: &str) -> CoreResult<String> {
        self.job_endpoint(&["api", "result"], job_id)
    }

    fn pdf_url(&self, job_id: &str) -> CoreResult<String> {
        self.job_endpoint(&["api", "export", "pdf"], job_id)
    }

    /// Send a request with a timeout, returning the response only on 2xx.
    async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> CoreResult<Response> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(operation, timeout, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(service_error(operation, status, &body))
    }

    async fn read_text(operation: &str, timeout: Duration, response: Response) -> CoreResult<String> {
        response
            .text()
            .await
            .map_err(|e| map_reqwest_error(operation, timeout, e))
    }
}

/// Job handle from a 2xx submission body. The id is opaque; only an id that
/// cannot address a job is treated as malformed.
fn job_from_submit_body(body: &str, kind: MediaKind) -> CoreResult<JobHandle> {
    let parsed: SubmitResponse = decode(OP_UPLOAD, body)?;
    validate_job_id(&parsed.job_id)
        .map_err(|e| CoreError::MalformedResponse(format!("Upload returned {}", e)))?;
    Ok(JobHandle::new(parsed.job_id, kind))
}

fn map_reqwest_error(operation: &str, timeout: Duration, error: reqwest::Error) -> CoreError {
    if error.is_timeout() {
        CoreError::Timeout {
            operation: operation.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        CoreError::Transport(format!("{} request failed: {}", operation, error))
    }
}

fn service_error(operation: &str, status: StatusCode, body: &str) -> CoreError {
    let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    CoreError::Service {
        operation: operation.to_string(),
        status: status.as_u16(),
        body: truncated,
    }
}

fn decode<T: serde::de::DeserializeOwned>(operation: &str, body: &str) -> CoreResult<T> {
    serde_json::from_str(body).map_err(|e| {
        CoreError::MalformedResponse(format!("{} response could not be decoded: {}", operation, e))
    })
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    fn name(&self) -> &str {
        "http"
    }

    async fn health(&self) -> CoreResult<()> {
        let timeout = self.timeouts.health;
        self.send(OP_HEALTH, self.client.get(self.health_url()), timeout)
            .await?;
        Ok(())
    }

    async fn submit(&self, request: &AnalysisRequest) -> CoreResult<JobHandle> {
        request.validate().map_err(CoreError::ValidationError)?;

        let kind = request.media_kind();
        let form = build_form(request)?;
        let timeout = self.timeouts.submit;

        debug!(
            "Uploading {} ({} file(s), {} bytes) to {}",
            kind,
            request.payloads.len(),
            request.total_bytes(),
            self.base_url
        );

        let response = self
            .send(
                OP_UPLOAD,
                self.client.post(self.submit_url(kind)).multipart(form),
                timeout,
            )
            .await?;
        let body = Self::read_text(OP_UPLOAD, timeout, response).await?;
        let job = job_from_submit_body(&body, kind)?;

        info!("Analysis submitted: job_id={}", job.job_id);
        Ok(job)
    }

    async fn job_status(&self, job_id: &str) -> CoreResult<JobStatus> {
        let url = self.job_url(job_id)?;
        let timeout = self.timeouts.poll;

        let response = self.send(OP_STATUS, self.client.get(url), timeout).await?;
        let body = Self::read_text(OP_STATUS, timeout, response).await?;
        let parsed: JobStatusResponse = decode(OP_STATUS, &body)?;

        debug!("Job {} status={}", job_id, parsed.status);
        Ok(parsed.into_status())
    }

    async fn fetch_result(&self, job_id: &str) -> CoreResult<Value> {
        let url = self.result_url(job_id)?;
        let timeout = self.timeouts.poll;

        let response = self.send(OP_RESULT, self.client.get(url), timeout).await?;
        let body = Self::read_text(OP_RESULT, timeout, response).await?;
        decode(OP_RESULT, &body)
    }

    async fn fetch_pdf(&self, job_id: &str) -> CoreResult<Vec<u8>> {
        let url = self.pdf_url(job_id)?;
        let timeout = self.timeouts.pdf;

        let response = self.send(OP_PDF, self.client.get(url), timeout).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(OP_PDF, timeout, e))?;

        info!("Fetched PDF report for job {} ({} bytes)", job_id, bytes.len());
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::{AnalysisMode, MediaPayload, SamplingMode, SequenceType};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            content_type,
            body.len(),
            body
        )
    }

    /// Serves one canned response and reports the request line it received.
    async fn serve_once(response: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let text = String::from_utf8_lossy(&head);
            let request_line = text.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(request_line);
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{}", addr), rx)
    }

    fn video_request() -> AnalysisRequest {
        AnalysisRequest::video(
            MediaPayload::new("clip.mov", vec![1, 2, 3]),
            AnalysisMode::DeepScan,
            SamplingMode::Full,
        )
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = ServiceTimeouts::default();
        assert_eq!(timeouts.health, Duration::from_secs(5));
        assert_eq!(timeouts.submit, Duration::from_secs(60));
        assert_eq!(timeouts.poll, Duration::from_secs(5));
        assert_eq!(timeouts.pdf, Duration::from_secs(30));
    }

    #[test]
    fn test_urls() {
        let service = HttpAnalysisService::new("http://localhost:8000/").unwrap();
        assert_eq!(service.base_url(), "http://localhost:8000");
        assert_eq!(service.health_url(), "http://localhost:8000/api/health");
        assert_eq!(
            service.submit_url(MediaKind::Video),
            "http://localhost:8000/api/analyze/video"
        );
        assert_eq!(
            service.submit_url(MediaKind::ImageSequence),
            "http://localhost:8000/api/analyze/images"
        );
        assert_eq!(
            service.job_url("abc").unwrap(),
            "http://localhost:8000/api/job/abc"
        );
        assert_eq!(
            service.result_url("abc").unwrap(),
            "http://localhost:8000/api/result/abc"
        );
        assert_eq!(
            service.pdf_url("abc").unwrap(),
            "http://localhost:8000/api/export/pdf/abc"
        );
    }

    #[test]
    fn test_job_ids_are_encoded_as_one_segment() {
        let service = HttpAnalysisService::new("http://localhost:8000").unwrap();
        assert_eq!(
            service.job_url("urn:job:42").unwrap(),
            "http://localhost:8000/api/job/urn:job:42"
        );
        assert_eq!(
            service.result_url("a b?c#d").unwrap(),
            "http://localhost:8000/api/result/a%20b%3Fc%23d"
        );
        assert_eq!(
            service.pdf_url("../admin").unwrap(),
            "http://localhost:8000/api/export/pdf/..%2Fadmin"
        );
        assert_eq!(
            service.job_url("50%").unwrap(),
            "http://localhost:8000/api/job/50%25"
        );
    }

    #[test]
    fn test_base_url_path_prefix_is_kept() {
        let service = HttpAnalysisService::new("https://example.com/frames/").unwrap();
        assert_eq!(
            service.job_url("abc").unwrap(),
            "https://example.com/frames/api/job/abc"
        );
    }

    #[test]
    fn test_unaddressable_job_ids_are_rejected() {
        let service = HttpAnalysisService::new("http://localhost:8000").unwrap();
        assert!(matches!(
            service.job_url(".."),
            Err(CoreError::ValidationError(_))
        ));
        assert!(service.result_url("").is_err());
        assert!(service.pdf_url(" ").is_err());
    }

    #[test]
    fn test_submit_body_accepts_opaque_job_id() {
        let job = job_from_submit_body(r#"{"job_id": "urn:job:42"}"#, MediaKind::Video).unwrap();
        assert_eq!(job.job_id, "urn:job:42");
        assert_eq!(job.media_kind, MediaKind::Video);

        let job = job_from_submit_body(r#"{"job_id": "batch 7#2"}"#, MediaKind::ImageSequence)
            .unwrap();
        assert_eq!(job.job_id, "batch 7#2");

        assert!(matches!(
            job_from_submit_body(r#"{"job_id": ""}"#, MediaKind::Video),
            Err(CoreError::MalformedResponse(_))
        ));
        assert!(matches!(
            job_from_submit_body(r#"{"id": "x"}"#, MediaKind::Video),
            Err(CoreError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_status_error_of_any_shape_is_kept() {
        let parsed: JobStatusResponse =
            decode(OP_STATUS, r#"{"status": "failed", "error": {"code": 7, "reason": "codec"}}"#)
                .unwrap();
        assert_eq!(
            parsed.into_status(),
            JobStatus::Failed {
                error: r#"{"code":7,"reason":"codec"}"#.to_string()
            }
        );

        let parsed: JobStatusResponse =
            decode(OP_STATUS, r#"{"status": "failed", "error": 500}"#).unwrap();
        assert_eq!(
            parsed.into_status(),
            JobStatus::Failed {
                error: "500".to_string()
            }
        );

        let parsed: JobStatusResponse =
            decode(OP_STATUS, r#"{"status": "failed", "error": null}"#).unwrap();
        assert_eq!(
            parsed.into_status(),
            JobStatus::Failed {
                error: "Unknown error".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            HttpAnalysisService::new("ftp://example.com"),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_video_form_fields() {
        let request = video_request();
        let fields = form_fields(&request);
        assert_eq!(
            fields,
            vec![
                FormField::File {
                    name: "video",
                    file_name: "clip.mov",
                    content_type: "video/quicktime",
                    bytes: &[1, 2, 3],
                },
                FormField::Text {
                    name: "mode",
                    value: "deep_scan"
                },
                FormField::Text {
                    name: "sampling_mode",
                    value: "full"
                },
            ]
        );
        assert!(build_form(&request).is_ok());
    }

    #[test]
    fn test_image_form_fields_repeat_images() {
        let request = AnalysisRequest::images(
            vec![
                MediaPayload::new("a.png", vec![1]),
                MediaPayload::new("b.jpg", vec![2]),
            ],
            AnalysisMode::HighSensitivity,
            SequenceType::Unordered,
        );
        let fields = form_fields(&request);
        let names: Vec<&str> = fields
            .iter()
            .map(|f| match f {
                FormField::Text { name, .. } | FormField::File { name, .. } => *name,
            })
            .collect();
        assert_eq!(names, ["images", "images", "sequence_type", "mode"]);
        assert_eq!(
            fields[2],
            FormField::Text {
                name: "sequence_type",
                value: "unordered"
            }
        );
    }

    #[test]
    fn test_service_error_truncates_body() {
        let body = "x".repeat(2000);
        let err = service_error(OP_UPLOAD, StatusCode::PAYLOAD_TOO_LARGE, &body);
        match err {
            CoreError::Service {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, "Upload");
                assert_eq!(status, 413);
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_failures_are_malformed() {
        let err = decode::<SubmitResponse>(OP_UPLOAD, r#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse(_)));

        let ok: JobStatusResponse = decode(OP_STATUS, r#"{"status": "failed"}"#).unwrap();
        assert_eq!(ok.status, "failed");
        assert!(ok.error.is_none());
    }

    #[tokio::test]
    async fn test_submit_validates_before_network() {
        // Nothing listens here; validation must fail first.
        let service = HttpAnalysisService::new("http://127.0.0.1:9").unwrap();
        let request = AnalysisRequest::images(
            vec![MediaPayload::new("a.png", vec![1])],
            AnalysisMode::Standard,
            SequenceType::Ordered,
        );
        let err = service.submit(&request).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = HttpAnalysisService::new(&format!("http://{}", addr)).unwrap();
        let err = service.health().await.unwrap_err();
        assert!(err.is_transport(), "expected transport error, got {:?}", err);
    }

    #[tokio::test]
    async fn test_health_non_2xx_is_service_error() {
        let (base, _) = serve_once(http_response(
            "503 Service Unavailable",
            "text/plain",
            "warming up",
        ))
        .await;
        let service = HttpAnalysisService::new(&base).unwrap();

        let err = service.health().await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_job_status_decodes_failed_job() {
        let (base, request_line) = serve_once(http_response(
            "200 OK",
            "application/json",
            r#"{"status": "failed", "error": "corrupt container"}"#,
        ))
        .await;
        let service = HttpAnalysisService::new(&base).unwrap();

        let status = service.job_status("job-42").await.unwrap();
        assert_eq!(
            status,
            JobStatus::Failed {
                error: "corrupt container".to_string()
            }
        );
        assert_eq!(request_line.await.unwrap(), "GET /api/job/job-42 HTTP/1.1");
    }

    #[tokio::test]
    async fn test_job_status_for_opaque_id_with_structured_error() {
        let (base, request_line) = serve_once(http_response(
            "200 OK",
            "application/json",
            r#"{"status": "failed", "error": {"stage": "decode"}}"#,
        ))
        .await;
        let service = HttpAnalysisService::new(&base).unwrap();

        let status = service.job_status("urn:job 42").await.unwrap();
        assert_eq!(
            status,
            JobStatus::Failed {
                error: r#"{"stage":"decode"}"#.to_string()
            }
        );
        assert_eq!(
            request_line.await.unwrap(),
            "GET /api/job/urn:job%2042 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_job_status_without_status_is_malformed() {
        let (base, _) = serve_once(http_response("200 OK", "application/json", "{}")).await;
        let service = HttpAnalysisService::new(&base).unwrap();

        let err = service.job_status("job-42").await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_result_returns_raw_value() {
        let (base, request_line) = serve_once(http_response(
            "200 OK",
            "application/json",
            r#"{"media_info": {"fps": 30}, "findings": []}"#,
        ))
        .await;
        let service = HttpAnalysisService::new(&base).unwrap();

        let value = service.fetch_result("job-42").await.unwrap();
        assert_eq!(value["media_info"]["fps"], 30);
        assert_eq!(
            request_line.await.unwrap(),
            "GET /api/result/job-42 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_fetch_pdf_failure_is_pdf_generation_error() {
        let (base, _) = serve_once(http_response(
            "500 Internal Server Error",
            "text/plain",
            "renderer crashed",
        ))
        .await;
        let service = HttpAnalysisService::new(&base).unwrap();

        let err = service.fetch_pdf("job-42").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "PDF generation failed with status 500: renderer crashed"
        );
    }

    #[tokio::test]
    async fn test_fetch_pdf_returns_bytes() {
        let (base, _) =
            serve_once(http_response("200 OK", "application/pdf", "%PDF-1.4 fake")).await;
        let service = HttpAnalysisService::new(&base).unwrap();

        let bytes = service.fetch_pdf("job-42").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let service = HttpAnalysisService::new(&format!("http://{}", addr))
            .unwrap()
            .with_timeouts(ServiceTimeouts {
                health: Duration::from_millis(100),
                ..ServiceTimeouts::default()
            });

        let err = service.health().await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { .. }), "got {:?}", err);
    }
}
