use crate::models::{BatchReport, OutcomeStatus, ProcessingOutcome};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Validation,
    Processing,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResult {
    pub filename: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    /// 200 on success, 422 for rejected files, 502 for upstream failures
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<ProcessingOutcome> for FileResult {
    fn from(outcome: ProcessingOutcome) -> Self {
        let (status, error_type, status_code) = match outcome.status {
            OutcomeStatus::Success => (ResultStatus::Success, None, StatusCode::OK),
            OutcomeStatus::ValidationError => (
                ResultStatus::Error,
                Some(ErrorType::Validation),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            OutcomeStatus::ProcessingError => (
                ResultStatus::Error,
                Some(ErrorType::Processing),
                StatusCode::BAD_GATEWAY,
            ),
        };

        Self {
            filename: outcome.filename,
            status,
            error_type,
            status_code: status_code.as_u16(),
            message: outcome.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub processed: usize,
    pub failed: usize,
    pub results: Vec<FileResult>,
}

impl From<BatchReport> for IngestResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            processed: report.processed,
            failed: report.failed,
            results: report.results.into_iter().map(FileResult::from).collect(),
        }
    }
}

/// Multipart form accepted by `POST /upload` (documentation only).
#[derive(ToSchema)]
pub struct UploadForm {
    /// One part per document
    #[schema(value_type = Vec<String>)]
    pub files: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TextResponse {
    pub text: String,
}
