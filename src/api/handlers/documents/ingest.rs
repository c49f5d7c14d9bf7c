use crate::AppState;
use crate::api::error::AppError;
use crate::models::FileDescriptor;
use crate::utils::validation::sanitize_filename;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};

use super::types::*;

fn map_multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Documents to transcribe"),
    responses(
        (status = 200, description = "Batch processed; per-file results enclosed", body = IngestResponse),
        (status = 400, description = "Malformed request or no files provided"),
        (status = 413, description = "Request body too large")
    ),
    tag = "documents"
)]
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, AppError> {
    let max_files = state.config.max_files_per_request;

    let result: Result<Vec<FileDescriptor>, AppError> = async {
        let mut descriptors = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
            let field_name = field.name().unwrap_or_default().to_string();
            let original_filename = match field.file_name() {
                Some(name) => name.to_string(),
                None if field_name == "files" || field_name == "file" => String::new(),
                None => continue,
            };

            if descriptors.len() >= max_files {
                return Err(AppError::BadRequest(format!(
                    "At most {} files may be submitted per request",
                    max_files
                )));
            }

            let filename = sanitize_filename(&original_filename);
            let bytes = field.bytes().await.map_err(map_multipart_error)?;
            tracing::debug!("Received {} ({} bytes)", filename, bytes.len());
            descriptors.push(FileDescriptor::new(filename, bytes));
        }

        Ok(descriptors)
    }
    .await;

    let descriptors = match result {
        Ok(descriptors) => descriptors,
        Err(e) => {
            // Drain the rest of the body so the client sees the error instead of a reset
            tracing::warn!("Ingest request rejected: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            return Err(e);
        }
    };

    if descriptors.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }

    let report = state.orchestrator.run(descriptors).await;
    Ok(Json(IngestResponse::from(report)))
}
