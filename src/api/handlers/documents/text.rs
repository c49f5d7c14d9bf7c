use crate::AppState;
use crate::api::error::AppError;
use crate::utils::validation::sanitize_filename;
use axum::{
    Json,
    extract::{Path, State},
};

use super::types::TextResponse;

#[utoipa::path(
    get,
    path = "/text/{filename}",
    params(
        ("filename" = String, Path, description = "Name of the originally uploaded document")
    ),
    responses(
        (status = 200, description = "Extracted text", body = TextResponse),
        (status = 404, description = "No extracted text for this file"),
        (status = 500, description = "Storage failure")
    ),
    tag = "documents"
)]
pub async fn get_text(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<TextResponse>, AppError> {
    let filename = sanitize_filename(&filename);
    let text = state.retrieval.get_text(&filename).await?;
    Ok(Json(TextResponse { text }))
}
