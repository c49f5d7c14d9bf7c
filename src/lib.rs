pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::batch::BatchOrchestrator;
use crate::services::retrieval::TextRetrieval;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::documents::ingest::upload_documents,
        api::handlers::documents::text::get_text,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::documents::UploadForm,
            api::handlers::documents::IngestResponse,
            api::handlers::documents::FileResult,
            api::handlers::documents::ResultStatus,
            api::handlers::documents::ErrorType,
            api::handlers::documents::TextResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "documents", description = "Batch ingest and text retrieval"),
        (name = "system", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
    pub retrieval: Arc<TextRetrieval>,
    pub config: Arc<AppConfig>,
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_request_size();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::documents::upload_documents)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/text/:filename", get(api::handlers::documents::get_text))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
