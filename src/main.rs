use clap::Parser;
use doc_transcribe::config::AppConfig;
use doc_transcribe::infrastructure::{storage, transcription};
use doc_transcribe::services::batch::BatchOrchestrator;
use doc_transcribe::services::retrieval::TextRetrieval;
use doc_transcribe::services::worker_pool::clamp_capacity;
use doc_transcribe::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Override the number of concurrent transcription calls (1-10)
    #[arg(short, long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_transcribe=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting document transcription service...");

    let mut config = AppConfig::from_env();
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = clamp_capacity(concurrency);
    }
    info!(
        "🛡️  Limits: Max Size={}MB, Max Files={}, Concurrency={}",
        config.max_file_size / 1024 / 1024,
        config.max_files_per_request,
        config.max_concurrency
    );

    // 2. External collaborators
    let storage_service = storage::setup_storage(&config.storage).await;
    if !storage_service.health_check().await {
        warn!("⚠️  Object store is not reachable yet; writes will fail until it is");
    }
    let transcriber = transcription::setup_transcriber(&config.transcription)?;

    // 3. Application state
    let orchestrator = Arc::new(BatchOrchestrator::from_config(
        &config,
        storage_service.clone(),
        transcriber,
    ));
    let retrieval = Arc::new(TextRetrieval::new(storage_service));

    let state = AppState {
        orchestrator,
        retrieval,
        config: Arc::new(config),
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            // request_id is filled in by the request id middleware
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    // 4. Serve
    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://0.0.0.0:{}", args.port);
    info!("📖 Swagger UI documentation: http://localhost:{}/swagger-ui", args.port);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Server runtime error: {}", e);
        return Err(e.into());
    }

    info!("👋 Service exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
