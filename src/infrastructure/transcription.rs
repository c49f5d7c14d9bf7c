use crate::config::TranscriptionConfig;
use crate::services::transcription::{GeminiTranscriber, TranscriptionClient};
use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::info;

pub fn setup_transcriber(config: &TranscriptionConfig) -> Result<Arc<dyn TranscriptionClient>> {
    let Some(api_key) = config.api_key.clone() else {
        bail!("GEMINI_API_KEY must be set (secrets directory or environment)");
    };

    let transcriber = GeminiTranscriber::new(
        api_key,
        Some(config.base_url.clone()),
        Some(config.model.clone()),
    );

    info!(
        "📝 Transcription: model={}, timeout={}",
        transcriber.model(),
        config
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(Arc::new(transcriber))
}
