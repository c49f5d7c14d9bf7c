use crate::utils::validation::content_type_for;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Instruction sent with every document.
pub const TRANSCRIPTION_INSTRUCTION: &str = "Extract all of the text from this document exactly as it appears. \
Preserve the reading order, headings, lists and table contents. \
Return only the extracted text, without commentary or formatting markers.";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Upper bound on polls while an uploaded file is still being processed.
const MAX_STATE_POLLS: u32 = 30;
const STATE_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("failed to stage document locally: {0}")]
    Staging(#[from] std::io::Error),

    #[error("document upload failed: {0}")]
    Upload(String),

    #[error("content generation failed: {0}")]
    Generation(String),

    #[error("transcription returned no text")]
    EmptyResponse,

    #[error("transcription timed out after {0:?}")]
    Timeout(Duration),
}

/// Turns raw document bytes into text. One document per call.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    async fn transcribe(
        &self,
        filename: &str,
        document: &[u8],
        instruction: &str,
    ) -> Result<String, TranscriptionError>;
}

/// Client for the Gemini `generateContent` API.
///
/// Each call uploads the document through the resumable Files API, asks the
/// model for the text, then deletes the uploaded file.
pub struct GeminiTranscriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    name: String,
    uri: String,
    mime_type: Option<String>,
    state: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: RemoteFile,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    File {
        #[serde(rename = "fileData")]
        file_data: FileData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiTranscriber {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Writes the document to a temporary file. The file is removed when the
    /// returned guard is dropped.
    async fn stage(&self, document: &[u8]) -> Result<NamedTempFile, TranscriptionError> {
        let staged = NamedTempFile::new()?;
        let mut file = tokio::fs::File::from_std(staged.reopen()?);
        file.write_all(document).await?;
        file.flush().await?;
        Ok(staged)
    }

    async fn upload(
        &self,
        filename: &str,
        staged: &NamedTempFile,
        size: usize,
        mime_type: &str,
    ) -> Result<RemoteFile, TranscriptionError> {
        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": filename } }))
            .send()
            .await
            .map_err(|e| TranscriptionError::Upload(format!("start request: {}", e)))?;

        let start = ensure_success(start)
            .await
            .map_err(TranscriptionError::Upload)?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| TranscriptionError::Upload("no upload URL returned".to_string()))?;

        let reader = tokio::fs::File::open(staged.path()).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(reader));

        let response = self
            .client
            .post(&upload_url)
            .header("Content-Length", size.to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(body)
            .send()
            .await
            .map_err(|e| TranscriptionError::Upload(format!("upload request: {}", e)))?;

        let response = ensure_success(response)
            .await
            .map_err(TranscriptionError::Upload)?;

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Upload(format!("invalid upload response: {}", e)))?;

        tracing::debug!(file = %uploaded.file.name, "Document uploaded to transcription service");

        Ok(uploaded.file)
    }

    async fn wait_until_active(&self, mut file: RemoteFile) -> Result<RemoteFile, TranscriptionError> {
        let mut polls = 0;
        while file.state.as_deref() == Some("PROCESSING") {
            if polls >= MAX_STATE_POLLS {
                return Err(TranscriptionError::Upload(format!(
                    "file {} still processing after {} checks",
                    file.name, MAX_STATE_POLLS
                )));
            }
            tokio::time::sleep(STATE_POLL_INTERVAL).await;
            polls += 1;

            let response = self
                .client
                .get(format!("{}/v1beta/{}", self.base_url, file.name))
                .header("x-goog-api-key", &self.api_key)
                .send()
                .await
                .map_err(|e| TranscriptionError::Upload(format!("state request: {}", e)))?;

            file = ensure_success(response)
                .await
                .map_err(TranscriptionError::Upload)?
                .json()
                .await
                .map_err(|e| TranscriptionError::Upload(format!("invalid file state: {}", e)))?;
        }

        if file.state.as_deref() == Some("FAILED") {
            return Err(TranscriptionError::Upload(format!(
                "service rejected file {}",
                file.name
            )));
        }

        Ok(file)
    }

    async fn generate(
        &self,
        file: &RemoteFile,
        mime_type: &str,
        instruction: &str,
    ) -> Result<String, TranscriptionError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    RequestPart::File {
                        file_data: FileData {
                            mime_type: file.mime_type.as_deref().unwrap_or(mime_type),
                            file_uri: &file.uri,
                        },
                    },
                    RequestPart::Text { text: instruction },
                ],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranscriptionError::Generation(format!("request: {}", e)))?;

        let response = ensure_success(response)
            .await
            .map_err(TranscriptionError::Generation)?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Generation(format!("invalid response: {}", e)))?;

        let text: String = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(TranscriptionError::EmptyResponse);
        }

        Ok(text)
    }

    async fn delete(&self, file: &RemoteFile) {
        let res = self
            .client
            .delete(format!("{}/v1beta/{}", self.base_url, file.name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await;

        match res {
            Ok(r) if r.status().is_success() => {
                tracing::debug!(file = %file.name, "Remote file deleted");
            }
            Ok(r) => {
                tracing::warn!(file = %file.name, status = %r.status(), "Failed to delete remote file");
            }
            Err(e) => {
                tracing::warn!(file = %file.name, "Failed to delete remote file: {}", e);
            }
        }
    }
}

#[async_trait]
impl TranscriptionClient for GeminiTranscriber {
    async fn transcribe(
        &self,
        filename: &str,
        document: &[u8],
        instruction: &str,
    ) -> Result<String, TranscriptionError> {
        let mime_type = content_type_for(filename).to_string();
        let staged = self.stage(document).await?;

        tracing::debug!(
            filename,
            model = %self.model,
            bytes = document.len(),
            "Sending document to transcription service"
        );

        let remote = self
            .upload(filename, &staged, document.len(), &mime_type)
            .await?;

        // Once uploaded, the remote file is deleted whatever happens next
        let result = match self.wait_until_active(remote.clone()).await {
            Ok(active) => self.generate(&active, &mime_type, instruction).await,
            Err(e) => Err(e),
        };
        self.delete(&remote).await;

        if let Ok(text) = &result {
            tracing::info!(filename, chars = text.len(), "Transcription completed");
        }
        result
    }
}

/// Maps a non-2xx response into an error message carrying the status and body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, String> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(format!("status {}: {}", status, body))
}
