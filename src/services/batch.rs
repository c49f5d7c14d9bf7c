//! Batch ingest pipeline.
//!
//! Every submitted file runs through its own task:
//! validate → store original → transcribe (inside a worker slot) → store text.
//! A failure at any step becomes that file's outcome and never touches the
//! other files. The batch returns only once every task has finished.

use crate::config::AppConfig;
use crate::models::{BatchReport, FileDescriptor, FileStage, ProcessingOutcome, keys};
use crate::services::aggregator::ResultAggregator;
use crate::services::storage::{ObjectStore, StorageError};
use crate::services::transcription::{
    TRANSCRIPTION_INSTRUCTION, TranscriptionClient, TranscriptionError,
};
use crate::services::worker_pool::{WorkerPool, WorkerPoolError};
use crate::utils::validation::{ValidationError, Validator};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
enum PipelineError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("Failed to store original: {0}")]
    StoreOriginal(#[source] StorageError),

    #[error("Transcription failed: {0}")]
    Transcription(#[source] TranscriptionError),

    #[error("Transcription slot unavailable: {0}")]
    Pool(#[from] WorkerPoolError),

    #[error("Failed to store extracted text: {0}")]
    StoreText(#[source] StorageError),
}

impl PipelineError {
    /// Last stage the file completed before this error.
    fn stage(&self) -> FileStage {
        match self {
            PipelineError::Rejected(_) => FileStage::Received,
            PipelineError::StoreOriginal(_) => FileStage::Validated,
            PipelineError::Transcription(_) | PipelineError::Pool(_) => FileStage::OriginalStored,
            PipelineError::StoreText(_) => FileStage::Transcribed,
        }
    }
}

pub struct BatchOrchestrator {
    storage: Arc<dyn ObjectStore>,
    transcriber: Arc<dyn TranscriptionClient>,
    pool: WorkerPool,
    validator: Validator,
    transcription_timeout: Option<Duration>,
}

impl BatchOrchestrator {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        transcriber: Arc<dyn TranscriptionClient>,
        pool: WorkerPool,
        validator: Validator,
    ) -> Self {
        Self {
            storage,
            transcriber,
            pool,
            validator,
            transcription_timeout: None,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        storage: Arc<dyn ObjectStore>,
        transcriber: Arc<dyn TranscriptionClient>,
    ) -> Self {
        Self::new(
            storage,
            transcriber,
            WorkerPool::new(config.max_concurrency),
            Validator::new(config.max_file_size),
        )
        .with_transcription_timeout(config.transcription.timeout)
    }

    pub fn with_transcription_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.transcription_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Processes every descriptor and reports one outcome per file, in
    /// submission order.
    pub async fn run(&self, descriptors: Vec<FileDescriptor>) -> BatchReport {
        let total = descriptors.len();
        info!(
            "📦 Processing batch of {} file(s) with {} transcription slot(s)",
            total,
            self.pool.capacity()
        );

        let mut handles = Vec::with_capacity(total);
        for descriptor in descriptors {
            let filename = descriptor.name.clone();
            let pipeline = FilePipeline {
                storage: self.storage.clone(),
                transcriber: self.transcriber.clone(),
                pool: self.pool.clone(),
                validator: self.validator.clone(),
                timeout: self.transcription_timeout,
            };
            handles.push((filename, tokio::spawn(pipeline.process(descriptor))));
        }

        let mut aggregator = ResultAggregator::with_capacity(total);
        for (filename, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("[{}] ❌ Pipeline task aborted: {}", filename, e);
                    ProcessingOutcome::processing_error(filename, "Internal error while processing file")
                }
            };
            aggregator.record(outcome);
        }

        let report = aggregator.finish();
        info!(
            "✅ Batch complete: {} processed, {} failed (of {})",
            report.processed, report.failed, total
        );
        report
    }
}

/// Everything one file's task needs, owned so the task can be spawned.
struct FilePipeline {
    storage: Arc<dyn ObjectStore>,
    transcriber: Arc<dyn TranscriptionClient>,
    pool: WorkerPool,
    validator: Validator,
    timeout: Option<Duration>,
}

impl FilePipeline {
    async fn process(self, descriptor: FileDescriptor) -> ProcessingOutcome {
        let (outcome, reached) = match self.execute(&descriptor).await {
            Ok(()) => (
                ProcessingOutcome::success(descriptor.name),
                FileStage::TextStored,
            ),
            Err(PipelineError::Rejected(e)) => (
                ProcessingOutcome::validation_error(descriptor.name, e.to_string()),
                FileStage::Received,
            ),
            Err(e) => {
                let reached = e.stage();
                (
                    ProcessingOutcome::processing_error(descriptor.name, e.to_string()),
                    reached,
                )
            }
        };

        let terminal = FileStage::from(outcome.status);
        match terminal {
            FileStage::Succeeded => info!(
                stage = %reached,
                state = %terminal,
                "[{}] ✅ Stored extracted text",
                outcome.filename
            ),
            _ => warn!(
                stage = %reached,
                state = %terminal,
                "[{}] ❌ {}",
                outcome.filename,
                outcome.message.as_deref().unwrap_or_default()
            ),
        }
        outcome
    }

    async fn execute(&self, descriptor: &FileDescriptor) -> Result<(), PipelineError> {
        self.validator.validate(descriptor)?;

        self.storage
            .put(&keys::upload_key(&descriptor.name), descriptor.bytes.clone())
            .await
            .map_err(PipelineError::StoreOriginal)?;

        let text = self
            .pool
            .run(self.transcribe(descriptor))
            .await?
            .map_err(PipelineError::Transcription)?;

        self.storage
            .put(&keys::text_key(&descriptor.name), Bytes::from(text))
            .await
            .map_err(PipelineError::StoreText)?;

        Ok(())
    }

    async fn transcribe(&self, descriptor: &FileDescriptor) -> Result<String, TranscriptionError> {
        let call = self.transcriber.transcribe(
            &descriptor.name,
            &descriptor.bytes,
            TRANSCRIPTION_INSTRUCTION,
        );

        let text = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| TranscriptionError::Timeout(limit))??,
            None => call.await?,
        };

        if text.trim().is_empty() {
            return Err(TranscriptionError::EmptyResponse);
        }
        Ok(text)
    }
}
