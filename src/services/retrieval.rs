use crate::models::keys;
use crate::services::storage::{ObjectStore, StorageError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("No extracted text found for '{0}'")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),
}

/// Reads previously extracted text back out of the object store.
pub struct TextRetrieval {
    storage: Arc<dyn ObjectStore>,
}

impl TextRetrieval {
    pub fn new(storage: Arc<dyn ObjectStore>) -> Self {
        Self { storage }
    }

    pub async fn get_text(&self, filename: &str) -> Result<String, RetrievalError> {
        let key = keys::text_key(filename);

        let data = self.storage.get(&key).await.map_err(|e| match e {
            StorageError::NotFound(_) => RetrievalError::NotFound(filename.to_string()),
            other => RetrievalError::Storage(other),
        })?;

        String::from_utf8(data).map_err(|_| {
            RetrievalError::Storage(StorageError::Backend(format!(
                "object {} is not valid UTF-8",
                key
            )))
        })
    }
}
