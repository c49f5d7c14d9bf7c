pub mod secrets;

use crate::services::transcription::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::services::worker_pool::{clamp_capacity, default_capacity};
use crate::utils::validation::MAX_FILE_SIZE;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use secrets::{EnvSource, FileSecretSource, SecretChain, SecretSource, StaticSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" | "minio" => Ok(StorageBackend::S3),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::S3 => f.write_str("s3"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Object store settings
#[derive(Clone)]
pub struct StorageConfig {
    /// Backend type: "s3" or "memory" (default: "s3")
    pub backend: StorageBackend,

    /// Custom S3 endpoint (MinIO etc.); AWS resolution when unset
    pub endpoint: Option<String>,

    /// Bucket holding both namespaces (default: "documents")
    pub bucket: String,

    /// Region (default: "us-east-1")
    pub region: String,

    /// Static credentials; the AWS provider chain is used when unset
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            endpoint: None,
            bucket: "documents".to_string(),
            region: "us-east-1".to_string(),
            access_key: None,
            secret_key: None,
        }
    }
}

/// Transcription service settings
#[derive(Clone)]
pub struct TranscriptionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,

    /// Per-call limit; `None` waits indefinitely (default: 300 s)
    pub timeout: Option<Duration>,
}

impl fmt::Debug for TranscriptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,

    /// Concurrent transcription calls, clamped to 1..=10
    /// (default: available parallelism)
    pub max_concurrency: usize,

    /// Maximum size of a single document in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Maximum number of files in one ingest request (default: 20)
    pub max_files_per_request: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            transcription: TranscriptionConfig::default(),
            max_concurrency: default_capacity(),
            max_file_size: MAX_FILE_SIZE,
            max_files_per_request: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from the mounted secrets directory and environment
    pub fn from_env() -> Self {
        Self::load(&SecretChain::standard())
    }

    pub fn load(chain: &SecretChain) -> Self {
        let default = Self::default();

        let storage = StorageConfig {
            backend: chain
                .parse("STORAGE_BACKEND")
                .unwrap_or(default.storage.backend),
            endpoint: chain.get("S3_ENDPOINT"),
            bucket: chain.get("S3_BUCKET").unwrap_or(default.storage.bucket),
            region: chain.get("S3_REGION").unwrap_or(default.storage.region),
            access_key: chain.get("S3_ACCESS_KEY"),
            secret_key: chain.get("S3_SECRET_KEY"),
        };

        let transcription = TranscriptionConfig {
            api_key: chain.get("GEMINI_API_KEY"),
            base_url: chain
                .get("GEMINI_BASE_URL")
                .unwrap_or(default.transcription.base_url),
            model: chain
                .get("GEMINI_MODEL")
                .unwrap_or(default.transcription.model),
            timeout: match chain.parse::<u64>("TRANSCRIPTION_TIMEOUT_SECS") {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => default.transcription.timeout,
            },
        };

        Self {
            storage,
            transcription,
            max_concurrency: chain
                .parse("MAX_CONCURRENCY")
                .map(clamp_capacity)
                .unwrap_or(default.max_concurrency),
            max_file_size: chain
                .parse("MAX_FILE_SIZE")
                .unwrap_or(default.max_file_size),
            max_files_per_request: chain
                .parse::<usize>("MAX_FILES_PER_REQUEST")
                .map(|n| n.max(1))
                .unwrap_or(default.max_files_per_request),
        }
    }

    /// Create config for development (in-memory storage)
    pub fn development() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    /// Request body ceiling for an ingest call, with 10 MB of multipart overhead.
    pub fn max_request_size(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_files_per_request)
            .saturating_add(10 * 1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.bucket, "documents");
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.max_files_per_request, 20);
        assert_eq!(config.transcription.timeout, Some(Duration::from_secs(300)));
        assert!((1..=10).contains(&config.max_concurrency));
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_load_from_chain() {
        let chain = SecretChain::new().with(StaticSource::new([
            ("STORAGE_BACKEND", "memory"),
            ("S3_BUCKET", "scans"),
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-test"),
            ("TRANSCRIPTION_TIMEOUT_SECS", "0"),
            ("MAX_CONCURRENCY", "64"),
            ("MAX_FILE_SIZE", "1024"),
        ]));

        let config = AppConfig::load(&chain);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.bucket, "scans");
        assert_eq!(config.transcription.api_key.as_deref(), Some("k"));
        assert_eq!(config.transcription.model, "gemini-test");
        assert_eq!(config.transcription.timeout, None);
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.max_file_size, 1024);
    }

    #[test]
    fn test_unknown_backend_falls_back_to_default() {
        let chain = SecretChain::new().with(StaticSource::new([("STORAGE_BACKEND", "ftp")]));
        assert_eq!(AppConfig::load(&chain).storage.backend, StorageBackend::S3);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.transcription.api_key = Some("super-secret".to_string());
        config.storage.secret_key = Some("also-secret".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("also-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
