use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

/// A place configuration values can be looked up by name.
pub trait SecretSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads one file per key from a mounted secrets directory
/// (e.g. `/run/secrets/GEMINI_API_KEY`). Lower-case file names are also tried.
pub struct FileSecretSource {
    dir: PathBuf,
}

impl FileSecretSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SecretSource for FileSecretSource {
    fn name(&self) -> &'static str {
        "secrets-dir"
    }

    fn get(&self, key: &str) -> Option<String> {
        [key.to_string(), key.to_lowercase()]
            .iter()
            .find_map(|file| {
                std::fs::read_to_string(self.dir.join(file))
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
    }
}

/// Process environment.
pub struct EnvSource;

impl SecretSource for EnvSource {
    fn name(&self) -> &'static str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed key/value pairs, mostly useful for tests and embedding.
#[derive(Default)]
pub struct StaticSource {
    values: HashMap<String, String>,
}

impl StaticSource {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SecretSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Ordered lookup: the first source that has a value wins.
#[derive(Default)]
pub struct SecretChain {
    sources: Vec<Box<dyn SecretSource>>,
}

impl SecretChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: impl SecretSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Mounted secrets directory first (`SECRETS_DIR`, default `/run/secrets`),
    /// then the environment.
    pub fn standard() -> Self {
        let dir = env::var("SECRETS_DIR").unwrap_or_else(|_| DEFAULT_SECRETS_DIR.to_string());
        Self::new().with(FileSecretSource::new(dir)).with(EnvSource)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            source.get(key).inspect(|_| {
                tracing::debug!(key, source = source.name(), "Configuration value resolved");
            })
        })
    }

    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring unparseable value for {}", key);
                None
            }
        }
    }
}
