use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MemlogConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub vector_index: VectorIndexConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    /// File the settings were read from; `None` when defaults were used.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

/// Where log vectors live. `sqlite` keeps them next to the waitlist in the
/// local database; `qdrant` talks to a Qdrant server over REST.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VectorIndexConfig {
    pub backend: String,
    pub collection: String,
    pub url: String,
    pub api_key: Option<String>,
    /// Request timeout for the Qdrant client. 0 disables it.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
    /// Request timeout for generation calls. 0 disables it.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub chat_top_k: usize,
    pub default_search_limit: usize,
    pub max_search_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_memlog_dir()
            .join("memlog.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_memlog_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".into(),
            collection: "incaseyouforget_logs".into(),
            url: "http://localhost:6333".into(),
            api_key: None,
            timeout_secs: 0,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "gemini-2.0-flash".into(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key: None,
            timeout_secs: 0,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chat_top_k: 5,
            default_search_limit: 5,
            max_search_limit: 100,
        }
    }
}

/// Returns `~/.memlog/`, or `./.memlog/` when no home directory is known.
pub fn default_memlog_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memlog")
}

/// Returns the default config file path: `~/.memlog/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memlog_dir().join("config.toml")
}

impl MemlogConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            let mut config: MemlogConfig =
                toml::from_str(&contents).context("failed to parse config TOML")?;
            config.loaded_from = Some(path.to_path_buf());
            config
        } else {
            MemlogConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides. The Qdrant and Gemini variables keep
    /// the names the browser-extension backend has always used.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("MEMLOG_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("MEMLOG_PORT") {
            self.server.port = val
                .parse()
                .with_context(|| format!("MEMLOG_PORT is not a valid port: {val}"))?;
        }
        if let Ok(val) = std::env::var("MEMLOG_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MEMLOG_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEMLOG_VECTOR_BACKEND") {
            self.vector_index.backend = val;
        }
        if let Ok(val) = std::env::var("QDRANT_URL") {
            self.vector_index.url = val;
        }
        if let Ok(val) = std::env::var("QDRANT_API_KEY") {
            self.vector_index.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("MEMLOG_LLM_MODEL") {
            self.llm.model = val;
        }
        if let Ok(val) = std::env::var("GEMINI_API_KEY") {
            self.llm.api_key = Some(val);
        }
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// `host:port` string the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
