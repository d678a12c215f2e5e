//! Application settings and configuration
//!
//! Settings are read from environment variables, falling back to a local
//! `.env` file and then to built-in defaults. Variable names are matched
//! case-insensitively, so `API_PORT` and `api_port` set the same field.

use crate::error::ConfigError;
use config::{Config, Environment};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::env;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

/// Default override file, resolved against the working directory
pub const ENV_FILE: &str = ".env";

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Main application settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    // LLM provider: openai, gemini or claude
    pub llm_provider: String,
    pub llm_model: String,
    #[serde(deserialize_with = "parse_number")]
    pub llm_temperature: f64,

    // Embedding provider: openai or gemini
    pub embedding_provider: String,
    pub embedding_model: String,

    // API keys, only the selected providers' keys are needed
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub google_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,

    // API server
    pub api_host: String,
    #[serde(deserialize_with = "parse_number")]
    pub api_port: u16,
    /// Unsigned: a negative worker count is rejected at load
    #[serde(deserialize_with = "parse_number")]
    pub api_workers: usize,

    // ChromaDB
    pub chromadb_path: String,
    pub chromadb_collection: String,

    // Retrieval
    #[serde(deserialize_with = "parse_number")]
    pub rag_top_k: usize,
    #[serde(deserialize_with = "parse_number")]
    pub rag_score_threshold: f64,

    // Application limits
    #[serde(deserialize_with = "parse_number")]
    pub max_query_length: usize,
    #[serde(deserialize_with = "parse_number")]
    pub rate_limit_per_minute: u32,
    #[serde(deserialize_with = "parse_number")]
    pub session_timeout_hours: u64,

    // Logging
    pub log_level: String,
    pub log_file: String,

    /// Comma-separated list of CORS origins
    pub allowed_origins: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_provider: "gemini".to_string(),
            llm_model: "gemini-2.0-flash".to_string(),
            llm_temperature: 0.0,
            embedding_provider: "gemini".to_string(),
            embedding_model: "models/text-embedding-004".to_string(),
            openai_api_key: None,
            google_api_key: None,
            anthropic_api_key: None,
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            api_workers: 4,
            chromadb_path: "./knowledge_base".to_string(),
            chromadb_collection: "knowledge_base".to_string(),
            rag_top_k: 3,
            rag_score_threshold: 0.2,
            max_query_length: 500,
            rate_limit_per_minute: 10,
            session_timeout_hours: 24,
            log_level: "INFO".to_string(),
            log_file: "agent.log".to_string(),
            allowed_origins: "http://localhost:8000,http://localhost:3000".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment and `./.env`
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env_file(ENV_FILE)
    }

    /// Load settings from the process environment and the given override file
    ///
    /// A missing override file is not an error.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let vars = env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        });
        Self::from_sources(vars, Some(path.as_ref()))
    }

    /// Build settings from explicit variables plus an optional override file
    ///
    /// Entries in `vars` take precedence over entries in `env_file`; both
    /// take precedence over the defaults.
    pub fn from_sources<I, K, V>(vars: I, env_file: Option<&Path>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut merged = match env_file {
            Some(path) => read_env_file(path)?,
            None => config::Map::new(),
        };
        for (key, value) in vars {
            merged.insert(key.as_ref().to_lowercase(), value.into());
        }

        let settings: Settings = Config::builder()
            .add_source(Environment::default().source(Some(merged)))
            .build()?
            .try_deserialize()?;

        tracing::debug!(
            llm_provider = %settings.llm_provider,
            llm_model = %settings.llm_model,
            embedding_provider = %settings.embedding_provider,
            embedding_model = %settings.embedding_model,
            api_addr = %settings.server_addr(),
            "Settings loaded"
        );

        Ok(settings)
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Allowed CORS origins, trimmed, with empty entries dropped
    pub fn allowed_origins_list(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_hours * 3600)
    }
}

/// Process-wide settings, loaded on first access
///
/// Later calls return the same instance without touching the environment
/// again. Prefer passing a `&Settings` explicitly where one is at hand.
pub fn get_settings() -> Result<&'static Settings, ConfigError> {
    if let Some(settings) = SETTINGS.get() {
        return Ok(settings);
    }
    let settings = Settings::load()?;
    Ok(SETTINGS.get_or_init(|| settings))
}

/// Strict numeric parsing for settings values
///
/// Surrounding whitespace is ignored. Anything `str::parse` rejects fails the
/// load, including words such as `yes` or `off` that the `config` crate would
/// otherwise coerce to 1 and 0.
fn parse_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .parse()
        .map_err(|e| de::Error::custom(format!("invalid number {:?}: {}", raw, e)))
}

/// Read `KEY=value` pairs from an override file, keys lower-cased
fn read_env_file(path: &Path) -> Result<config::Map<String, String>, ConfigError> {
    let mut entries = config::Map::new();

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => {
            tracing::debug!(path = %path.display(), "No env file found");
            return Ok(entries);
        }
        Err(source) => {
            return Err(ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    for item in iter {
        let (key, value) = item.map_err(|source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;
        entries.insert(key.to_lowercase(), value);
    }

    tracing::debug!(path = %path.display(), count = entries.len(), "Read env file");
    Ok(entries)
}
