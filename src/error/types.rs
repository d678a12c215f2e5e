//! Configuration and provider error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading settings or selecting a provider
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Invalid settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Unsupported {kind} provider: '{value}'. Valid options: {valid}")]
    UnsupportedProvider {
        kind: &'static str,
        value: String,
        valid: &'static str,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors raised when a constructed client talks to its provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error: {status} - {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_provider_message() {
        let err = ConfigError::UnsupportedProvider {
            kind: "LLM",
            value: "mistral".to_string(),
            valid: "openai, gemini, claude",
        };
        assert_eq!(
            err.to_string(),
            "Unsupported LLM provider: 'mistral'. Valid options: openai, gemini, claude"
        );
    }

    #[test]
    fn test_missing_key_message() {
        let err = ProviderError::MissingApiKey("OPENAI_API_KEY");
        assert_eq!(err.to_string(), "Missing API key: set OPENAI_API_KEY");
    }
}
