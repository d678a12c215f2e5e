//! Provider selection
//!
//! Decodes the provider strings from [`Settings`](crate::config::Settings)
//! into closed enums and builds the matching clients.

pub mod factory;

pub use factory::{get_embeddings, get_llm};

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Hosted LLM API a chat client targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
    Claude,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 3] = [LlmProvider::OpenAi, LlmProvider::Gemini, LlmProvider::Claude];
    pub const VALID_OPTIONS: &'static str = "openai, gemini, claude";

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Gemini => "gemini",
            LlmProvider::Claude => "claude",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let provider = s.to_lowercase();
        match provider.as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "gemini" => Ok(LlmProvider::Gemini),
            "claude" => Ok(LlmProvider::Claude),
            _ => Err(ConfigError::UnsupportedProvider {
                kind: "LLM",
                value: provider,
                valid: Self::VALID_OPTIONS,
            }),
        }
    }
}

/// Hosted embedding API an embedding client targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddingProvider {
    OpenAi,
    Gemini,
}

impl EmbeddingProvider {
    pub const ALL: [EmbeddingProvider; 2] = [EmbeddingProvider::OpenAi, EmbeddingProvider::Gemini];
    pub const VALID_OPTIONS: &'static str = "openai, gemini";

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingProvider::OpenAi => "openai",
            EmbeddingProvider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let provider = s.to_lowercase();
        match provider.as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAi),
            "gemini" => Ok(EmbeddingProvider::Gemini),
            _ => Err(ConfigError::UnsupportedProvider {
                kind: "embedding",
                value: provider,
                valid: Self::VALID_OPTIONS,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_provider_parsing() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!("CLAUDE".parse::<LlmProvider>().unwrap(), LlmProvider::Claude);
    }

    #[test]
    fn test_llm_provider_round_trips_through_display() {
        for provider in LlmProvider::ALL {
            assert_eq!(provider.to_string().parse::<LlmProvider>().unwrap(), provider);
            assert!(LlmProvider::VALID_OPTIONS.contains(provider.as_str()));
        }
    }

    #[test]
    fn test_llm_provider_rejects_unknown() {
        let err = "Mistral".parse::<LlmProvider>().unwrap_err();
        match err {
            ConfigError::UnsupportedProvider { kind, value, valid } => {
                assert_eq!(kind, "LLM");
                assert_eq!(value, "mistral");
                assert_eq!(valid, "openai, gemini, claude");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_embedding_provider_parsing() {
        assert_eq!("OpenAI".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::OpenAi);
        assert_eq!("gemini".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Gemini);
        for provider in EmbeddingProvider::ALL {
            assert!(EmbeddingProvider::VALID_OPTIONS.contains(provider.as_str()));
        }
    }

    #[test]
    fn test_embedding_provider_rejects_claude() {
        let err = "claude".parse::<EmbeddingProvider>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported embedding provider: 'claude'. Valid options: openai, gemini"
        );
    }
}
