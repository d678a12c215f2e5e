//! Settings and client factories for a retrieval-augmented-generation service

// Public modules
pub mod config;
pub mod error;
pub mod logging;
pub mod providers;
pub mod schemas;
pub mod services;

// Re-export commonly used types
pub use self::config::{get_settings, Settings};
pub use error::{ConfigError, ProviderError};
pub use providers::{get_embeddings, get_llm, EmbeddingProvider, LlmProvider};
pub use services::{ChatModel, EmbeddingModel};
