//! Client factories
//!
//! Each call builds a fresh client from the settings. Nothing is cached and
//! nothing is sent over the network. A missing API key is only logged here;
//! it fails when the client is first used.

use super::{EmbeddingProvider, LlmProvider};
use crate::config::Settings;
use crate::error::ConfigError;
use crate::services::{
    AnthropicChat, ChatModel, EmbeddingModel, GeminiChat, GeminiEmbeddings, OpenAiChat,
    OpenAiEmbeddings,
};

/// Build the chat client selected by `llm_provider`
pub fn get_llm(settings: &Settings) -> Result<ChatModel, ConfigError> {
    let provider: LlmProvider = settings.llm_provider.parse()?;
    let model = settings.llm_model.as_str();
    let temperature = settings.llm_temperature;

    let (chat, key_var) = match provider {
        LlmProvider::OpenAi => (
            ChatModel::OpenAi(OpenAiChat::new(model, temperature, settings.openai_api_key.clone())?),
            "OPENAI_API_KEY",
        ),
        LlmProvider::Gemini => (
            ChatModel::Gemini(GeminiChat::new(model, temperature, settings.google_api_key.clone())?),
            "GOOGLE_API_KEY",
        ),
        LlmProvider::Claude => (
            ChatModel::Claude(AnthropicChat::new(
                model,
                temperature,
                settings.anthropic_api_key.clone(),
            )?),
            "ANTHROPIC_API_KEY",
        ),
    };

    if chat.api_key().is_none() {
        tracing::warn!(provider = %provider, key = key_var, "LLM API key is not set");
    }
    tracing::debug!(provider = %provider, model = %model, temperature, "Created LLM client");

    Ok(chat)
}

/// Build the embedding client selected by `embedding_provider`
pub fn get_embeddings(settings: &Settings) -> Result<EmbeddingModel, ConfigError> {
    let provider: EmbeddingProvider = settings.embedding_provider.parse()?;
    let model = settings.embedding_model.as_str();

    let (embeddings, key_var) = match provider {
        EmbeddingProvider::OpenAi => (
            EmbeddingModel::OpenAi(OpenAiEmbeddings::new(model, settings.openai_api_key.clone())?),
            "OPENAI_API_KEY",
        ),
        EmbeddingProvider::Gemini => (
            EmbeddingModel::Gemini(GeminiEmbeddings::new(model, settings.google_api_key.clone())?),
            "GOOGLE_API_KEY",
        ),
    };

    if embeddings.api_key().is_none() {
        tracing::warn!(provider = %provider, key = key_var, "Embedding API key is not set");
    }
    tracing::debug!(provider = %provider, model = %model, "Created embedding client");

    Ok(embeddings)
}
