//! Services module
//!
//! Chat and embedding clients for the hosted providers. Building a client
//! never touches the network; requests are only sent by `invoke` and the
//! `embed_*` methods.

pub mod anthropic;
pub mod gemini;
pub mod openai;

#[cfg(test)]
mod test_server;

pub use anthropic::AnthropicChat;
pub use gemini::{GeminiChat, GeminiEmbeddings};
pub use openai::{OpenAiChat, OpenAiEmbeddings};

use crate::error::ProviderError;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::schemas::ChatMessage;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Request timeout applied to every provider client
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Provider API key; never printed by `Debug`
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Chat client for the configured LLM provider
#[derive(Debug, Clone)]
pub enum ChatModel {
    OpenAi(OpenAiChat),
    Gemini(GeminiChat),
    Claude(AnthropicChat),
}

impl ChatModel {
    pub fn provider(&self) -> LlmProvider {
        match self {
            ChatModel::OpenAi(_) => LlmProvider::OpenAi,
            ChatModel::Gemini(_) => LlmProvider::Gemini,
            ChatModel::Claude(_) => LlmProvider::Claude,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ChatModel::OpenAi(chat) => chat.model(),
            ChatModel::Gemini(chat) => chat.model(),
            ChatModel::Claude(chat) => chat.model(),
        }
    }

    pub fn temperature(&self) -> f64 {
        match self {
            ChatModel::OpenAi(chat) => chat.temperature(),
            ChatModel::Gemini(chat) => chat.temperature(),
            ChatModel::Claude(chat) => chat.temperature(),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            ChatModel::OpenAi(chat) => chat.api_key(),
            ChatModel::Gemini(chat) => chat.api_key(),
            ChatModel::Claude(chat) => chat.api_key(),
        }
    }

    /// Send the conversation and return the assistant's reply text
    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        match self {
            ChatModel::OpenAi(chat) => chat.invoke(messages).await,
            ChatModel::Gemini(chat) => chat.invoke(messages).await,
            ChatModel::Claude(chat) => chat.invoke(messages).await,
        }
    }
}

/// Embedding client for the configured embedding provider
#[derive(Debug, Clone)]
pub enum EmbeddingModel {
    OpenAi(OpenAiEmbeddings),
    Gemini(GeminiEmbeddings),
}

impl EmbeddingModel {
    pub fn provider(&self) -> EmbeddingProvider {
        match self {
            EmbeddingModel::OpenAi(_) => EmbeddingProvider::OpenAi,
            EmbeddingModel::Gemini(_) => EmbeddingProvider::Gemini,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            EmbeddingModel::OpenAi(embeddings) => embeddings.model(),
            EmbeddingModel::Gemini(embeddings) => embeddings.model(),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            EmbeddingModel::OpenAi(embeddings) => embeddings.api_key(),
            EmbeddingModel::Gemini(embeddings) => embeddings.api_key(),
        }
    }

    /// Embed a batch of documents, one vector per input in input order
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        match self {
            EmbeddingModel::OpenAi(embeddings) => embeddings.embed_documents(texts).await,
            EmbeddingModel::Gemini(embeddings) => embeddings.embed_documents(texts).await,
        }
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let provider = match self {
            EmbeddingModel::OpenAi(_) => openai::PROVIDER_NAME,
            EmbeddingModel::Gemini(_) => gemini::PROVIDER_NAME,
        };
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse(provider))
    }
}

pub(crate) fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Send a prepared request and decode a JSON success body
///
/// Non-2xx responses become `ProviderError::Api`, using `error_message` to
/// pull the provider's message out of the body when it has one.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
    error_message: fn(&str) -> Option<String>,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(provider, status = status.as_u16(), "Provider request failed");
        let message = error_message(&body).unwrap_or(body);
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(provider, error = %e, body = %body, "Failed to parse provider response");
        ProviderError::Parse {
            provider,
            message: e.to_string(),
        }
    })
}
