//! OpenAI chat and embedding clients

use super::{http_client, send_json, ApiKey};
use crate::error::ProviderError;
use crate::schemas::openai::{
    ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest, EmbeddingResponse,
    OpenAIErrorResponse, OpenAIMessage,
};
use crate::schemas::ChatMessage;
use reqwest::Client;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub(crate) const PROVIDER_NAME: &str = "OpenAI";
const KEY_VAR: &str = "OPENAI_API_KEY";

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OpenAIErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
}

/// Client for the OpenAI Chat Completions API
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    model: String,
    temperature: f64,
    api_key: Option<ApiKey>,
}

impl OpenAiChat {
    pub fn new(
        model: impl Into<String>,
        temperature: f64,
        api_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client()?,
            base_url: OPENAI_API_BASE.to_string(),
            model: model.into(),
            temperature,
            api_key: api_key.map(ApiKey::from),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(ApiKey::expose)
    }

    pub fn build_request(&self, messages: &[ChatMessage]) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: self.temperature,
        }
    }

    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::MissingApiKey(KEY_VAR))?;
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(model = %self.model, url = %url, "Calling OpenAI chat completions API");

        let request = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose())
            .json(&self.build_request(messages));
        let response: ChatCompletionResponse = send_json(PROVIDER_NAME, request, error_message).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse(PROVIDER_NAME))
    }
}

/// Client for the OpenAI Embeddings API
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<ApiKey>,
}

impl OpenAiEmbeddings {
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client()?,
            base_url: OPENAI_API_BASE.to_string(),
            model: model.into(),
            api_key: api_key.map(ApiKey::from),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(ApiKey::expose)
    }

    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::MissingApiKey(KEY_VAR))?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.base_url);

        tracing::debug!(model = %self.model, count = texts.len(), "Calling OpenAI embeddings API");

        let body = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };
        let request = self.client.post(&url).bearer_auth(api_key.expose()).json(&body);
        let response: EmbeddingResponse = send_json(PROVIDER_NAME, request, error_message).await?;

        Ok(into_vectors(response))
    }
}

/// Order embeddings by their `index`, which the API does not guarantee
fn into_vectors(response: EmbeddingResponse) -> Vec<Vec<f32>> {
    let mut data = response.data;
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}
