//! Google Gemini chat and embedding clients
//!
//! Both talk to the Generative Language REST API and authenticate with the
//! `x-goog-api-key` header.

use super::{http_client, send_json, ApiKey};
use crate::error::ProviderError;
use crate::schemas::gemini::{
    BatchEmbedRequest, BatchEmbedResponse, EmbedContentRequest, GeminiContent, GeminiError,
    GeminiRequest, GeminiResponse, GenerationConfig,
};
use crate::schemas::{ChatMessage, ChatRole};
use reqwest::Client;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(crate) const PROVIDER_NAME: &str = "Gemini";
const KEY_VAR: &str = "GOOGLE_API_KEY";

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GeminiError>(body)
        .ok()
        .map(|e| e.error.message)
}

/// `text-embedding-004` -> `models/text-embedding-004`
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Client for Gemini `generateContent`
#[derive(Debug, Clone)]
pub struct GeminiChat {
    client: Client,
    base_url: String,
    model: String,
    temperature: f64,
    api_key: Option<ApiKey>,
}

impl GeminiChat {
    pub fn new(
        model: impl Into<String>,
        temperature: f64,
        api_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client()?,
            base_url: GEMINI_API_BASE.to_string(),
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

    /// Build the request body
    ///
    /// System messages are joined into `systemInstruction`; assistant turns
    /// use Gemini's `model` role.
    pub fn build_request(&self, messages: &[ChatMessage]) -> GeminiRequest {
        let mut system = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            match message.role {
                ChatRole::System => system.push(message.content.as_str()),
                ChatRole::User => contents.push(GeminiContent::user(message.content.clone())),
                ChatRole::Assistant => contents.push(GeminiContent::model(message.content.clone())),
            }
        }

        GeminiRequest {
            contents,
            system_instruction: (!system.is_empty()).then(|| GeminiContent::plain(system.join("\n\n"))),
            generation_config: Some(GenerationConfig {
                temperature: Some(self.temperature),
                max_output_tokens: None,
            }),
        }
    }

    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::MissingApiKey(KEY_VAR))?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(model = %self.model, url = %url, "Calling Gemini generateContent API");

        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(&self.build_request(messages));
        let response: GeminiResponse = send_json(PROVIDER_NAME, request, error_message).await?;

        response_text(response).ok_or(ProviderError::EmptyResponse(PROVIDER_NAME))
    }
}

/// Concatenated text parts of the first candidate, `None` if there are none
fn response_text(response: GeminiResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Client for Gemini `batchEmbedContents`
#[derive(Debug, Clone)]
pub struct GeminiEmbeddings {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<ApiKey>,
}

impl GeminiEmbeddings {
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client()?,
            base_url: GEMINI_API_BASE.to_string(),
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

    pub fn build_request(&self, texts: &[String]) -> BatchEmbedRequest {
        let model = qualified_model(&self.model);
        BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: model.clone(),
                    content: GeminiContent::plain(text.clone()),
                })
                .collect(),
        }
    }

    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::MissingApiKey(KEY_VAR))?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!(
            "{}/{}:batchEmbedContents",
            self.base_url,
            qualified_model(&self.model)
        );

        tracing::debug!(model = %self.model, count = texts.len(), "Calling Gemini batchEmbedContents API");

        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(&self.build_request(texts));
        let response: BatchEmbedResponse = send_json(PROVIDER_NAME, request, error_message).await?;

        if response.embeddings.len() != texts.len() {
            return Err(ProviderError::Parse {
                provider: PROVIDER_NAME,
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    response.embeddings.len()
                ),
            });
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}
