//! Anthropic Claude chat client

use super::{http_client, send_json, ApiKey};
use crate::error::ProviderError;
use crate::schemas::anthropic::{
    AnthropicErrorResponse, ContentBlock, Message, MessagesRequest, MessagesResponse,
};
use crate::schemas::{ChatMessage, ChatRole};
use reqwest::Client;

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub(crate) const PROVIDER_NAME: &str = "Anthropic";
const KEY_VAR: &str = "ANTHROPIC_API_KEY";

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<AnthropicErrorResponse>(body)
        .ok()
        .map(|e| format!("{}: {}", e.error.error_type, e.error.message))
}

/// Client for the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct AnthropicChat {
    client: Client,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    api_key: Option<ApiKey>,
}

impl AnthropicChat {
    pub fn new(
        model: impl Into<String>,
        temperature: f64,
        api_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client()?,
            base_url: ANTHROPIC_API_BASE.to_string(),
            model: model.into(),
            temperature,
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key: api_key.map(ApiKey::from),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(ApiKey::expose)
    }

    pub fn build_request(&self, messages: &[ChatMessage]) -> MessagesRequest {
        let mut system = Vec::new();
        let mut turns = Vec::new();

        for message in messages {
            match message.role {
                ChatRole::System => system.push(message.content.as_str()),
                ChatRole::User | ChatRole::Assistant => turns.push(Message {
                    role: message.role.as_str().to_string(),
                    content: message.content.clone(),
                }),
            }
        }

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: turns,
        }
    }

    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::MissingApiKey(KEY_VAR))?;
        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(model = %self.model, url = %url, "Calling Anthropic messages API");

        let request = self
            .client
            .post(&url)
            .header("x-api-key", api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_request(messages));
        let response: MessagesResponse = send_json(PROVIDER_NAME, request, error_message).await?;

        response_text(response).ok_or(ProviderError::EmptyResponse(PROVIDER_NAME))
    }
}

fn response_text(response: MessagesResponse) -> Option<String> {
    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_server::serve_once;

    #[test]
    fn test_build_request_lifts_system_prompt() {
        let chat = AnthropicChat::new("claude-3-5-sonnet-latest", 0.2, Some("key".to_string())).unwrap();
        let request = chat.build_request(&[
            ChatMessage::system("Use the context."),
            ChatMessage::user("Question?"),
        ]);

        assert_eq!(request.system.as_deref(), Some("Use the context."));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-5-sonnet-latest");
        assert_eq!(json["temperature"], 0.2);
    }

    #[test]
    fn test_max_tokens_override() {
        let chat = AnthropicChat::new("claude-3-5-haiku-latest", 0.0, None)
            .unwrap()
            .with_max_tokens(256);
        assert_eq!(chat.build_request(&[ChatMessage::user("hi")]).max_tokens, 256);
    }

    #[test]
    fn test_response_text_skips_non_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-latest",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "The answer"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 3}
        }"#;
        let response: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response_text(response).as_deref(), Some("The answer"));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("authentication_error: invalid x-api-key")
        );
    }

    #[tokio::test]
    async fn test_invoke_without_key() {
        let chat = AnthropicChat::new("claude-3-5-sonnet-latest", 0.0, None).unwrap();
        let err = chat.invoke(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey("ANTHROPIC_API_KEY")));
    }

    #[tokio::test]
    async fn test_invoke_posts_messages() {
        let (base_url, server) = serve_once(
            200,
            r#"{"id": "msg_1", "model": "claude-3-5-sonnet-latest", "content": [{"type": "text", "text": "Grounded reply"}], "stop_reason": "end_turn"}"#,
        )
        .await;
        let chat = AnthropicChat::new("claude-3-5-sonnet-latest", 0.0, Some("sk-ant".to_string()))
            .unwrap()
            .with_base_url(base_url);

        let reply = chat
            .invoke(&[ChatMessage::system("Use the context."), ChatMessage::user("Question?")])
            .await
            .unwrap();
        assert_eq!(reply, "Grounded reply");

        let request = server.await.unwrap();
        assert_eq!(request.request_line, "POST /v1/messages HTTP/1.1");
        assert_eq!(request.header("x-api-key"), Some("sk-ant"));
        assert_eq!(request.header("anthropic-version"), Some(ANTHROPIC_VERSION));
        assert_eq!(request.json()["system"], "Use the context.");
        assert_eq!(request.json()["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_invoke_maps_error_body() {
        let (base_url, server) = serve_once(
            401,
            r#"{"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}"#,
        )
        .await;
        let chat = AnthropicChat::new("claude-3-5-sonnet-latest", 0.0, Some("sk-bad".to_string()))
            .unwrap()
            .with_base_url(base_url);

        let err = chat.invoke(&[ChatMessage::user("hi")]).await.unwrap_err();
        match err {
            ProviderError::Api { provider, status, message } => {
                assert_eq!(provider, "Anthropic");
                assert_eq!(status, 401);
                assert_eq!(message, "authentication_error: invalid x-api-key");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }
}
