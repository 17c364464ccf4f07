use crate::error::RecallError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Env var holding the Generative Language API key.
pub const API_KEY_VAR: &str = "GOOGLE_GENAI_API_KEY";

#[async_trait]
pub trait TextModel {
    async fn generate(&self, prompt: &str) -> Result<String, RecallError>;
}

/// Client for the Generative Language `generateContent` REST API.
pub struct GeminiClient {
    client: Arc<Client>,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Arc::new(Client::new()),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn from_env() -> Result<Self, RecallError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                RecallError::InvalidArgument(format!("{API_KEY_VAR} is not set"))
            })?;
        Ok(Self::new(api_key))
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, RecallError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint, self.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{"parts": [{"text": prompt}]}]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RecallError::Model(format!(
                "generateContent returned {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await?;
        text_from_response(&payload).ok_or_else(|| {
            RecallError::Model("generateContent response had no text candidate".to_string())
        })
    }
}

/// First candidate's text parts, concatenated.
fn text_from_response(payload: &Value) -> Option<String> {
    let parts = payload
        .pointer("/candidates/0/content/parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.pointer("/text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_concatenates_candidate_parts() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "Hello "}, {"text": "world"}],
                    "role": "model"
                }
            }]
        });
        assert_eq!(text_from_response(&payload), Some("Hello world".to_string()));
    }

    #[test]
    fn response_without_candidates_yields_none() {
        assert_eq!(text_from_response(&json!({})), None);
        assert_eq!(text_from_response(&json!({"candidates": []})), None);
    }

    #[test]
    fn response_with_empty_parts_yields_none() {
        let payload = json!({
            "candidates": [{"content": {"parts": []}}]
        });
        assert_eq!(text_from_response(&payload), None);
    }
}
