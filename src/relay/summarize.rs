use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::relay::error::RelayError;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// ============================================================================
// Request body
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"Please provide a concise summary of the following text in bullet point format. Make it easy to understand and keep it brief:

{}

Format your response as bullet points using • symbol. Focus on the key points and main ideas. Do not add any type of markdown in the response, just plain text."#,
        text
    )
}

// ============================================================================
// Response parsing
// ============================================================================

/// Pull `candidates[0].content.parts[0].text` out of a provider response.
///
/// Any other shape is a `NoSummary` error carrying `error.message` when the
/// provider sent one.
pub fn extract_summary(response: &Value) -> Result<String, RelayError> {
    if let Some(text) = response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
    {
        return Ok(text.to_string());
    }

    let details = response
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string);
    Err(RelayError::NoSummary { details })
}

/// User-facing text for a summarize outcome.
pub fn summary_message(result: &Result<String, RelayError>) -> String {
    match result {
        Ok(summary) => summary.clone(),
        Err(e) => e.user_message(),
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct SummarizeClient {
    client: reqwest::blocking::Client,
    pub endpoint: String,
    pub model: String,
}

impl Default for SummarizeClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_MODEL)
    }
}

impl SummarizeClient {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn url(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, api_key
        )
    }

    /// Summarize `text`. The response body is inspected whatever the HTTP
    /// status, since error payloads carry the provider's message.
    pub fn summarize(&self, text: &str, api_key: &str) -> Result<String, RelayError> {
        if api_key.is_empty() {
            return Err(RelayError::MissingApiKey);
        }

        let request = GenerateContentRequest::from_prompt(build_prompt(text));
        debug!("summarize: model={}, chars={}", self.model, text.len());

        let response = self.client.post(self.url(api_key)).json(&request).send()?;
        let body = response.text()?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;

        extract_summary(&value)
    }
}
