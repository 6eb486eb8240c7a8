//! Gemini `generateContent` transport.

use super::{GenerationOptions, TextGenerator};
use crate::config::Config;
use crate::error::{CriticError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini REST client; the API key is supplied per call
#[derive(Clone)]
pub struct GeminiGenerator {
    client: Client,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    /// Creates a generator for `model` against `base_url`
    pub fn new(model: impl Into<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a generator from the `gemini` config section
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.gemini.model.clone(),
            &config.gemini.api_url,
            Duration::from_secs(config.gemini.timeout_seconds),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate_text(&self, prompt: &str, options: &GenerationOptions, credential: &str) -> Result<String> {
        let request = GeminiRequest::new(prompt, options);
        debug!("Sending {} prompt chars to {}", prompt.len(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
                return Err(CriticError::QuotaExceeded(format!("Gemini returned {}", status)));
            }
            return Err(CriticError::Generation(format!("Gemini returned {}: {}", status, body)));
        }

        let parsed: GeminiResponse = response.json().await?;
        parsed.into_text()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiRequest {
    fn new(prompt: &str, options: &GenerationOptions) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt.to_string()) }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
                max_output_tokens: options.max_output_tokens,
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: "BLOCK_NONE".to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl GeminiResponse {
    fn into_text(self) -> Result<String> {
        let feedback = self.prompt_feedback.map(|f| f.to_string()).unwrap_or_default();
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| CriticError::Generation(format!("No candidates in response {}", feedback)))?;

        let finish_reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(CriticError::Generation(format!(
                "Candidate carried no text (finish reason: {})",
                finish_reason
            )));
        }
        Ok(text)
    }
}
