//! Gemini Generation Client
//!
//! One call to the Gemini `generateContent` API bound to one pool key.
//! The key is attached per request; nothing about a key outlives the call.
//! Failures are classified so the retry layer can tell credential rejections
//! from malformed requests.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::key_pool::PoolKey;
use super::{GenerationCall, GenerationPayload};
use crate::constants::network;
use crate::types::{ApiError, ErrorCategory, ErrorClassifier, QuizError, Result};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: usize,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: network::DEFAULT_API_BASE.to_string(),
            model: network::DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_output_tokens: 8192,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Gemini API client
pub struct GeminiClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.config.api_base)
            .field("model", &self.config.model)
            .field("temperature", &self.config.temperature)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| QuizError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, payload: &GenerationPayload) -> GenerateContentRequest {
        let mut parts = Vec::new();

        let text = match &payload.text {
            Some(content) => format!("{}\n\n{}", payload.instructions, content),
            None => payload.instructions.clone(),
        };
        parts.push(Part::Text { text });

        if let Some(media) = &payload.media {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: media.media_type.clone(),
                    data: BASE64.encode(&media.data),
                },
            });
        }

        GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl GenerationCall for GeminiClient {
    async fn call(&self, key: PoolKey<'_>, payload: &GenerationPayload) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base, self.config.model
        );
        let request = self.build_request(payload);

        debug!(
            model = %self.config.model,
            key_index = key.index,
            has_media = payload.media.is_some(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key.secret.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                QuizError::Api(
                    ErrorClassifier::classify(&format!("request failed: {}", e))
                        .key_index(key.index),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_error_message(&body).unwrap_or(body);
            warn!(status = status.as_u16(), key_index = key.index, "Upstream rejected call");
            return Err(QuizError::Api(
                ErrorClassifier::classify_http_status(status.as_u16(), &message)
                    .key_index(key.index),
            ));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            QuizError::Api(
                ApiError::new(
                    ErrorCategory::Transient,
                    format!("failed to decode upstream response: {}", e),
                )
                .key_index(key.index),
            )
        })?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                QuizError::Api(
                    ApiError::new(ErrorCategory::Transient, "no content in upstream response")
                        .key_index(key.index),
                )
            })?;

        debug!(chars = text.len(), "Received upstream response");
        Ok(text)
    }

    async fn health_check(&self, key: PoolKey<'_>) -> Result<bool> {
        let url = format!("{}/models", self.config.api_base);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", key.secret.expose_secret())
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "Upstream health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!("Upstream health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// Pull the human-readable message out of a Gemini error body
fn parse_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error.get("message")?.as_str()?;
    match error.get("status").and_then(|s| s.as_str()) {
        Some(status) => Some(format!("{}: {}", status, message)),
        None => Some(message.to_string()),
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}
