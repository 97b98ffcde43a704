//! Google Gemini provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use clarity_core::error::{ClarityError, ClarityResult, ErrorCode};
use clarity_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use clarity_core::types::{Message, MessageRole};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider over the `generateContent` REST endpoint.
pub struct GeminiLlm {
    client: Client,
    config: LlmConfig,
    api_key: SecretString,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiLlm {
    /// Create a Gemini provider.
    ///
    /// The API key comes from `config.api_key`, falling back to the
    /// `GEMINI_API_KEY` environment variable.
    pub fn new(config: LlmConfig) -> ClarityResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ClarityError::missing_credentials(
                    "Gemini API key not found. Set GEMINI_API_KEY environment variable or provide api_key in config.",
                )
            })?;

        Self::with_api_key(config, SecretString::new(api_key))
    }

    /// Create a Gemini provider with an explicit API key.
    pub fn with_api_key(config: LlmConfig, api_key: SecretString) -> ClarityResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ClarityError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            api_key,
            base_url,
        })
    }

    fn endpoint(&self) -> ClarityResult<Url> {
        let raw = format!("{}/models/{}:generateContent", self.base_url, self.config.model);
        Url::parse(&raw)
            .map_err(|e| ClarityError::Configuration(format!("Invalid Gemini endpoint '{}': {}", raw, e)))
    }

    fn build_request(&self, messages: &[Message], options: GenerationOptions) -> GeminiRequest {
        let system_text: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let system_instruction = (!system_text.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(system_text.join("\n\n")),
            }],
        });

        let contents = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        GeminiRequest {
            system_instruction,
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature.unwrap_or(self.config.temperature),
                max_output_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            },
        }
    }
}

/// Map a failed Gemini response to a clarity error.
///
/// Error markers in the body take precedence over the HTTP status.
fn map_error(status: u16, body: &str) -> ClarityError {
    let detail = serde_json::from_str::<GeminiError>(body).ok();
    let message = detail
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    let api_status = detail.and_then(|e| e.error.status).unwrap_or_default();

    if body.contains("API_KEY_INVALID") {
        return ClarityError::authentication("Invalid Gemini API key. Please check your settings.");
    }
    if body.contains("RATE_LIMIT_EXCEEDED") {
        return ClarityError::rate_limit(
            "Gemini rate limit exceeded. Please wait a moment and try again.",
        );
    }
    if body.contains("QUOTA_EXCEEDED") || api_status == "RESOURCE_EXHAUSTED" {
        return ClarityError::quota_exceeded(
            "Gemini quota exceeded. Please try again tomorrow or upgrade your plan.",
        );
    }

    match status {
        401 | 403 | 429 => ClarityError::from_http_status(status, &message),
        _ => ClarityError::llm(format!("Gemini API error ({}): {}", status, message)),
    }
}

#[async_trait]
impl Llm for GeminiLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> ClarityResult<LlmResponse> {
        let request = self.build_request(messages, options.unwrap_or_default());
        let url = self.endpoint()?;

        debug!(model = %self.config.model, contents = request.contents.len(), "Sending Gemini request");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ClarityError::Network {
                message: format!("Gemini API request failed: {}", e),
                code: ErrorCode::NetConnectionFailed,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClarityError::llm(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(map_error(status.as_u16(), &body));
        }

        let response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ClarityError::parse(format!("Failed to parse Gemini response: {}", e)))?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ClarityError::empty_response("Gemini"));
        }

        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(LlmResponse {
            content: Some(text),
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
