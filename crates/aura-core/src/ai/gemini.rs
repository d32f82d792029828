use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Transport-level failures of the generation API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One conversation turn as the API expects it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: String,
    pub text: String,
}

impl Turn {
    pub fn new(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            text: text.into(),
        }
    }
}

/// A structured (or free-text) content generation call
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub model: String,
    pub turns: Vec<Turn>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    /// When set, the model must answer with JSON matching this schema
    pub response_schema: Option<Value>,
}

impl ContentRequest {
    /// Single-prompt request with no system instruction
    pub fn prompt(model: &str, prompt: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            turns: vec![Turn::new("user", prompt)],
            system_instruction: None,
            temperature: None,
            response_schema: None,
        }
    }
}

/// An image generation call
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub count: usize,
    pub aspect_ratio: String,
    pub mime_type: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Serialize)]
struct ImageInstance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
struct OutputOptions<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageParameters<'a> {
    sample_count: usize,
    aspect_ratio: &'a str,
    output_options: OutputOptions<'a>,
}

#[derive(Serialize)]
struct PredictBody<'a> {
    instances: Vec<ImageInstance<'a>>,
    parameters: ImageParameters<'a>,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Run a content generation call and return the concatenated response text
    pub async fn generate_content(&self, request: &ContentRequest) -> Result<String, ApiError> {
        debug!(model = %request.model, turns = request.turns.len(), "generate_content: called");
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        let body = GenerateContentBody {
            contents: request
                .turns
                .iter()
                .map(|turn| Content {
                    role: Some(turn.role.as_str()),
                    parts: vec![Part { text: &turn.text }],
                })
                .collect(),
            system_instruction: request.system_instruction.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: request.response_schema.as_ref().map(|_| "application/json"),
                response_schema: request.response_schema.as_ref(),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }

        let data: GenerateContentResponse = response.json().await?;
        let parts = data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .ok_or_else(|| ApiError::InvalidResponse("No candidates in response".to_string()))?;

        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            return Err(ApiError::InvalidResponse("Empty response text".to_string()));
        }
        Ok(text)
    }

    /// Run an image generation call and return the images as data URIs
    pub async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<String>, ApiError> {
        debug!(model = %request.model, count = request.count, "generate_images: called");
        let url = format!("{}/models/{}:predict", self.base_url, request.model);

        let body = PredictBody {
            instances: vec![ImageInstance {
                prompt: &request.prompt,
            }],
            parameters: ImageParameters {
                sample_count: request.count,
                aspect_ratio: &request.aspect_ratio,
                output_options: OutputOptions {
                    mime_type: &request.mime_type,
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }

        let data: PredictResponse = response.json().await?;
        data.predictions
            .into_iter()
            .map(|p| {
                let bytes = p
                    .bytes_base64_encoded
                    .ok_or_else(|| ApiError::InvalidResponse("Prediction without image bytes".to_string()))?;
                let mime = p.mime_type.unwrap_or_else(|| request.mime_type.clone());
                Ok(format!("data:{};base64,{}", mime, bytes))
            })
            .collect()
    }
}
