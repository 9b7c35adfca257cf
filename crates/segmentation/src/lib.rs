//! Person segmentation through a hosted image model.
//!
//! The model receives the photo plus a fixed instruction and answers with a
//! black/white mask image (subject white, background black). One request per
//! call, no retries.

use std::time::Duration;

use passport::{EncodedImage, PassportError, SegmentationProvider};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Instruction sent alongside the photo.
pub const MASK_PROMPT: &str = "Create a high-contrast black and white segmentation mask for the person in this image. \
The person should be pure white (#FFFFFF) and the background must be solid pure black (#000000). \
Ensure the edges are sharp and clean. Return only the mask image.";

#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Model API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("No API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("Response contained no inline image")]
    NoInlineImage,
    #[error("Invalid mask payload: {0}")]
    Payload(#[from] PassportError),
}

impl From<SegmentationError> for PassportError {
    fn from(err: SegmentationError) -> Self {
        PassportError::Provider(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SegmentationError>;

/// Connection settings for the hosted model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct GeminiConfig {
    /// API base URL, without the `/models/...` suffix
    pub endpoint: String,
    pub model: String,
    /// Falls back to the `GEMINI_API_KEY`, then `API_KEY`, environment variables
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(SegmentationError::MissingApiKey)
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

// Wire format of the generateContent call.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateRequest {
    /// Photo first, then the instruction.
    pub fn for_image(image: &EncodedImage) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.to_base64(),
                        }),
                        text: None,
                    },
                    Part {
                        inline_data: None,
                        text: Some(MASK_PROMPT.to_string()),
                    },
                ],
            }],
        }
    }
}

/// The first part of the first candidate that carries an inline image.
pub fn extract_inline_image(response: &GenerateResponse) -> Result<EncodedImage> {
    let inline = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.parts.iter().find_map(|part| part.inline_data.as_ref()))
        .ok_or(SegmentationError::NoInlineImage)?;
    Ok(EncodedImage::from_base64(inline.mime_type.clone(), &inline.data)?)
}

/// Client for the hosted segmentation model
pub struct GeminiSegmenter {
    http_client: reqwest::Client,
    config: GeminiConfig,
    api_key: String,
}

impl GeminiSegmenter {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Ask the model for a mask of `image`.
    pub async fn request_mask(&self, image: &EncodedImage) -> Result<EncodedImage> {
        debug!(
            model = %self.config.model,
            mime_type = %image.mime_type,
            bytes = image.bytes.len(),
            "Requesting segmentation mask"
        );
        let response = self
            .http_client
            .post(self.config.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::for_image(image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SegmentationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = serde_json::from_slice(&response.bytes().await?)?;
        let mask = extract_inline_image(&body)?;
        info!(mime_type = %mask.mime_type, bytes = mask.bytes.len(), "Received segmentation mask");
        Ok(mask)
    }
}

impl SegmentationProvider for GeminiSegmenter {
    async fn segment(&self, image: &EncodedImage) -> passport::Result<EncodedImage> {
        Ok(self.request_mask(image).await?)
    }
}
