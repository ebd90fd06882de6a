use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ImageProvider, ImageRequest, ImageResult, ProviderError, ProviderKind};
use crate::config::Config;

/// OpenAI image generation (`/images/generations`).
pub struct ChatGptImageProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for ChatGptImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatGptImageProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: String,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ChatGptImageProvider {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let api_key = config
            .openai
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.openai.base_url.trim_end_matches('/').to_string(),
            model: config.openai.model.clone(),
            width: config.image_width,
            height: config.image_height,
        })
    }

    fn size_for(&self, request: &ImageRequest) -> String {
        format!(
            "{}x{}",
            request.width.unwrap_or(self.width),
            request.height.unwrap_or(self.height)
        )
    }
}

#[async_trait]
impl ImageProvider for ChatGptImageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ChatGpt
    }

    #[instrument(skip(self, request), fields(model = %self.model, prompt_len = request.prompt.len()))]
    async fn generate_poster(&self, request: &ImageRequest) -> Result<ImageResult, ProviderError> {
        let body = GenerationRequest {
            model: &self.model,
            prompt: &request.prompt,
            size: self.size_for(request),
        };
        debug!(size = %body.size, "requesting image generation");

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ProviderError::Backend { status, message });
        }

        let parsed = response.json::<GenerationResponse>().await?;
        let url = parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .filter(|url| !url.is_empty())
            .ok_or(ProviderError::MissingUrl)?;
        debug!(url = %url, "image generated");

        Ok(ImageResult {
            url,
            alt_text: request.prompt.clone(),
            provider: self.kind(),
        })
    }
}
