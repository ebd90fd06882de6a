pub mod chatgpt;
pub mod dummy;
pub mod types;

pub use chatgpt::ChatGptImageProvider;
pub use dummy::DummyImageProvider;
pub use types::{ImageRequest, ImageResult, ProviderKind};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("OPENAI_API_KEY is required for the chatgpt image provider")]
    MissingApiKey,

    #[error("Image generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Image generation failed with status {status}: {message}")]
    Backend {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Image generation succeeded but returned no URL")]
    MissingUrl,
}

/// A backend that turns a text prompt into a poster image.
/// Providers are shared across events, so they must be Send + Sync.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Which backend this is; stamped on every result it returns.
    fn kind(&self) -> ProviderKind;

    async fn generate_poster(&self, request: &ImageRequest) -> Result<ImageResult, ProviderError>;
}

/// Pick the provider named by the configuration.
///
/// Fails only when the live backend is selected without an API key.
pub fn create_image_provider(config: &Config) -> Result<Arc<dyn ImageProvider>, ProviderError> {
    info!(provider = %config.image_provider, "creating image provider");
    match config.image_provider {
        ProviderKind::Dummy => Ok(Arc::new(DummyImageProvider::new())),
        ProviderKind::ChatGpt => Ok(Arc::new(ChatGptImageProvider::new(config)?)),
    }
}

/// How a generation attempt ended, as far as the caller-facing message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterOutcome {
    Generated(ImageResult),
    Failed(String),
}

/// Run one generation and fold any error into [`PosterOutcome::Failed`].
pub async fn generate(provider: &dyn ImageProvider, request: &ImageRequest) -> PosterOutcome {
    match provider.generate_poster(request).await {
        Ok(image) => PosterOutcome::Generated(image),
        Err(err) => {
            let message = err.to_string();
            if message.trim().is_empty() {
                PosterOutcome::Failed("Unknown error".to_string())
            } else {
                PosterOutcome::Failed(message)
            }
        }
    }
}
