use async_trait::async_trait;

use super::{ImageProvider, ImageRequest, ImageResult, ProviderError, ProviderKind};

const DEFAULT_WIDTH: u32 = 512;
const DEFAULT_HEIGHT: u32 = 768;

/// Placeholder provider for demos and tests. Never fails and never touches
/// the network; the URL just encodes the requested size.
#[derive(Debug, Default)]
pub struct DummyImageProvider;

impl DummyImageProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageProvider for DummyImageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Dummy
    }

    async fn generate_poster(&self, request: &ImageRequest) -> Result<ImageResult, ProviderError> {
        let width = request.width.unwrap_or(DEFAULT_WIDTH);
        let height = request.height.unwrap_or(DEFAULT_HEIGHT);
        Ok(ImageResult {
            url: format!("https://placehold.co/{}x{}?text=Soviet+Poster", width, height),
            alt_text: request.prompt.clone(),
            provider: self.kind(),
        })
    }
}
