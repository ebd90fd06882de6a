/// Which image backend produced (or will produce) a poster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI image generation
    #[default]
    ChatGpt,
    /// Placeholder images, no network or credentials needed
    Dummy,
}

impl ProviderKind {
    /// Map a configured provider name to a variant. Anything that isn't the
    /// placeholder backend selects the live one.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "dummy" => ProviderKind::Dummy,
            _ => ProviderKind::ChatGpt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::ChatGpt => "chatgpt",
            ProviderKind::Dummy => "dummy",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for one poster.
#[derive(Debug, Clone, Default)]
pub struct ImageRequest {
    pub prompt: String,
    /// Overrides the provider's default width
    pub width: Option<u32>,
    /// Overrides the provider's default height
    pub height: Option<u32>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: None,
            height: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// A generated poster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    pub url: String,
    /// Alt text for the image; always the prompt it was generated from
    pub alt_text: String,
    /// Backend that produced the image
    pub provider: ProviderKind,
}
