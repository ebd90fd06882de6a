use crate::provider::{ImageResult, PosterOutcome};

pub const FAILURE_MARKER: &str = "❗";

/// Comment body for a generated poster: the image plus the prompt that made
/// it (the image's alt text), folded away in a details block.
pub fn success_body(image: &ImageResult) -> String {
    [
        "🛠️ Generated Soviet-inspired propaganda poster for this PR!".to_string(),
        String::new(),
        format!("![Generated poster]({})", image.url),
        String::new(),
        "<details>".to_string(),
        format!("<summary>Prompt ({})</summary>", image.provider),
        String::new(),
        image.alt_text.clone(),
        "</details>".to_string(),
    ]
    .join("\n")
}

pub fn failure_body(message: &str) -> String {
    format!("{} Unable to generate poster: {}", FAILURE_MARKER, message)
}

/// Exactly one body per outcome.
pub fn body_for(outcome: &PosterOutcome) -> String {
    match outcome {
        PosterOutcome::Generated(image) => success_body(image),
        PosterOutcome::Failed(message) => failure_body(message),
    }
}
