pub mod download;
pub mod git;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::pr::PullRequestSummary;
use crate::prompt::{build_poster_prompt, PromptInput};
use crate::provider::{ImageProvider, ImageRequest, ProviderError};

pub const DEFAULT_OUTPUT_PATH: &str = "assets/release-poster.png";
pub const UNTAGGED_RELEASE: &str = "untagged-release";
pub const DEFAULT_ACTOR: &str = "automation";

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("Failed to run git {args}: {source}")]
    GitSpawn {
        args: String,
        source: std::io::Error,
    },

    #[error("git {args} exited with status {code:?}")]
    GitStatus { args: String, code: Option<i32> },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Failed to download image: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Failed to download image: status {0}")]
    DownloadStatus(reqwest::StatusCode),

    #[error("Failed to download image: more than {0} redirects")]
    TooManyRedirects(usize),

    #[error("Invalid image URL {0}")]
    InvalidUrl(String),

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// Inputs that only the release pipeline uses. Empty strings count as unset.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    pub output_path: Option<PathBuf>,
    pub repo: Option<String>,
    pub tag: Option<String>,
    pub actor: Option<String>,
}

impl ReleaseOptions {
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH))
    }

    pub fn tag_name(&self) -> &str {
        non_empty(&self.tag).unwrap_or(UNTAGGED_RELEASE)
    }

    pub fn actor(&self) -> &str {
        non_empty(&self.actor).unwrap_or(DEFAULT_ACTOR)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Printed to stdout once the poster is on disk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummary {
    pub output_path: PathBuf,
    pub provider: String,
    pub prompt: String,
}

/// Describe the latest commit as a release, generate a poster for it and
/// save the image to disk.
pub async fn generate_release_poster(
    config: &Config,
    provider: &dyn ImageProvider,
    options: &ReleaseOptions,
) -> Result<ReleaseSummary, ReleaseError> {
    let repo_full_name = git::repo_full_name(non_empty(&options.repo)).await;
    let commit_message = git::latest_commit_summary().await;
    let files = git::changed_files().await;

    let release = PullRequestSummary {
        number: 0,
        title: format!("Release {}", options.tag_name()),
        body: Some(commit_message),
        html_url: None,
        author: Some(options.actor().to_string()),
    };

    let prompt = build_poster_prompt(&PromptInput {
        base_prompt: &config.poster_prompt,
        guidance: config.poster_guidance.as_deref(),
        repo_full_name: &repo_full_name,
        pr: &release,
        files: &files,
        max_files: config.max_files,
    });

    info!(provider = %provider.kind(), repo = %repo_full_name, "generating release poster");
    let image = provider
        .generate_poster(
            &ImageRequest::new(prompt.clone()).with_size(config.image_width, config.image_height),
        )
        .await?;

    let output_path = options.output_path();
    let client = download::download_client()?;
    download::download_image(&client, &image.url, &output_path).await?;
    info!(path = %output_path.display(), "release poster saved");

    Ok(ReleaseSummary {
        output_path,
        provider: image.provider.to_string(),
        prompt,
    })
}
