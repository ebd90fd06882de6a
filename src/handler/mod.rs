pub mod comment;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::pr::{
    ChangedFileSummary, EventTarget, GitHubError, PullRequestApi, PullRequestEvent, RepoRef,
};
use crate::prompt::{build_poster_prompt, PromptInput};
use crate::provider::{self, ImageProvider, ImageRequest, PosterOutcome};

/// GitHub's maximum page size for the files endpoint.
pub const FILES_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Failed to fetch pull request: {0}")]
    FetchPullRequest(#[source] GitHubError),

    #[error("Failed to fetch changed files: {0}")]
    FetchFiles(#[source] GitHubError),

    #[error("Failed to post comment: {0}")]
    PostComment(#[source] GitHubError),
}

/// Long-lived state shared by every event: configuration and the provider.
/// Both are read-only, so one context can serve concurrent events.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub provider: Arc<dyn ImageProvider>,
}

impl AppContext {
    pub fn new(config: Config, provider: Arc<dyn ImageProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

/// What the handler did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Repository not on the allow-list; nothing was posted.
    Skipped,
    /// One comment was posted describing this outcome.
    Commented(PosterOutcome),
}

/// Handle one pull request event end to end: filter, fetch files, build the
/// prompt, generate a poster and post exactly one comment.
#[instrument(skip_all, fields(repo = %event.repository.full_name, pr = event.pull_request.number))]
pub async fn handle_pull_request_event(
    ctx: &AppContext,
    api: &dyn PullRequestApi,
    event: &PullRequestEvent,
) -> Result<EventOutcome, HandlerError> {
    let repo_full_name = &event.repository.full_name;
    if !ctx.config.is_repo_allowed(repo_full_name) {
        info!("skipping PR for {} because it is not in the allowed list", repo_full_name);
        return Ok(EventOutcome::Skipped);
    }

    let repo = event.repo_ref();
    let pr_number = event.pull_request.number;

    let files = fetch_changed_files(api, &repo, pr_number, ctx.config.max_files)
        .await
        .map_err(HandlerError::FetchFiles)?;
    info!(files = files.len(), "fetched changed files");

    let summary = event.summary();
    debug!(url = ?summary.html_url, author = ?summary.author, "building prompt");
    let prompt = build_poster_prompt(&PromptInput {
        base_prompt: &ctx.config.poster_prompt,
        guidance: ctx.config.poster_guidance.as_deref(),
        repo_full_name,
        pr: &summary,
        files: &files,
        max_files: ctx.config.max_files,
    });
    debug!(prompt_len = prompt.len(), "built prompt");

    let request = ImageRequest::new(prompt)
        .with_size(ctx.config.image_width, ctx.config.image_height);
    let outcome = provider::generate(ctx.provider.as_ref(), &request).await;
    match &outcome {
        PosterOutcome::Generated(image) => {
            info!(provider = %image.provider, url = %image.url, "poster generated")
        }
        PosterOutcome::Failed(message) => error!(error = %message, "failed to generate image"),
    }

    let body = comment::body_for(&outcome);
    api.create_comment(&repo, pr_number, &body)
        .await
        .map_err(HandlerError::PostComment)?;

    Ok(EventOutcome::Commented(outcome))
}

/// Fetch the pull request an indirect event points at and wrap it as an
/// event the handler understands.
#[instrument(skip(api, target), fields(repo = %target.repo, pr = target.pr_number))]
pub async fn resolve_target(
    api: &dyn PullRequestApi,
    event_name: &str,
    target: &EventTarget,
) -> Result<PullRequestEvent, HandlerError> {
    let pull_request = api
        .get_pull_request(&target.repo, target.pr_number)
        .await
        .map_err(HandlerError::FetchPullRequest)?;
    Ok(PullRequestEvent::for_target(event_name, target, pull_request))
}

/// Page through the PR's changed files until `max_files` have been collected
/// or GitHub returns a short page.
pub async fn fetch_changed_files(
    api: &dyn PullRequestApi,
    repo: &RepoRef,
    pr_number: u64,
    max_files: usize,
) -> Result<Vec<ChangedFileSummary>, GitHubError> {
    let mut files = Vec::new();
    let mut page = 1;

    while files.len() < max_files {
        let batch = api.list_files(repo, pr_number, page, FILES_PER_PAGE).await?;
        let batch_len = batch.len();
        files.extend(batch);
        debug!(page, batch_len, total = files.len(), "fetched files page");

        if batch_len < FILES_PER_PAGE as usize {
            break;
        }
        page += 1;
    }

    Ok(files)
}
