pub mod event;
pub mod types;

pub use event::{EventSource, EventTarget, PullRequestEvent, PullRequestPayload};
pub use types::{ChangedFileSummary, PullRequestSummary, RepoRef};

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::GitHubConfig;

const USER_AGENT: &str = "pr-poster";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("GitHub token not found in environment")]
    MissingToken,

    #[error("Failed to read event payload: {0}")]
    PayloadRead(#[from] std::io::Error),

    #[error("Failed to parse event payload: {0}")]
    PayloadParse(#[from] serde_json::Error),
}

/// The GitHub operations the event handler needs.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// A single pull request, for events that only reference one.
    async fn get_pull_request(
        &self,
        repo: &RepoRef,
        pr_number: u64,
    ) -> Result<PullRequestPayload, GitHubError>;

    /// One page of the files changed by a pull request.
    async fn list_files(
        &self,
        repo: &RepoRef,
        pr_number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ChangedFileSummary>, GitHubError>;

    /// Post a comment on an issue or pull request.
    async fn create_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
        body: &str,
    ) -> Result<(), GitHubError>;
}

/// REST client for api.github.com (or an Enterprise API root).
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let token = config.token.clone().ok_or(GitHubError::MissingToken)?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn repo_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.repo)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GitHubError::Status { status, body })
    }
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn get_pull_request(
        &self,
        repo: &RepoRef,
        pr_number: u64,
    ) -> Result<PullRequestPayload, GitHubError> {
        let url = format!("{}/pulls/{}", self.repo_url(repo), pr_number);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", GITHUB_ACCEPT)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let pr = Self::check(response)
            .await?
            .json::<PullRequestPayload>()
            .await?;
        debug!(title = %pr.title, "fetched pull request");
        Ok(pr)
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn list_files(
        &self,
        repo: &RepoRef,
        pr_number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ChangedFileSummary>, GitHubError> {
        let url = format!("{}/pulls/{}/files", self.repo_url(repo), pr_number);
        let response = self
            .client
            .get(&url)
            .query(&[("per_page", per_page), ("page", page)])
            .header("User-Agent", USER_AGENT)
            .header("Accept", GITHUB_ACCEPT)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let files = Self::check(response)
            .await?
            .json::<Vec<ChangedFileSummary>>()
            .await?;
        debug!(count = files.len(), "received changed files page");
        Ok(files)
    }

    #[instrument(skip(self, repo, body), fields(repo = %repo, body_len = body.len()))]
    async fn create_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/issues/{}/comments", self.repo_url(repo), issue_number);
        let response = self
            .client
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", GITHUB_ACCEPT)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;

        Self::check(response).await?;
        debug!("comment posted");
        Ok(())
    }
}
