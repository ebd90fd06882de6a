use tokio::process::Command;
use tracing::{debug, warn};

use super::ReleaseError;
use crate::pr::ChangedFileSummary;
use crate::prompt::NO_DESCRIPTION;

pub const UNKNOWN_REPO: &str = "unknown/repo";

/// Run a git command and capture stdout as String.
pub async fn git_output(args: &[&str]) -> Result<String, ReleaseError> {
    let output = Command::new("git")
        .args(args)
        .output()
        .await
        .map_err(|source| ReleaseError::GitSpawn {
            args: args.join(" "),
            source,
        })?;

    if !output.status.success() {
        return Err(ReleaseError::GitStatus {
            args: args.join(" "),
            code: output.status.code(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Repository full name: explicit value, else parsed from origin's URL,
/// else `unknown/repo`.
pub async fn repo_full_name(explicit: Option<&str>) -> String {
    if let Some(repo) = explicit.filter(|r| !r.is_empty()) {
        return repo.to_string();
    }

    match git_output(&["config", "--get", "remote.origin.url"]).await {
        Ok(remote) => {
            if let Some(parsed) = parse_repo_from_remote(remote.trim()) {
                return parsed;
            }
            debug!(remote = %remote.trim(), "remote URL did not match a known form");
        }
        Err(err) => warn!(error = %err, "unable to read git remote to determine repository name"),
    }

    UNKNOWN_REPO.to_string()
}

/// Extract `owner/name` from an SSH (`git@host:owner/name.git`) or HTTP(S)
/// (`https://host/owner/name.git`) remote URL.
pub fn parse_repo_from_remote(remote_url: &str) -> Option<String> {
    let path = if let Some(rest) = remote_url.strip_prefix("git@") {
        rest.split_once(':')?.1.to_string()
    } else {
        let parsed = reqwest::Url::parse(remote_url).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        parsed.path().trim_start_matches('/').to_string()
    };

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let name = segments.next()?;
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return None;
    }
    Some(format!("{}/{}", owner, name))
}

/// Subject and body of HEAD, or the default description if git fails or
/// the message is empty.
pub async fn latest_commit_summary() -> String {
    match git_output(&["log", "-1", "--pretty=%s%n%n%b"]).await {
        Ok(message) if !message.trim().is_empty() => message.trim().to_string(),
        Ok(_) => NO_DESCRIPTION.to_string(),
        Err(err) => {
            warn!(error = %err, "unable to read latest commit message");
            NO_DESCRIPTION.to_string()
        }
    }
}

/// Files touched by HEAD relative to its parent. Empty on failure.
pub async fn changed_files() -> Vec<ChangedFileSummary> {
    match git_output(&["diff", "--name-status", "HEAD^..HEAD"]).await {
        Ok(output) => parse_name_status(&output),
        Err(err) => {
            warn!(error = %err, "unable to read changed files for latest commit");
            Vec::new()
        }
    }
}

/// Parse `git diff --name-status` output (`<status>\t<path>` per line).
///
/// Renames and copies carry two paths; the status and the first path are
/// kept, the same as a whitespace split into two fields.
pub fn parse_name_status(output: &str) -> Vec<ChangedFileSummary> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let status = fields.next()?;
            let filename = fields.next()?;
            Some(ChangedFileSummary {
                status: Some(status.to_string()),
                ..ChangedFileSummary::new(filename)
            })
        })
        .collect()
}
