use serde::Deserialize;

/// Read-only view of a pull request (or a release standing in for one)
/// used to build the poster prompt.
#[derive(Debug, Clone, Default)]
pub struct PullRequestSummary {
    /// PR number (0 for releases)
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR description, if any
    pub body: Option<String>,
    /// Link to the PR on GitHub
    pub html_url: Option<String>,
    /// Author's GitHub login
    pub author: Option<String>,
}

/// A single file touched by a PR or commit.
///
/// Deserializes straight from GitHub's `pulls/{n}/files` response; fields
/// GitHub sends that we don't use are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangedFileSummary {
    /// File path (e.g., "src/auth/config.rs")
    pub filename: String,
    /// added, modified, removed, renamed, ... (or a git status letter)
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub additions: Option<u64>,
    #[serde(default)]
    pub deletions: Option<u64>,
}

impl ChangedFileSummary {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }
}

/// Owner/name pair addressing a repository in the REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Split an `owner/name` full name; anything else yields `None`.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.trim().split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_display() {
        let repo = RepoRef {
            owner: "org".to_string(),
            repo: "repo".to_string(),
        };
        assert_eq!(repo.to_string(), "org/repo");
    }

    #[test]
    fn test_repo_ref_parse() {
        let repo = RepoRef::parse(" octo/hello ").unwrap();
        assert_eq!((repo.owner.as_str(), repo.repo.as_str()), ("octo", "hello"));
        assert!(RepoRef::parse("octo").is_none());
        assert!(RepoRef::parse("/hello").is_none());
        assert!(RepoRef::parse("a/b/c").is_none());
    }

    #[test]
    fn test_changed_file_from_github_json() {
        let json = r#"{
            "sha": "bbcd538c8e72b8c175046e27cc8f907076331401",
            "filename": "file1.txt",
            "status": "added",
            "additions": 103,
            "deletions": 21,
            "changes": 124,
            "patch": "@@ -132,7 +132,7 @@ module Test @@ -1000,7 +1000,7 @@ module Test"
        }"#;
        let file: ChangedFileSummary = serde_json::from_str(json).unwrap();
        assert_eq!(file.filename, "file1.txt");
        assert_eq!(file.status.as_deref(), Some("added"));
        assert_eq!(file.additions, Some(103));
        assert_eq!(file.deletions, Some(21));
    }

    #[test]
    fn test_changed_file_minimal_json() {
        let file: ChangedFileSummary = serde_json::from_str(r#"{"filename": "a.rs"}"#).unwrap();
        assert_eq!(file, ChangedFileSummary::new("a.rs"));
    }
}
