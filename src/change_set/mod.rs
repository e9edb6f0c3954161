pub mod diff;
pub mod docs;
pub mod fixture;
pub mod github;
pub mod types;

pub use github::GitHubClient;
pub use types::{ChangeSet, ChangeSetRef, Comment, Documentation, FileDiff, FileStatus};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChangeSetError {
    #[error("Invalid pull request URL: {0}")]
    InvalidReference(String),

    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Pull request not found: {0}")]
    NotFound(String),

    #[error("Failed to parse diff: {0}")]
    DiffParse(String),
}

/// Re-pollable access to a change set's conversation comments.
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch the conversation comments, oldest first.
    async fn fetch_comments(&self, reference: &ChangeSetRef) -> Result<Vec<Comment>, ChangeSetError>;
}

/// Read access to a version-control hosting service.
#[async_trait]
pub trait ChangeSetSource: CommentSource {
    /// Fetch metadata, per-file diffs, labels and comments.
    async fn fetch_change_set(&self, reference: &ChangeSetRef) -> Result<ChangeSet, ChangeSetError>;

    /// Fetch README-derived documentation and testing guidelines.
    async fn fetch_documentation(&self, owner: &str, repo: &str) -> Result<Documentation, ChangeSetError>;
}

/// Parse a GitHub pull request URL into its component parts.
///
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}, optionally
/// followed by a tab such as `/files` or `/commits`.
pub fn parse_change_set_url(url: &str) -> Result<ChangeSetRef, ChangeSetError> {
    let invalid = || ChangeSetError::InvalidReference(url.to_string());
    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;

    if parsed.scheme() != "https" || parsed.host_str() != Some("github.com") {
        return Err(invalid());
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() < 4 || segments[2] != "pull" {
        return Err(invalid());
    }

    let number = segments[3].parse::<u64>().map_err(|_| invalid())?;

    Ok(ChangeSetRef {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        number,
    })
}
