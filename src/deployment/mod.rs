use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::change_set::{ChangeSetError, ChangeSetRef, Comment, CommentSource};
use crate::config::DeploymentConfig;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Failed to re-fetch comments: {0}")]
    Fetch(#[from] ChangeSetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    #[default]
    Pending,
    Deployed,
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentState::Pending => write!(f, "pending"),
            DeploymentState::Deployed => write!(f, "deployed"),
        }
    }
}

/// Hosting platform behind a preview URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "fly.io")]
    FlyIo,
    Vercel,
    Netlify,
    Heroku,
    Unknown,
}

impl Provider {
    /// Infer the provider from the domain of a deployment URL.
    pub fn from_url(url: &str) -> Self {
        if url.contains("fly.dev") {
            Provider::FlyIo
        } else if url.contains("vercel.app") {
            Provider::Vercel
        } else if url.contains("netlify.app") {
            Provider::Netlify
        } else if url.contains("herokuapp.com") {
            Provider::Heroku
        } else {
            Provider::Unknown
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::FlyIo => write!(f, "fly.io"),
            Provider::Vercel => write!(f, "vercel"),
            Provider::Netlify => write!(f, "netlify"),
            Provider::Heroku => write!(f, "heroku"),
            Provider::Unknown => write!(f, "unknown"),
        }
    }
}

/// Whether a preview deployment was found, and where.
///
/// Starts out pending with no URL. Becomes deployed once, when the first
/// deployment link is discovered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub url: Option<String>,
    pub status: DeploymentState,
    pub provider: Option<Provider>,
    pub discovered_at: Option<DateTime<Utc>>,
}

impl DeploymentStatus {
    fn deployed(url: &str, discovered_at: DateTime<Utc>) -> Self {
        Self {
            url: Some(url.to_string()),
            status: DeploymentState::Deployed,
            provider: Some(Provider::from_url(url)),
            discovered_at: Some(discovered_at),
        }
    }
}

/// Preview URL patterns, tried in order against each comment.
/// The tail stops at whitespace and at markdown or HTML delimiters.
const DEPLOYMENT_PATTERNS: &[&str] = &[
    r#"https://[^/\s)\]>"'<]+\.fly\.dev[^\s)\]>"'<]*"#,
    r#"https://[^/\s)\]>"'<]+\.vercel\.app[^\s)\]>"'<]*"#,
    r#"https://[^/\s)\]>"'<]+\.netlify\.app[^\s)\]>"'<]*"#,
    r#"https://[^/\s)\]>"'<]+\.herokuapp\.com[^\s)\]>"'<]*"#,
];

static DEPLOYMENT_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DEPLOYMENT_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("deployment pattern is a valid regex"))
        .collect()
});

/// Scan comments oldest first. The first comment containing any deployment
/// link wins, and within it the first pattern in table order.
pub fn find_deployment(comments: &[Comment]) -> DeploymentStatus {
    comments
        .iter()
        .find_map(|comment| {
            DEPLOYMENT_REGEXES
                .iter()
                .find_map(|re| re.find(&comment.body))
                .map(|m| {
                    let url = m.as_str().trim_end_matches(['.', ',']);
                    DeploymentStatus::deployed(url, comment.created_at)
                })
        })
        .unwrap_or_default()
}

#[derive(Debug)]
enum WatchState {
    Collecting { comments: Vec<Comment>, retries: usize },
    Waiting { retries: usize },
    Resolved(DeploymentStatus),
}

/// Waits for deployment evidence in the comment stream, then resolves the
/// deployment status.
///
/// While fewer than `min_comments` comments exist, the watcher sleeps for
/// `wait` and re-fetches, at most `max_retries` times. After that it matches
/// whatever comments it has.
pub struct DeploymentWatcher<'a, S: CommentSource + ?Sized> {
    source: &'a S,
    min_comments: usize,
    wait: Duration,
    max_retries: usize,
}

impl<'a, S: CommentSource + ?Sized> DeploymentWatcher<'a, S> {
    pub fn new(source: &'a S, config: &DeploymentConfig) -> Self {
        Self {
            source,
            min_comments: config.min_comments,
            wait: config.wait(),
            max_retries: config.max_retries,
        }
    }

    #[instrument(skip(self, comments), fields(change_set = %reference, initial = comments.len()))]
    pub async fn watch(
        &self,
        reference: &ChangeSetRef,
        comments: Vec<Comment>,
    ) -> Result<DeploymentStatus, DeploymentError> {
        let mut state = WatchState::Collecting { comments, retries: 0 };
        loop {
            state = match state {
                WatchState::Collecting { comments, retries }
                    if comments.len() < self.min_comments && retries < self.max_retries =>
                {
                    info!(
                        comments = comments.len(),
                        required = self.min_comments,
                        wait_secs = self.wait.as_secs(),
                        "waiting for deployment comments"
                    );
                    WatchState::Waiting { retries }
                }
                WatchState::Collecting { comments, .. } => {
                    WatchState::Resolved(find_deployment(&comments))
                }
                WatchState::Waiting { retries } => {
                    tokio::time::sleep(self.wait).await;
                    let comments = self.source.fetch_comments(reference).await?;
                    debug!(comments = comments.len(), "re-fetched comments");
                    WatchState::Collecting {
                        comments,
                        retries: retries + 1,
                    }
                }
                WatchState::Resolved(status) => {
                    debug!(status = %status.status, url = ?status.url, "deployment resolved");
                    return Ok(status);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::tests::test_comment;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed comment list and counts how often it was asked.
    struct FakeComments {
        comments: Vec<Comment>,
        fetches: AtomicUsize,
        fail: bool,
    }

    impl FakeComments {
        fn new(comments: Vec<Comment>) -> Self {
            Self {
                comments,
                fetches: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl CommentSource for FakeComments {
        async fn fetch_comments(&self, _reference: &ChangeSetRef) -> Result<Vec<Comment>, ChangeSetError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ChangeSetError::NotFound("org/repo#1".to_string()));
            }
            Ok(self.comments.clone())
        }
    }

    fn reference() -> ChangeSetRef {
        ChangeSetRef {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            number: 1,
        }
    }

    fn config(min_comments: usize) -> DeploymentConfig {
        DeploymentConfig {
            min_comments,
            wait_secs: 0,
            max_retries: 1,
        }
    }

    #[tokio::test]
    async fn test_fly_link_with_enough_evidence() {
        let source = FakeComments::new(vec![]);
        let watcher = DeploymentWatcher::new(&source, &config(1));
        let comment = test_comment("see https://pr123.fly.dev/ now live", 5);
        let status = watcher.watch(&reference(), vec![comment.clone()]).await.unwrap();
        assert_eq!(status.status, DeploymentState::Deployed);
        assert_eq!(status.provider, Some(Provider::FlyIo));
        assert_eq!(status.url.as_deref(), Some("https://pr123.fly.dev/"));
        assert_eq!(status.discovered_at, Some(comment.created_at));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_comments_retries_once_then_pending() {
        let source = FakeComments::new(vec![]);
        let watcher = DeploymentWatcher::new(&source, &config(2));
        let status = watcher.watch(&reference(), vec![]).await.unwrap();
        assert_eq!(status.status, DeploymentState::Pending);
        assert!(status.url.is_none());
        assert!(status.provider.is_none());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_uses_refreshed_comments() {
        let source = FakeComments::new(vec![
            test_comment("build started", 1),
            test_comment("Preview: https://app-git-42.vercel.app", 2),
        ]);
        let watcher = DeploymentWatcher::new(&source, &config(2));
        let status = watcher
            .watch(&reference(), vec![test_comment("build started", 1)])
            .await
            .unwrap();
        assert_eq!(status.provider, Some(Provider::Vercel));
        assert_eq!(status.url.as_deref(), Some("https://app-git-42.vercel.app"));
    }

    #[tokio::test]
    async fn test_bounded_retries() {
        let source = FakeComments::new(vec![]);
        let mut cfg = config(5);
        cfg.max_retries = 3;
        let watcher = DeploymentWatcher::new(&source, &cfg);
        watcher.watch(&reference(), vec![]).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_refetch_failure_is_reported() {
        let mut source = FakeComments::new(vec![]);
        source.fail = true;
        let watcher = DeploymentWatcher::new(&source, &config(2));
        let err = watcher.watch(&reference(), vec![]).await.unwrap_err();
        assert!(matches!(err, DeploymentError::Fetch(_)));
    }

    #[test]
    fn test_earliest_matching_comment_wins() {
        let comments = vec![
            test_comment("no link here", 1),
            test_comment("https://site-1.netlify.app/preview", 2),
            test_comment("https://later.fly.dev", 3),
        ];
        let status = find_deployment(&comments);
        assert_eq!(status.provider, Some(Provider::Netlify));
        assert_eq!(status.url.as_deref(), Some("https://site-1.netlify.app/preview"));
    }

    #[test]
    fn test_pattern_order_within_one_comment() {
        let comments = vec![test_comment(
            "heroku https://demo.herokuapp.com and fly https://demo.fly.dev",
            1,
        )];
        assert_eq!(find_deployment(&comments).provider, Some(Provider::FlyIo));
    }

    #[test]
    fn test_markdown_link_excludes_closing_punctuation() {
        let comments = vec![test_comment(
            "[Visit Preview](https://app-git-x.vercel.app) | <https://site.netlify.app>",
            1,
        )];
        let status = find_deployment(&comments);
        assert_eq!(status.url.as_deref(), Some("https://app-git-x.vercel.app"));

        let comments = vec![test_comment("Live: <https://site.netlify.app/pr/3>", 1)];
        assert_eq!(
            find_deployment(&comments).url.as_deref(),
            Some("https://site.netlify.app/pr/3")
        );
    }

    #[test]
    fn test_trailing_sentence_punctuation_is_dropped() {
        let comments = vec![test_comment("Deployed to https://pr-9.fly.dev/app.", 1)];
        assert_eq!(
            find_deployment(&comments).url.as_deref(),
            Some("https://pr-9.fly.dev/app")
        );
        let comments = vec![test_comment("see https://demo.herokuapp.com/?a=1, thanks", 1)];
        assert_eq!(
            find_deployment(&comments).url.as_deref(),
            Some("https://demo.herokuapp.com/?a=1")
        );
    }

    #[test]
    fn test_unrecognized_links_stay_pending() {
        let comments = vec![test_comment("staging at https://staging.example.com", 1)];
        assert_eq!(find_deployment(&comments), DeploymentStatus::default());
    }

    #[test]
    fn test_provider_from_url_and_serde_names() {
        assert_eq!(Provider::from_url("https://x.herokuapp.com"), Provider::Heroku);
        assert_eq!(Provider::from_url("https://x.example.com"), Provider::Unknown);
        assert_eq!(serde_json::to_string(&Provider::FlyIo).unwrap(), "\"fly.io\"");
        assert_eq!(serde_json::to_string(&DeploymentState::Deployed).unwrap(), "\"deployed\"");
    }
}
