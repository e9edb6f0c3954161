use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::types::{ChangeSet, ChangeSetRef, Comment, Documentation, FileDiff, FileStatus};
use super::{diff, docs, ChangeSetError, ChangeSetSource, CommentSource};
use crate::config::GitHubConfig;

const USER_AGENT: &str = "qa-context";
const JSON: &str = "application/vnd.github+json";
const RAW: &str = "application/vnd.github.raw";
const PAGE_SIZE: usize = 100;
/// GitHub stops listing pull request files after 3000 entries.
const MAX_FILE_PAGES: usize = 30;
const MAX_COMMENT_PAGES: usize = 30;
const TESTING_GUIDELINE_PATHS: &[&str] = &["TESTING.md", "TEST.md", "test/README.md"];

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct Label {
    name: String,
}

#[derive(Deserialize)]
struct PullResponse {
    title: String,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<Label>,
    additions: usize,
    deletions: usize,
    commits: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct FileResponse {
    filename: String,
    status: String,
    additions: usize,
    deletions: usize,
    patch: Option<String>,
}

#[derive(Deserialize)]
struct CommentResponse {
    user: Option<User>,
    body: Option<String>,
    created_at: DateTime<Utc>,
}

/// GitHub REST API client.
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Self {
        if config.token.is_none() {
            warn!("no GitHub token configured; requests are unauthenticated and rate limited");
        }
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn get(&self, path: &str, accept: &str) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .header("User-Agent", USER_AGENT)
            .header("Accept", accept);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_files(&self, reference: &ChangeSetRef) -> Result<Vec<FileDiff>, ChangeSetError> {
        let mut files = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let path = format!(
                "/repos/{}/{}/pulls/{}/files?per_page={}&page={}",
                reference.owner, reference.repo, reference.number, PAGE_SIZE, page
            );
            let batch: Vec<FileResponse> = self.get(&path, JSON).send().await?.error_for_status()?.json().await?;
            let short_page = batch.len() < PAGE_SIZE;
            files.extend(batch.into_iter().map(|f| {
                FileDiff::new(
                    f.filename,
                    FileStatus::from_github(&f.status),
                    f.additions,
                    f.deletions,
                    f.patch,
                )
            }));
            if short_page {
                break;
            }
        }
        Ok(files)
    }

    /// Fetch a raw repository document. A 404 means the document is absent.
    async fn fetch_raw(&self, path: &str) -> Result<Option<String>, ChangeSetError> {
        let response = self.get(path, RAW).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.text().await?))
    }
}

#[async_trait]
impl CommentSource for GitHubClient {
    #[instrument(skip(self), fields(change_set = %reference))]
    async fn fetch_comments(&self, reference: &ChangeSetRef) -> Result<Vec<Comment>, ChangeSetError> {
        let mut comments = Vec::new();
        for page in 1..=MAX_COMMENT_PAGES {
            let path = format!(
                "/repos/{}/{}/issues/{}/comments?per_page={}&page={}",
                reference.owner, reference.repo, reference.number, PAGE_SIZE, page
            );
            let batch: Vec<CommentResponse> = self.get(&path, JSON).send().await?.error_for_status()?.json().await?;
            let short_page = batch.len() < PAGE_SIZE;
            comments.extend(batch.into_iter().map(|c| Comment {
                author: c.user.map(|u| u.login).unwrap_or_default(),
                body: c.body.unwrap_or_default(),
                created_at: c.created_at,
            }));
            if short_page {
                break;
            }
        }
        debug!(count = comments.len(), "received comments");
        Ok(comments)
    }
}

#[async_trait]
impl ChangeSetSource for GitHubClient {
    #[instrument(skip(self), fields(change_set = %reference))]
    async fn fetch_change_set(&self, reference: &ChangeSetRef) -> Result<ChangeSet, ChangeSetError> {
        let path = format!(
            "/repos/{}/{}/pulls/{}",
            reference.owner, reference.repo, reference.number
        );

        debug!("fetching pull request metadata");
        let response = self.get(&path, JSON).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ChangeSetError::NotFound(reference.to_string()));
        }
        let metadata: PullResponse = response.error_for_status()?.json().await?;
        debug!(title = %metadata.title, additions = metadata.additions, deletions = metadata.deletions, "received metadata");

        let files = self.fetch_files(reference).await?;
        debug!(files = files.len(), "received file diffs");

        let comments = match self.fetch_comments(reference).await {
            Ok(comments) => comments,
            Err(err) => {
                warn!(error = %err, "could not fetch pull request comments");
                Vec::new()
            }
        };

        let diff_summary = diff::summarize(&metadata.title, metadata.body.as_deref(), &files);

        Ok(ChangeSet {
            reference: reference.clone(),
            title: metadata.title,
            description: metadata.body,
            labels: metadata.labels.into_iter().map(|l| l.name).collect(),
            files,
            additions: metadata.additions,
            deletions: metadata.deletions,
            commits: metadata.commits,
            created_at: metadata.created_at,
            updated_at: metadata.updated_at,
            comments,
            diff_summary: Some(diff_summary),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_documentation(&self, owner: &str, repo: &str) -> Result<Documentation, ChangeSetError> {
        let readme = self.fetch_raw(&format!("/repos/{owner}/{repo}/readme")).await?;
        if readme.is_none() {
            warn!("repository has no README");
        }

        // Optional documents: failures are logged and skipped.
        let mut testing_guidelines = None;
        for candidate in TESTING_GUIDELINE_PATHS {
            match self
                .fetch_raw(&format!("/repos/{owner}/{repo}/contents/{candidate}"))
                .await
            {
                Ok(Some(content)) => {
                    debug!(path = %candidate, "found testing guidelines");
                    testing_guidelines = Some(content);
                    break;
                }
                Ok(None) => {}
                Err(err) => warn!(path = %candidate, error = %err, "could not fetch testing guidelines"),
            }
        }

        let has_docs_dir = match self
            .get(&format!("/repos/{owner}/{repo}/contents/docs"), JSON)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                warn!(error = %err, "could not check docs folder");
                false
            }
        };

        Ok(docs::from_readme(readme, testing_guidelines, has_docs_dir))
    }
}
