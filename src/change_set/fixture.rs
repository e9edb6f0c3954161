//! Built-in demo change set, served without network access.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::types::{ChangeSet, ChangeSetRef, Comment, Documentation};
use super::{diff, docs, ChangeSetError, ChangeSetSource, CommentSource};

const SAMPLE_DIFF: &str = include_str!("../../tests/fixtures/sample_diff.patch");
const SAMPLE_README: &str = include_str!("../../tests/fixtures/sample_readme.md");

pub const SAMPLE_URL: &str = "https://github.com/acme/priceboard/pull/42";

/// Serves the embedded sample pull request for every reference.
pub struct FixtureSource;

impl FixtureSource {
    pub fn reference() -> ChangeSetRef {
        ChangeSetRef {
            owner: "acme".to_string(),
            repo: "priceboard".to_string(),
            number: 42,
        }
    }

    fn comments() -> Vec<Comment> {
        vec![
            Comment {
                author: "alice".to_string(),
                body: "Yes/No columns are hard to scan, emojis should help.".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 45, 0).single().unwrap_or_default(),
            },
            Comment {
                author: "fly-bot".to_string(),
                body: "Preview deployed to https://priceboard-pr-42.fly.dev".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 52, 0).single().unwrap_or_default(),
            },
        ]
    }
}

#[async_trait]
impl CommentSource for FixtureSource {
    async fn fetch_comments(&self, _reference: &ChangeSetRef) -> Result<Vec<Comment>, ChangeSetError> {
        Ok(Self::comments())
    }
}

#[async_trait]
impl ChangeSetSource for FixtureSource {
    async fn fetch_change_set(&self, reference: &ChangeSetRef) -> Result<ChangeSet, ChangeSetError> {
        let files = diff::parse_diff(SAMPLE_DIFF)?;
        let additions = files.iter().map(|f| f.additions).sum();
        let deletions = files.iter().map(|f| f.deletions).sum();
        let title = "Improve comparison table readability".to_string();
        let description =
            Some("Show Yes/No as emoji and right-align prices in a monospace font.".to_string());
        let diff_summary = diff::summarize(&title, description.as_deref(), &files);
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).single().unwrap_or_default();

        Ok(ChangeSet {
            reference: reference.clone(),
            title,
            description,
            labels: vec!["ui".to_string(), "enhancement".to_string()],
            files,
            additions,
            deletions,
            commits: 3,
            created_at,
            updated_at: created_at,
            comments: Self::comments(),
            diff_summary: Some(diff_summary),
        })
    }

    async fn fetch_documentation(&self, _owner: &str, _repo: &str) -> Result<Documentation, ChangeSetError> {
        Ok(docs::from_readme(Some(SAMPLE_README.to_string()), None, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::FileStatus;

    #[tokio::test]
    async fn test_fixture_change_set() {
        let cs = FixtureSource
            .fetch_change_set(&FixtureSource::reference())
            .await
            .unwrap();
        assert_eq!(cs.files.len(), 3);
        assert_eq!(cs.files[0].filename, "src/components/ComparisonTable.tsx");
        assert_eq!(cs.files[2].status, FileStatus::Added);
        assert!(cs.files[2].patch.is_none());
        assert_eq!(cs.additions, cs.files.iter().map(|f| f.additions).sum::<usize>());
        assert_eq!(cs.comments.len(), 2);
    }

    #[tokio::test]
    async fn test_fixture_documentation() {
        let docs = FixtureSource.fetch_documentation("acme", "priceboard").await.unwrap();
        assert_eq!(docs.key_features.len(), 3);
        assert!(docs.setup_instructions.unwrap().starts_with("1. npm install"));
    }
}
