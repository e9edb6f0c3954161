use chrono::{DateTime, Utc};
use std::fmt;

/// How a file was touched by the change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
}

impl FileStatus {
    /// Map a GitHub file status string. GitHub also reports `copied`,
    /// `changed` and `unchanged`, which all read as modifications here.
    pub fn from_github(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "removed" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Renamed => write!(f, "renamed"),
        }
    }
}

/// A single file within the change set, with its unified-diff patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// File path (e.g., "src/components/Table.tsx")
    pub filename: String,
    /// Lines added in this file
    pub additions: usize,
    /// Lines deleted in this file
    pub deletions: usize,
    /// additions + deletions
    pub changes: usize,
    pub status: FileStatus,
    /// Raw patch text. Absent for binary or oversized files.
    pub patch: Option<String>,
}

impl FileDiff {
    pub fn new(
        filename: impl Into<String>,
        status: FileStatus,
        additions: usize,
        deletions: usize,
        patch: Option<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            additions,
            deletions,
            changes: additions + deletions,
            status,
            patch,
        }
    }
}

/// A comment left on the change set's conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Identity of a change set on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl ChangeSetRef {
    /// Canonical browser URL of the pull request.
    pub fn html_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/pull/{}",
            self.owner, self.repo, self.number
        )
    }
}

impl fmt::Display for ChangeSetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Canonical in-memory representation of a pull request.
///
/// `additions`/`deletions` are the upstream totals. They normally equal the
/// sums over `files`, but the upstream value wins when the file listing was
/// truncated.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub reference: ChangeSetRef,
    pub title: String,
    pub description: Option<String>,
    pub labels: Vec<String>,
    pub files: Vec<FileDiff>,
    pub additions: usize,
    pub deletions: usize,
    pub commits: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments: Vec<Comment>,
    pub diff_summary: Option<String>,
}

impl ChangeSet {
    pub fn lines_changed(&self) -> usize {
        self.additions + self.deletions
    }

    pub fn files_changed(&self) -> usize {
        self.files.len()
    }

    pub fn url(&self) -> String {
        self.reference.html_url()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.filename.as_str())
    }
}

/// Repository documentation relevant to testers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    pub readme: Option<String>,
    pub setup_instructions: Option<String>,
    pub api_documentation: Option<String>,
    pub key_features: Vec<String>,
    pub testing_guidelines: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_diff_changes_is_sum() {
        let diff = FileDiff::new("a.rs", FileStatus::Modified, 7, 3, None);
        assert_eq!(diff.changes, 10);
    }

    #[test]
    fn test_status_from_github() {
        assert_eq!(FileStatus::from_github("added"), FileStatus::Added);
        assert_eq!(FileStatus::from_github("removed"), FileStatus::Removed);
        assert_eq!(FileStatus::from_github("renamed"), FileStatus::Renamed);
        assert_eq!(FileStatus::from_github("copied"), FileStatus::Modified);
        assert_eq!(FileStatus::Renamed.to_string(), "renamed");
    }

    #[test]
    fn test_reference_display_and_url() {
        let reference = ChangeSetRef {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            number: 42,
        };
        assert_eq!(reference.to_string(), "org/repo#42");
        assert_eq!(reference.html_url(), "https://github.com/org/repo/pull/42");
    }
}
