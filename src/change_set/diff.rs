use super::types::{FileDiff, FileStatus};
use super::ChangeSetError;

/// A line added or removed by a patch, with its diff marker stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangedLine<'a> {
    Added(&'a str),
    Removed(&'a str),
}

/// Extract added and removed lines from one file's patch, in patch order.
/// The `+++`/`---` file header lines are not changes.
pub fn changed_lines(patch: &str) -> Vec<ChangedLine<'_>> {
    patch
        .lines()
        .filter(|line| !line.starts_with("+++") && !line.starts_with("---"))
        .filter_map(|line| {
            if let Some(rest) = line.strip_prefix('+') {
                Some(ChangedLine::Added(rest))
            } else {
                line.strip_prefix('-').map(ChangedLine::Removed)
            }
        })
        .collect()
}

/// Parse a multi-file unified diff (as produced by `git diff`) into
/// per-file diffs. Each file's patch keeps its `@@` hunk headers and hunk
/// body lines, the same shape GitHub returns per file.
///
/// New files have `--- /dev/null` or a `new file mode` line, deleted files
/// have `+++ /dev/null` or `deleted file mode`, and a `rename from` line
/// marks a rename.
pub fn parse_diff(raw_diff: &str) -> Result<Vec<FileDiff>, ChangeSetError> {
    if raw_diff.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut current: Option<PendingFile> = None;

    for line in raw_diff.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(done) = current.take() {
                files.push(done.finish());
            }
            current = Some(PendingFile::from_header(rest)?);
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            file.in_hunk = true;
            file.patch.push(line.to_string());
            continue;
        }

        if !file.in_hunk {
            if line == "--- /dev/null" || line.starts_with("new file mode") {
                file.status = FileStatus::Added;
            } else if line == "+++ /dev/null" || line.starts_with("deleted file mode") {
                file.status = FileStatus::Removed;
            } else if line.starts_with("rename from ") {
                file.status = FileStatus::Renamed;
            }
            continue;
        }

        if line.starts_with('+') {
            file.additions += 1;
        } else if line.starts_with('-') {
            file.deletions += 1;
        } else if !line.starts_with(' ') && !line.starts_with('\\') {
            continue;
        }
        file.patch.push(line.to_string());
    }

    if let Some(done) = current.take() {
        files.push(done.finish());
    }
    Ok(files)
}

struct PendingFile {
    filename: String,
    status: FileStatus,
    additions: usize,
    deletions: usize,
    patch: Vec<String>,
    in_hunk: bool,
}

impl PendingFile {
    fn from_header(rest: &str) -> Result<Self, ChangeSetError> {
        let mut parts = rest.split_whitespace();
        let a_path = parts
            .next()
            .ok_or_else(|| ChangeSetError::DiffParse("Missing a/ path in diff header".to_string()))?;
        let b_path = parts
            .next()
            .ok_or_else(|| ChangeSetError::DiffParse("Missing b/ path in diff header".to_string()))?;
        let filename = b_path
            .strip_prefix("b/")
            .or_else(|| a_path.strip_prefix("a/"))
            .unwrap_or(b_path)
            .to_string();
        Ok(Self {
            filename,
            status: FileStatus::Modified,
            additions: 0,
            deletions: 0,
            patch: Vec::new(),
            in_hunk: false,
        })
    }

    fn finish(self) -> FileDiff {
        let patch = if self.patch.is_empty() {
            None
        } else {
            Some(self.patch.join("\n"))
        };
        FileDiff::new(self.filename, self.status, self.additions, self.deletions, patch)
    }
}

/// Precompute the human-readable diff summary attached to a change set.
pub fn summarize(title: &str, description: Option<&str>, files: &[FileDiff]) -> String {
    let mut parts = vec![format!("PR Title: {}", title)];
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        parts.push(format!("Description: {}", description));
    }
    parts.push(format!("Files changed: {}", files.len()));

    for file in files {
        parts.push(format!("\n📁 {} ({})", file.filename, file.status));
        parts.push(format!("   +{} -{} lines", file.additions, file.deletions));

        let Some(patch) = file.patch.as_deref() else {
            continue;
        };
        let lines = changed_lines(patch);
        let added: Vec<&str> = lines
            .iter()
            .filter_map(|l| match l {
                ChangedLine::Added(text) => Some(*text),
                ChangedLine::Removed(_) => None,
            })
            .take(3)
            .collect();
        let removed: Vec<&str> = lines
            .iter()
            .filter_map(|l| match l {
                ChangedLine::Removed(text) => Some(*text),
                ChangedLine::Added(_) => None,
            })
            .take(3)
            .collect();
        if !added.is_empty() {
            parts.push(format!("   Added: {}", added.join(", ")));
        }
        if !removed.is_empty() {
            parts.push(format!("   Removed: {}", removed.join(", ")));
        }
    }

    parts.join("\n")
}
