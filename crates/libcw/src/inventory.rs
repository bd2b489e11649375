use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{error::Result, git, process};

/// Branch reference recorded for a worktree with no branch checked out.
pub const DETACHED: &str = "(detached)";

/// Prefix of fully-qualified local branch references.
const HEADS_PREFIX: &str = "refs/heads/";

/// One entry of `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeRecord {
    /// `refs/heads/<name>`, a bare name, or [`DETACHED`].
    pub branch_ref: String,
    /// Absolute path of the worktree.
    pub path: PathBuf,
}

impl WorktreeRecord {
    /// Branch name without the `refs/heads/` prefix.
    pub fn branch_name(&self) -> &str {
        normalize_branch_name(&self.branch_ref)
    }

    /// Whether no branch is checked out.
    pub fn is_detached(&self) -> bool {
        self.branch_ref == DETACHED
    }

    /// Final component of the worktree path.
    pub fn dir_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

/// Strip the `refs/heads/` prefix from a branch reference.
///
/// Anything else, including [`DETACHED`] and the empty string, is returned unchanged.
pub fn normalize_branch_name(branch_ref: &str) -> &str {
    branch_ref.strip_prefix(HEADS_PREFIX).unwrap_or(branch_ref)
}

/// Parse porcelain worktree listing output into records, preserving order.
pub fn parse_porcelain(output: &str) -> Vec<WorktreeRecord> {
    let mut records = Vec::new();
    let mut current_path: Option<PathBuf> = None;
    let mut current_branch: Option<String> = None;

    let mut flush = |path: &mut Option<PathBuf>, branch: &mut Option<String>| {
        if let Some(path) = path.take() {
            records.push(WorktreeRecord {
                branch_ref: branch.take().unwrap_or_else(|| DETACHED.to_string()),
                path,
            });
        }
        *branch = None;
    };

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            flush(&mut current_path, &mut current_branch);
            current_path = Some(PathBuf::from(path));
        } else if let Some(branch) = line.strip_prefix("branch ") {
            current_branch = Some(branch.to_string());
        } else if line.trim().is_empty() {
            flush(&mut current_path, &mut current_branch);
        }
    }
    flush(&mut current_path, &mut current_branch);

    records
}

/// List every worktree of the repository at `repo`, main working tree first.
pub fn list_worktrees(repo: &Path) -> Result<Vec<WorktreeRecord>> {
    let output = process::run_checked("git", &["worktree", "list", "--porcelain"], repo)?;
    Ok(parse_porcelain(&output.stdout))
}

/// Condition of a worktree, in decreasing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorktreeStatus {
    /// The directory no longer exists.
    Stale,
    /// The current directory is inside the worktree.
    Active,
    /// The worktree has uncommitted changes.
    Modified,
    /// Nothing to report.
    Clean,
}

impl WorktreeStatus {
    /// Lowercase label used in listings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stale => "stale",
            Self::Active => "active",
            Self::Modified => "modified",
            Self::Clean => "clean",
        }
    }
}

impl fmt::Display for WorktreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determine the status of the worktree at `path` as seen from `cwd`.
pub fn worktree_status(path: &Path, cwd: &Path) -> WorktreeStatus {
    if !path.exists() {
        return WorktreeStatus::Stale;
    }

    let canonical_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let canonical_cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
    if canonical_cwd.starts_with(&canonical_path) {
        return WorktreeStatus::Active;
    }

    match git::has_uncommitted_changes(path) {
        Ok(true) => WorktreeStatus::Modified,
        _ => WorktreeStatus::Clean,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    const LISTING: &str = "worktree /src/app\nHEAD 1111111111111111111111111111111111111111\nbranch refs/heads/main\n\nworktree /src/app-feature\nHEAD 2222222222222222222222222222222222222222\nbranch refs/heads/feature/x\n\nworktree /src/app-detached\nHEAD 3333333333333333333333333333333333333333\ndetached\n";

    #[test]
    fn porcelain_parsing_preserves_order_and_detached_entries() {
        let records = parse_porcelain(LISTING);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].path, PathBuf::from("/src/app"));
        assert_eq!(records[0].branch_ref, "refs/heads/main");
        assert_eq!(records[1].branch_name(), "feature/x");
        assert_eq!(records[1].dir_name(), Some("app-feature"));
        assert!(records[2].is_detached());
        assert_eq!(records[2].branch_ref, DETACHED);
    }

    #[test]
    fn last_block_without_trailing_blank_line_is_captured() {
        let listing = "worktree /a\nbranch refs/heads/main\n\nworktree /b\nbranch refs/heads/topic";
        let records = parse_porcelain(listing);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].path, PathBuf::from("/b"));
        assert_eq!(records[1].branch_ref, "refs/heads/topic");
    }

    #[test]
    fn branch_does_not_leak_into_following_block() {
        let listing = "worktree /a\nbranch refs/heads/main\nworktree /b\n";
        let records = parse_porcelain(listing);
        assert_eq!(records[0].branch_ref, "refs/heads/main");
        assert_eq!(records[1].branch_ref, DETACHED);
    }

    #[test]
    fn normalization_strips_only_the_heads_prefix() {
        assert_eq!(normalize_branch_name("refs/heads/foo/bar"), "foo/bar");
        assert_eq!(normalize_branch_name("foo"), "foo");
        assert_eq!(normalize_branch_name(DETACHED), DETACHED);
        assert_eq!(normalize_branch_name(""), "");
        assert_eq!(normalize_branch_name("refs/remotes/origin/x"), "refs/remotes/origin/x");
    }

    #[test]
    fn missing_directory_is_stale_regardless_of_cwd() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("gone");
        assert_eq!(worktree_status(&missing, &missing), WorktreeStatus::Stale);
        assert_eq!(worktree_status(&missing, tmp.path()), WorktreeStatus::Stale);
    }

    #[test]
    fn status_reports_active_modified_and_clean() {
        let tmp = tempdir().unwrap();
        let repo = tmp.path().join("repo");
        fs::create_dir(&repo).unwrap();
        for args in [
            vec!["init", "-b", "main"],
            vec!["config", "user.email", "test@example.com"],
            vec!["config", "user.name", "Test User"],
        ] {
            process::run_checked("git", &args, &repo).unwrap();
        }
        fs::write(repo.join("README.md"), "# repo").unwrap();
        process::run_checked("git", &["add", "README.md"], &repo).unwrap();
        process::run_checked("git", &["commit", "-m", "init"], &repo).unwrap();

        let nested = repo.join("src");
        fs::create_dir(&nested).unwrap();
        assert_eq!(worktree_status(&repo, &nested), WorktreeStatus::Active);
        assert_eq!(worktree_status(&repo, tmp.path()), WorktreeStatus::Clean);

        fs::write(nested.join("lib.rs"), "").unwrap();
        assert_eq!(worktree_status(&repo, tmp.path()), WorktreeStatus::Modified);

        let records = list_worktrees(&repo).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].branch_name(), "main");
    }

    #[test]
    fn status_of_non_repository_directory_is_clean() {
        let tmp = tempdir().unwrap();
        let plain = tmp.path().join("plain");
        fs::create_dir(&plain).unwrap();
        assert_eq!(worktree_status(&plain, tmp.path()), WorktreeStatus::Clean);
    }
}
