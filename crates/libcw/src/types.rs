use std::path::PathBuf;

use crate::{inventory::WorktreeStatus, metadata::MetadataSource};

/// A worktree about to be created by `new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorktreePlan {
    /// Branch created for the worktree.
    pub branch: String,
    /// Branch the new branch starts from.
    pub base_branch: String,
    /// Directory of the new worktree.
    pub path: PathBuf,
    /// Main repository the worktree belongs to.
    pub repo_root: PathBuf,
}

/// Result of creating a worktree.
#[derive(Debug, Clone)]
pub struct CreatedWorktree {
    /// Directory of the new worktree.
    pub path: PathBuf,
    /// Whether fetching from the remotes succeeded beforehand.
    pub fetched: bool,
    /// Registration failure, reported as a warning.
    pub registry_error: Option<String>,
}

/// Everything `finish` needs to integrate a feature branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishPlan {
    /// Feature branch being finished.
    pub feature_branch: String,
    /// Worktree holding the feature branch.
    pub feature_path: PathBuf,
    /// Branch the feature branch is merged into.
    pub base_branch: String,
    /// Working tree where the base branch is checked out.
    pub base_path: PathBuf,
    /// Whether the base metadata was inferred.
    pub metadata_source: MetadataSource,
    /// Whether the base branch is pushed after merging.
    pub push: bool,
}

impl FinishPlan {
    /// Ordered description of every step, as shown by a dry run.
    pub fn steps(&self) -> Vec<String> {
        let mut steps = vec![
            "Fetch updates from remote".to_string(),
            format!("Rebase {} onto {}", self.feature_branch, self.base_branch),
            format!("Switch to {} in base repository", self.base_branch),
            format!(
                "Merge {} into {} (fast-forward)",
                self.feature_branch, self.base_branch
            ),
        ];
        if self.push {
            steps.push(format!("Push {} to origin", self.base_branch));
        }
        steps.push(format!("Remove worktree at {}", self.feature_path.display()));
        steps.push(format!("Delete local branch {}", self.feature_branch));
        steps.push("Clean up metadata".to_string());
        steps
    }
}

/// Outcome of rebasing a feature branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// The branch now sits on top of `onto`.
    Rebased {
        /// Revision rebased onto.
        onto: String,
    },
    /// The rebase stopped and is still in progress.
    Stopped {
        /// Revision rebased onto.
        onto: String,
        /// Files with unresolved conflicts.
        conflicted_files: Vec<String>,
    },
}

/// A linked worktree with a branch checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureWorktree {
    /// Checked-out branch.
    pub branch: String,
    /// Worktree path.
    pub path: PathBuf,
    /// Current status.
    pub status: WorktreeStatus,
}

/// Everything `change-base` needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBasePlan {
    /// Feature branch being moved.
    pub feature_branch: String,
    /// Worktree holding the feature branch.
    pub worktree_path: PathBuf,
    /// Repository whose config holds the metadata.
    pub repo_root: PathBuf,
    /// Base branch currently recorded.
    pub current_base: String,
    /// Base branch to move to.
    pub new_base: String,
}

impl ChangeBasePlan {
    /// Ordered description of every step, as shown by a dry run.
    pub fn steps(&self) -> Vec<String> {
        vec![
            "Fetch updates from remote".to_string(),
            format!("Rebase {} onto {}", self.feature_branch, self.new_base),
            format!(
                "Update base branch metadata: {} → {}",
                self.current_base, self.new_base
            ),
        ]
    }
}

/// A worktree about to be deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    /// Worktree path.
    pub worktree_path: PathBuf,
    /// Branch checked out there, `None` when detached.
    pub branch: Option<String>,
    /// Main repository the worktree belongs to.
    pub repo_root: PathBuf,
}

/// Options for deleting a worktree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Keep the local branch and its metadata.
    pub keep_branch: bool,
    /// Also delete the branch on `origin`.
    pub delete_remote: bool,
    /// Remove the worktree even with uncommitted changes.
    pub force: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            keep_branch: false,
            delete_remote: false,
            force: true,
        }
    }
}

/// What happened to the remote branch during a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteDeletion {
    /// Remote deletion was not requested or no branch was deleted.
    Skipped,
    /// `origin/<branch>` was deleted.
    Deleted,
    /// The push failed; the message is reported as a warning.
    Failed(String),
}

/// Result of deleting a worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    /// Local branch deleted along with its metadata.
    pub branch_deleted: Option<String>,
    /// Remote branch outcome.
    pub remote: RemoteDeletion,
}

/// Criteria for `clean`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanCriteria {
    /// Branches merged into their base.
    pub merged: bool,
    /// Worktrees whose directory is missing.
    pub stale: bool,
    /// Worktrees not modified for more than this many days.
    pub older_than_days: Option<u64>,
}

impl CleanCriteria {
    /// Whether any criterion is set.
    pub fn is_empty(&self) -> bool {
        !self.merged && !self.stale && self.older_than_days.is_none()
    }
}

/// A worktree selected for cleanup and the reasons why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanCandidate {
    /// The worktree.
    pub worktree: FeatureWorktree,
    /// Human-readable reasons.
    pub reasons: Vec<String>,
}

/// One row of `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeEntry {
    /// Normalized branch name, or `(detached)`.
    pub branch: String,
    /// Worktree path.
    pub path: PathBuf,
    /// Path relative to the repository root.
    pub relative_path: String,
    /// Current status.
    pub status: WorktreeStatus,
}

/// Worktrees of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeListing {
    /// Repository root.
    pub repo_root: PathBuf,
    /// Every worktree in listing order, main working tree first.
    pub entries: Vec<WorktreeEntry>,
}

/// Metadata of the worktree containing the current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentWorktree {
    /// Checked-out branch.
    pub feature_branch: String,
    /// Stored base branch.
    pub base_branch: Option<String>,
    /// Stored base path.
    pub base_path: Option<PathBuf>,
}

/// One feature worktree in the global listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalWorktree {
    /// Registered repository name.
    pub repo_name: String,
    /// Intended branch, or the checked-out branch when none is recorded.
    pub worktree_id: String,
    /// Checked-out branch.
    pub branch: String,
    /// Current status.
    pub status: WorktreeStatus,
    /// Age of the worktree directory, e.g. `3d ago`.
    pub age: Option<String>,
    /// Path relative to the repository root.
    pub relative_path: String,
}

impl GlobalWorktree {
    /// The checked-out branch differs from the one the worktree was created for.
    pub fn is_mismatched(&self) -> bool {
        self.worktree_id != self.branch
    }
}

/// A registered repository that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableRepo {
    /// Registered name.
    pub name: String,
    /// Registered path.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Worktrees across every registered repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalListing {
    /// Registry entries removed before listing.
    pub pruned: Vec<PathBuf>,
    /// Number of registered repositories.
    pub registered: usize,
    /// Repositories that could not be read.
    pub unreadable: Vec<UnreadableRepo>,
    /// Feature worktrees, grouped by repository name.
    pub worktrees: Vec<GlobalWorktree>,
}

impl GlobalListing {
    /// Number of repositories contributing at least one worktree.
    pub fn repo_count(&self) -> usize {
        let mut names: Vec<&str> = self.worktrees.iter().map(|w| w.repo_name.as_str()).collect();
        names.dedup();
        names.len()
    }

    /// Number of worktrees with `status`.
    pub fn count_status(&self, status: WorktreeStatus) -> usize {
        self.worktrees.iter().filter(|w| w.status == status).count()
    }
}

/// One branch of `tree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Checked-out branch.
    pub branch: String,
    /// Path relative to the repository root.
    pub relative_path: String,
    /// Current status; [`WorktreeStatus::Active`] marks the current worktree.
    pub status: WorktreeStatus,
}

/// Feature worktrees hanging off the main repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeTree {
    /// Main repository.
    pub repo_root: PathBuf,
    /// Feature worktrees sorted by branch.
    pub nodes: Vec<TreeNode>,
}

/// Per-worktree figures gathered by `stats`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorktreeStat {
    /// Checked-out branch.
    pub branch: String,
    /// Current status.
    pub status: WorktreeStatus,
    /// Days since the directory was modified; `None` when it is missing.
    pub age_days: Option<f64>,
    /// Commits on the branch that are not on its base.
    pub commits: u32,
}

/// Usage figures across the feature worktrees of a repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorktreeStats {
    /// One entry per feature worktree.
    pub worktrees: Vec<WorktreeStat>,
}

impl WorktreeStats {
    /// Number of worktrees with `status`.
    pub fn count_status(&self, status: WorktreeStatus) -> usize {
        self.worktrees.iter().filter(|w| w.status == status).count()
    }

    /// Known ages.
    fn ages(&self) -> impl Iterator<Item = f64> + '_ {
        self.worktrees.iter().filter_map(|w| w.age_days)
    }

    /// Average, oldest and newest age in days.
    pub fn age_summary(&self) -> Option<(f64, f64, f64)> {
        let count = self.ages().count();
        if count == 0 {
            return None;
        }
        let average = self.ages().sum::<f64>() / count as f64;
        let oldest = self.ages().fold(f64::MIN, f64::max);
        let newest = self.ages().fold(f64::MAX, f64::min);
        Some((average, oldest, newest))
    }

    /// Total, average and largest commit count over worktrees with commits.
    pub fn commit_summary(&self) -> Option<(u32, f64, u32)> {
        let commits: Vec<u32> = self
            .worktrees
            .iter()
            .map(|w| w.commits)
            .filter(|&c| c > 0)
            .collect();
        let max = commits.iter().copied().max()?;
        let total: u32 = commits.iter().sum();
        Some((total, f64::from(total) / commits.len() as f64, max))
    }

    /// Up to `limit` worktrees, oldest first.
    pub fn oldest(&self, limit: usize) -> Vec<&WorktreeStat> {
        let mut sorted: Vec<&WorktreeStat> =
            self.worktrees.iter().filter(|w| w.age_days.is_some()).collect();
        sorted.sort_by(|a, b| {
            let age = |w: &WorktreeStat| w.age_days.unwrap_or_default();
            age(*b).total_cmp(&age(*a))
        });
        sorted.truncate(limit);
        sorted
    }

    /// Up to `limit` worktrees with commits, most commits first.
    pub fn most_active(&self, limit: usize) -> Vec<&WorktreeStat> {
        let mut sorted: Vec<&WorktreeStat> =
            self.worktrees.iter().filter(|w| w.commits > 0).collect();
        sorted.sort_by(|a, b| b.commits.cmp(&a.commits));
        sorted.truncate(limit);
        sorted
    }
}

/// A feature branch behind its base on `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehindWorktree {
    /// Feature branch.
    pub branch: String,
    /// Base branch.
    pub base_branch: String,
    /// Commits on `origin/<base>` missing from the feature branch.
    pub commits: u32,
}

/// Health report produced by `doctor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    /// Git version found, if it could be determined.
    pub git_version: Option<(u32, u32, u32)>,
    /// Feature worktrees inspected.
    pub worktree_count: usize,
    /// Branches whose worktree directory is missing.
    pub stale: Vec<String>,
    /// Branches with uncommitted changes.
    pub uncommitted: Vec<String>,
    /// Branches behind their base.
    pub behind: Vec<BehindWorktree>,
    /// Branches with unresolved conflicts and how many files are affected.
    pub conflicted: Vec<(String, usize)>,
}

impl DoctorReport {
    /// Minimum supported git version.
    pub const MIN_GIT_VERSION: (u32, u32, u32) = (2, 31, 0);

    /// Whether the detected git version is recent enough.
    pub fn git_version_ok(&self) -> bool {
        self.git_version
            .is_some_and(|version| version >= Self::MIN_GIT_VERSION)
    }

    /// Number of failed checks.
    pub fn issue_count(&self) -> usize {
        usize::from(!self.git_version_ok())
            + self.stale.len()
            + usize::from(!self.conflicted.is_empty())
    }

    /// Number of checks with warnings.
    pub fn warning_count(&self) -> usize {
        usize::from(!self.uncommitted.is_empty()) + usize::from(!self.behind.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish_plan(push: bool) -> FinishPlan {
        FinishPlan {
            feature_branch: "fix-auth".to_string(),
            feature_path: PathBuf::from("/src/app-fix-auth"),
            base_branch: "main".to_string(),
            base_path: PathBuf::from("/src/app"),
            metadata_source: MetadataSource::Configured,
            push,
        }
    }

    #[test]
    fn finish_steps_include_push_only_when_requested() {
        let steps = finish_plan(false).steps();
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[1], "Rebase fix-auth onto main");
        assert_eq!(steps[4], "Remove worktree at /src/app-fix-auth");

        let steps = finish_plan(true).steps();
        assert_eq!(steps.len(), 8);
        assert_eq!(steps[4], "Push main to origin");
    }

    #[test]
    fn doctor_counts_issues_and_warnings() {
        let mut report = DoctorReport {
            git_version: Some((2, 30, 9)),
            worktree_count: 3,
            stale: vec!["gone".to_string()],
            uncommitted: vec!["dirty".to_string()],
            behind: Vec::new(),
            conflicted: Vec::new(),
        };
        assert!(!report.git_version_ok());
        assert_eq!(report.issue_count(), 2);
        assert_eq!(report.warning_count(), 1);

        report.git_version = Some((2, 31, 0));
        report.stale.clear();
        assert_eq!(report.issue_count(), 0);
    }

    #[test]
    fn clean_criteria_emptiness() {
        assert!(CleanCriteria::default().is_empty());
        let criteria = CleanCriteria {
            older_than_days: Some(0),
            ..CleanCriteria::default()
        };
        assert!(!criteria.is_empty());
    }

    fn stat(branch: &str, age_days: Option<f64>, commits: u32) -> WorktreeStat {
        WorktreeStat {
            branch: branch.to_string(),
            status: WorktreeStatus::Clean,
            age_days,
            commits,
        }
    }

    #[test]
    fn stats_summaries_skip_missing_values() {
        let stats = WorktreeStats {
            worktrees: vec![
                stat("a", Some(2.0), 4),
                stat("b", Some(10.0), 0),
                stat("c", None, 2),
                stat("d", Some(0.5), 6),
            ],
        };

        let (average, oldest, newest) = stats.age_summary().unwrap();
        assert!((average - 12.5 / 3.0).abs() < 1e-9);
        assert_eq!(oldest, 10.0);
        assert_eq!(newest, 0.5);

        let (total, average, max) = stats.commit_summary().unwrap();
        assert_eq!(total, 12);
        assert!((average - 4.0).abs() < 1e-9);
        assert_eq!(max, 6);

        let oldest: Vec<&str> = stats.oldest(2).iter().map(|w| w.branch.as_str()).collect();
        assert_eq!(oldest, vec!["b", "a"]);
        let active: Vec<&str> = stats.most_active(5).iter().map(|w| w.branch.as_str()).collect();
        assert_eq!(active, vec!["d", "a", "c"]);

        assert_eq!(WorktreeStats::default().age_summary(), None);
        assert_eq!(WorktreeStats::default().commit_summary(), None);
    }
}
