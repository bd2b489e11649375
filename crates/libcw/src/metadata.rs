use std::path::{Path, PathBuf};

use log::debug;

use crate::{
    error::{CwError, Result},
    git, inventory,
};

/// Default branch names tried, in order, when inferring a base branch.
const DEFAULT_BASE_CANDIDATES: [&str; 3] = ["main", "master", "develop"];

/// Config key holding the branch a feature branch was created from.
pub fn base_branch_key(branch: &str) -> String {
    format!("branch.{branch}.worktreeBase")
}

/// Config key holding the main repository path of a feature branch.
pub fn base_path_key(branch: &str) -> String {
    format!("worktree.{branch}.basePath")
}

/// Config key holding the branch a worktree was created for.
pub fn intended_branch_key(branch: &str) -> String {
    format!("worktree.{branch}.intendedBranch")
}

/// Where a piece of worktree metadata came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    /// Read from the repository config.
    Configured,
    /// Derived from the worktree listing because config keys were absent.
    Inferred,
}

/// Base branch and base repository of a feature branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeMetadata {
    /// Branch the feature branch integrates into.
    pub base_branch: String,
    /// Main repository the feature branch was created from.
    pub base_path: PathBuf,
    /// Whether the values were stored or inferred.
    pub source: MetadataSource,
}

/// Per-repository metadata held in the local git config.
pub struct MetadataStore {
    /// Any working tree of the repository; local config is shared between worktrees.
    repo: PathBuf,
}

impl MetadataStore {
    /// Create a store backed by the config of the repository at `repo`.
    pub fn new(repo: &Path) -> Self {
        Self {
            repo: repo.to_path_buf(),
        }
    }

    /// Read a raw key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        git::config_get(&self.repo, key)
    }

    /// Write a raw key.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        git::config_set(&self.repo, key, value)
    }

    /// Remove a raw key. Removing an absent key succeeds.
    pub fn unset(&self, key: &str) -> Result<()> {
        git::config_unset(&self.repo, key)
    }

    /// Stored base branch of `branch`.
    pub fn base_branch(&self, branch: &str) -> Result<Option<String>> {
        self.get(&base_branch_key(branch))
    }

    /// Stored base repository path of `branch`.
    pub fn base_path(&self, branch: &str) -> Result<Option<PathBuf>> {
        Ok(self.get(&base_path_key(branch))?.map(PathBuf::from))
    }

    /// Branch the worktree now on `branch` was originally created for.
    pub fn intended_branch(&self, branch: &str) -> Result<Option<String>> {
        self.get(&intended_branch_key(branch))
    }

    /// Record every fact written when a worktree is created.
    pub fn record(&self, branch: &str, base_branch: &str, base_path: &Path) -> Result<()> {
        self.set(&base_branch_key(branch), base_branch)?;
        self.set(&base_path_key(branch), &base_path.to_string_lossy())?;
        self.set(&intended_branch_key(branch), branch)?;
        Ok(())
    }

    /// Update only the base branch of `branch`.
    pub fn set_base_branch(&self, branch: &str, base_branch: &str) -> Result<()> {
        self.set(&base_branch_key(branch), base_branch)
    }

    /// Remove every fact recorded for `branch`.
    pub fn remove(&self, branch: &str) -> Result<()> {
        self.unset(&base_branch_key(branch))?;
        self.unset(&base_path_key(branch))?;
        self.unset(&intended_branch_key(branch))?;
        Ok(())
    }

    /// Base branch and base path of `branch`, inferring them when not stored.
    ///
    /// Inference takes the first worktree in the listing as the base path and
    /// the first existing of `main`, `master` and `develop` as the base branch,
    /// falling back to the branch checked out in the main repository.
    pub fn worktree_metadata(&self, branch: &str) -> Result<WorktreeMetadata> {
        if let (Some(base_branch), Some(base_path)) =
            (self.base_branch(branch)?, self.base_path(branch)?)
        {
            return Ok(WorktreeMetadata {
                base_branch,
                base_path,
                source: MetadataSource::Configured,
            });
        }

        debug!("metadata missing for {branch}, inferring");
        let records = inventory::list_worktrees(&self.repo).unwrap_or_default();
        let Some(main) = records.first() else {
            return Err(CwError::MetadataMissing {
                branch: branch.to_string(),
                message: "cannot infer base repository path; create worktrees with 'cw new'"
                    .to_string(),
            });
        };

        let mut base_branch = None;
        for candidate in DEFAULT_BASE_CANDIDATES {
            if git::rev_exists(&main.path, candidate).unwrap_or(false) {
                base_branch = Some(candidate.to_string());
                break;
            }
        }
        if base_branch.is_none() && !main.is_detached() {
            base_branch = Some(main.branch_name().to_string());
        }

        let Some(base_branch) = base_branch else {
            return Err(CwError::MetadataMissing {
                branch: branch.to_string(),
                message: "cannot infer base branch; specify it manually or use 'cw new'"
                    .to_string(),
            });
        };

        Ok(WorktreeMetadata {
            base_branch,
            base_path: main.path.clone(),
            source: MetadataSource::Inferred,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::process;

    fn run_git(repo: &Path, args: &[&str]) {
        process::run_checked("git", args, repo).unwrap();
    }

    fn init_repo(branch: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        fs::create_dir(&repo).unwrap();
        run_git(&repo, &["init", "-b", branch]);
        run_git(&repo, &["config", "user.email", "test@example.com"]);
        run_git(&repo, &["config", "user.name", "Test User"]);
        fs::write(repo.join("README.md"), "# repo").unwrap();
        run_git(&repo, &["add", "README.md"]);
        run_git(&repo, &["commit", "-m", "init"]);
        (tmp, repo)
    }

    #[test]
    fn record_then_remove_round_trip() {
        let (_tmp, repo) = init_repo("main");
        let store = MetadataStore::new(&repo);

        store.record("feature", "main", &repo).unwrap();
        assert_eq!(store.base_branch("feature").unwrap().as_deref(), Some("main"));
        assert_eq!(store.base_path("feature").unwrap(), Some(repo.clone()));
        assert_eq!(
            store.intended_branch("feature").unwrap().as_deref(),
            Some("feature")
        );

        let metadata = store.worktree_metadata("feature").unwrap();
        assert_eq!(metadata.source, MetadataSource::Configured);
        assert_eq!(metadata.base_branch, "main");

        store.remove("feature").unwrap();
        store.remove("feature").unwrap();
        assert_eq!(store.base_branch("feature").unwrap(), None);
        assert_eq!(store.intended_branch("feature").unwrap(), None);
    }

    #[test]
    fn keys_follow_git_config_layout() {
        assert_eq!(base_branch_key("fix/auth"), "branch.fix/auth.worktreeBase");
        assert_eq!(base_path_key("fix/auth"), "worktree.fix/auth.basePath");
        assert_eq!(
            intended_branch_key("fix/auth"),
            "worktree.fix/auth.intendedBranch"
        );
    }

    #[test]
    fn inference_prefers_default_branch_names() {
        let (tmp, repo) = init_repo("main");
        run_git(&repo, &["branch", "develop"]);
        let worktree = tmp.path().join("repo-manual");
        run_git(
            &repo,
            &["worktree", "add", "-b", "manual", worktree.to_str().unwrap()],
        );

        let metadata = MetadataStore::new(&worktree)
            .worktree_metadata("manual")
            .unwrap();
        assert_eq!(metadata.source, MetadataSource::Inferred);
        assert_eq!(metadata.base_branch, "main");
        assert_eq!(
            metadata.base_path.canonicalize().unwrap(),
            repo.canonicalize().unwrap()
        );
    }

    #[test]
    fn inference_falls_back_to_develop() {
        let (_tmp, repo) = init_repo("develop");
        let metadata = MetadataStore::new(&repo)
            .worktree_metadata("anything")
            .unwrap();
        assert_eq!(metadata.base_branch, "develop");
        assert_eq!(
            metadata.base_path.canonicalize().unwrap(),
            repo.canonicalize().unwrap()
        );
    }

    #[test]
    fn inference_falls_back_to_main_worktree_branch() {
        let (_tmp, repo) = init_repo("trunk");
        let metadata = MetadataStore::new(&repo)
            .worktree_metadata("anything")
            .unwrap();
        assert_eq!(metadata.base_branch, "trunk");
        assert_eq!(metadata.source, MetadataSource::Inferred);
    }

    #[test]
    fn inference_fails_on_detached_main_without_default_branches() {
        let (_tmp, repo) = init_repo("trunk");
        run_git(&repo, &["checkout", "--detach"]);
        let err = MetadataStore::new(&repo)
            .worktree_metadata("feature")
            .unwrap_err();
        assert!(matches!(err, CwError::MetadataMissing { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
