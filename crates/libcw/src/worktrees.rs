use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::{
    config::Config,
    error::{CwError, Result},
    git::{self, DiffFormat},
    inventory::{self, WorktreeStatus},
    launcher::{self, LaunchMode, LaunchOutcome},
    metadata::{MetadataStore, WorktreeMetadata},
    registry::{self, Registry},
    resolve::{self, Chooser, LookupMode, ResolutionMatch, TargetResolver},
    types::{
        BehindWorktree, ChangeBasePlan, CleanCandidate, CleanCriteria, CreatedWorktree,
        CurrentWorktree, DeleteOptions, DeletePlan, DeleteReport, DoctorReport, FeatureWorktree,
        FinishPlan, GlobalListing, GlobalWorktree, NewWorktreePlan, RebaseOutcome,
        RemoteDeletion, TreeNode, UnreadableRepo, WorktreeEntry, WorktreeListing, WorktreeStat,
        WorktreeStats, WorktreeTree,
    },
};

/// Default location of a new worktree: a sibling of the repository named
/// `<repo>-<branch>`, with `/` in the branch replaced by `-`.
pub fn default_worktree_path(repo_root: &Path, branch: &str) -> PathBuf {
    let repo_name = repo_root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir_name = format!("{repo_name}-{}", branch.replace('/', "-"));
    match repo_root.parent() {
        Some(parent) => parent.join(dir_name),
        None => PathBuf::from(dir_name),
    }
}

/// Render an age in days the way listings show it.
pub fn format_age(days: f64) -> String {
    if days < 1.0 {
        let hours = (days * 24.0) as u64;
        if hours > 0 {
            format!("{hours}h ago")
        } else {
            "just now".to_string()
        }
    } else if days < 7.0 {
        format!("{}d ago", days as u64)
    } else if days < 30.0 {
        format!("{}w ago", (days / 7.0) as u64)
    } else if days < 365.0 {
        format!("{}mo ago", (days / 30.0) as u64)
    } else {
        format!("{}y ago", (days / 365.0) as u64)
    }
}

/// Days since `path` was last modified.
fn age_days(path: &Path) -> Option<f64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let modified: DateTime<Utc> = modified.into();
    let seconds = (Utc::now() - modified).num_seconds().max(0);
    Some(seconds as f64 / 86_400.0)
}

/// Path of `path` relative to `base`, falling back to `path` itself.
fn relative_path(path: &Path, base: &Path) -> String {
    pathdiff::diff_paths(path, base)
        .map(|relative| {
            if relative.as_os_str().is_empty() {
                ".".to_string()
            } else {
                relative.display().to_string()
            }
        })
        .unwrap_or_else(|| path.display().to_string())
}

/// Manager for the worktree workflow of the repository containing a
/// working directory.
///
/// `Worktrees` sequences git invocations, metadata and registry updates into
/// the operations exposed by the CLI. Operations that need user interaction
/// are split into a plan and one or more execution steps, so the caller can
/// confirm, prompt or render progress between them.
pub struct Worktrees {
    /// Directory operations start from.
    cwd: PathBuf,
    /// Effective configuration.
    config: Config,
    /// Directory holding the config file and registry.
    config_dir: PathBuf,
    /// Cross-repository registry.
    registry: Registry,
}

impl Worktrees {
    /// Create a manager working from `cwd` with registry in `config_dir`.
    pub fn new(cwd: PathBuf, config_dir: &Path, config: Config) -> Self {
        Self {
            cwd,
            config,
            config_dir: config_dir.to_path_buf(),
            registry: Registry::new(config_dir),
        }
    }

    /// Directory operations start from.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory holding the config file and registry.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The repository registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Main working tree of the repository containing the working directory.
    pub fn main_repo(&self) -> Result<PathBuf> {
        git::main_repo_root(&self.cwd)
    }

    /// A resolver bound to this manager's directory and registry.
    pub fn resolver<'a>(
        &'a self,
        interactive: bool,
        chooser: &'a dyn Chooser,
    ) -> TargetResolver<'a> {
        TargetResolver::new(&self.cwd, interactive, chooser).with_registry(&self.registry)
    }

    /// Launch the configured AI tool in `path`.
    pub fn launch(&self, path: &Path, mode: LaunchMode) -> Result<LaunchOutcome> {
        launcher::launch(&self.config.ai_tool, path, mode)
    }

    /// Validate the inputs of `new` and work out where the worktree goes.
    pub fn plan_new(
        &self,
        branch: &str,
        base: Option<&str>,
        path: Option<&Path>,
    ) -> Result<NewWorktreePlan> {
        let repo_root = git::repo_root(&self.cwd)?;

        if !git::is_valid_branch_name(&repo_root, branch)? {
            return Err(CwError::invalid_branch(format!(
                "Invalid branch name: '{branch}'\nHint: Use alphanumeric characters, hyphens, and slashes. Avoid special characters like emojis, backslashes, or control characters."
            )));
        }

        let base_branch = match base.or(self.config.git.default_base_branch.as_deref()) {
            Some(base) => base.to_string(),
            None => git::current_branch(&repo_root).map_err(|_| {
                CwError::invalid_branch(
                    "Cannot determine base branch. Specify with --base or checkout a branch first.",
                )
            })?,
        };
        if !git::rev_exists(&repo_root, &base_branch)? {
            return Err(CwError::invalid_branch(format!(
                "Base branch '{base_branch}' not found"
            )));
        }

        let path = match path {
            Some(path) => self.cwd.join(path),
            None => default_worktree_path(&repo_root, branch),
        };

        Ok(NewWorktreePlan {
            branch: branch.to_string(),
            base_branch,
            path,
            repo_root,
        })
    }

    /// Create the worktree described by `plan`, record its metadata and
    /// register the repository.
    pub fn create(&self, plan: &NewWorktreePlan) -> Result<CreatedWorktree> {
        if let Some(parent) = plan.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let fetched = git::fetch_all(&plan.repo_root)?;
        if !fetched {
            debug!("fetch failed in {}", plan.repo_root.display());
        }

        git::create_worktree(&plan.repo_root, &plan.path, &plan.branch, &plan.base_branch)?;
        MetadataStore::new(&plan.repo_root).record(
            &plan.branch,
            &plan.base_branch,
            &plan.repo_root,
        )?;

        let registry_error = git::main_repo_root(&plan.repo_root)
            .and_then(|main| self.registry.register(&main))
            .err()
            .map(|err| err.to_string());

        Ok(CreatedWorktree {
            path: plan.path.clone(),
            fetched,
            registry_error,
        })
    }

    /// Gather what `finish` needs for the resolved worktree.
    pub fn finish_plan(&self, target: &ResolutionMatch, push: bool) -> Result<FinishPlan> {
        let main = git::main_repo_root(&target.repository_root)?;
        if resolve::same_path(&target.worktree_path, &main) {
            return Err(CwError::OperationError(
                "Cannot finish the main repository worktree; run finish from a feature worktree"
                    .to_string(),
            ));
        }

        let metadata =
            MetadataStore::new(&target.repository_root).worktree_metadata(&target.branch_name)?;
        if metadata.base_branch == target.branch_name {
            return Err(CwError::invalid_branch(format!(
                "'{}' is its own base branch",
                target.branch_name
            )));
        }

        Ok(FinishPlan {
            feature_branch: target.branch_name.clone(),
            feature_path: target.worktree_path.clone(),
            base_branch: metadata.base_branch,
            base_path: metadata.base_path,
            metadata_source: metadata.source,
            push,
        })
    }

    /// Fetch every remote of `repo`. Returns whether the fetch succeeded.
    pub fn fetch(&self, repo: &Path) -> Result<bool> {
        git::fetch_all(repo)
    }

    /// Revision to rebase onto: `origin/<base>` when it exists after a
    /// successful fetch, otherwise `base`.
    pub fn rebase_target(&self, worktree: &Path, base: &str, fetched: bool) -> Result<String> {
        if fetched && git::has_remote_branch(worktree, base)? {
            return Ok(format!("origin/{base}"));
        }
        Ok(base.to_string())
    }

    /// Rebase the branch checked out at `worktree` onto `onto`.
    ///
    /// A stopped rebase is left in progress; call [`Worktrees::abort_rebase`]
    /// unless the conflicts are handed to the user.
    pub fn rebase(&self, worktree: &Path, onto: &str, interactive: bool) -> Result<RebaseOutcome> {
        if git::rebase(worktree, onto, interactive)? {
            return Ok(RebaseOutcome::Rebased {
                onto: onto.to_string(),
            });
        }
        Ok(RebaseOutcome::Stopped {
            onto: onto.to_string(),
            conflicted_files: git::conflicted_files(worktree)?,
        })
    }

    /// Abort the rebase in progress at `worktree` and build the error
    /// describing how to redo it by hand.
    pub fn abort_rebase(
        &self,
        worktree: &Path,
        branch: &str,
        onto: &str,
        conflicted_files: Vec<String>,
        tip: Option<&str>,
    ) -> CwError {
        if let Err(err) = git::rebase_abort(worktree) {
            debug!("rebase --abort failed in {}: {err}", worktree.display());
        }

        let mut message = format!(
            "Rebase failed. Please resolve conflicts manually:\n  cd {}\n  git rebase {onto}",
            worktree.display()
        );
        if !conflicted_files.is_empty() {
            message.push_str(&format!(
                "\n\nConflicted files ({}):",
                conflicted_files.len()
            ));
            for file in &conflicted_files {
                message.push_str(&format!("\n  • {file}"));
            }
            if let Some(tip) = tip {
                message.push_str(&format!("\n\n{tip}"));
            }
        }

        CwError::RebaseConflict {
            branch: branch.to_string(),
            conflicted_files,
            message,
        }
    }

    /// Check out the base branch in the base repository and fast-forward it
    /// to the feature branch. Returns whether the base repository was
    /// switched to a different branch first.
    pub fn merge_into_base(&self, plan: &FinishPlan) -> Result<bool> {
        if !plan.base_path.exists() {
            return Err(CwError::not_found(
                None,
                format!("Base repository not found at: {}", plan.base_path.display()),
            ));
        }
        git::fetch_all(&plan.base_path)?;

        let switched = match git::current_branch(&plan.base_path) {
            Ok(current) if current == plan.base_branch => false,
            _ => {
                git::switch(&plan.base_path, &plan.base_branch)?;
                true
            }
        };

        git::merge_ff_only(&plan.base_path, &plan.feature_branch).map_err(|err| {
            debug!("fast-forward merge failed: {err}");
            CwError::MergeConflict {
                branch: plan.feature_branch.clone(),
                message: format!(
                    "Fast-forward merge failed. Manual intervention required:\n  cd {}\n  git merge {}",
                    plan.base_path.display(),
                    plan.feature_branch
                ),
            }
        })?;
        Ok(switched)
    }

    /// Push the base branch to `origin`.
    pub fn push_base(&self, plan: &FinishPlan) -> Result<()> {
        git::push(&plan.base_path, &plan.base_branch)
    }

    /// Remove the finished worktree, its branch and its metadata.
    pub fn cleanup_finished(&self, plan: &FinishPlan) -> Result<()> {
        git::remove_worktree(&plan.base_path, &plan.feature_path, true)?;
        git::delete_branch(&plan.base_path, &plan.feature_branch, true)?;
        MetadataStore::new(&plan.base_path).remove(&plan.feature_branch)
    }

    /// Base metadata used by `sync`, inferred when missing.
    pub fn sync_metadata(&self, repo: &Path, branch: &str) -> Result<WorktreeMetadata> {
        MetadataStore::new(repo).worktree_metadata(branch)
    }

    /// Every linked worktree of the current repository with a branch checked out.
    pub fn feature_worktrees(&self) -> Result<Vec<FeatureWorktree>> {
        let main = self.main_repo()?;
        Ok(inventory::list_worktrees(&main)?
            .into_iter()
            .filter(|record| !record.is_detached() && !resolve::same_path(&record.path, &main))
            .map(|record| FeatureWorktree {
                branch: record.branch_name().to_string(),
                status: inventory::worktree_status(&record.path, &self.cwd),
                path: record.path,
            })
            .collect())
    }

    /// Validate a base change for the resolved worktree.
    pub fn change_base_plan(
        &self,
        target: &ResolutionMatch,
        new_base: &str,
    ) -> Result<ChangeBasePlan> {
        let repo_root = target.repository_root.clone();
        let Some(current_base) =
            MetadataStore::new(&repo_root).base_branch(&target.branch_name)?
        else {
            return Err(CwError::MetadataMissing {
                branch: target.branch_name.clone(),
                message: "No base branch metadata found. Was this worktree created with 'cw new'?"
                    .to_string(),
            });
        };
        if !git::rev_exists(&repo_root, new_base)? {
            return Err(CwError::invalid_branch(format!(
                "Base branch '{new_base}' not found"
            )));
        }

        Ok(ChangeBasePlan {
            feature_branch: target.branch_name.clone(),
            worktree_path: target.worktree_path.clone(),
            repo_root,
            current_base,
            new_base: new_base.to_string(),
        })
    }

    /// Record the new base branch after a successful rebase.
    pub fn apply_change_base(&self, plan: &ChangeBasePlan) -> Result<()> {
        MetadataStore::new(&plan.repo_root).set_base_branch(&plan.feature_branch, &plan.new_base)
    }

    /// Work out what deleting `target` affects.
    ///
    /// A target naming an existing directory that is a worktree of its
    /// repository is used directly; anything else goes through the resolver.
    pub fn delete_plan(
        &self,
        resolver: &TargetResolver<'_>,
        target: &str,
        mode: Option<LookupMode>,
        global: bool,
    ) -> Result<DeletePlan> {
        let (worktree_path, repo_hint) = match self.worktree_at_path(target)? {
            Some(found) => found,
            None => {
                let found = resolver.resolve(Some(target), mode, global)?;
                (found.worktree_path, found.repository_root)
            }
        };

        let repo_root = git::main_repo_root(&repo_hint)?;
        if resolve::same_path(&worktree_path, &repo_root) {
            return Err(CwError::OperationError(
                "Cannot delete main repository worktree".to_string(),
            ));
        }

        let branch = inventory::list_worktrees(&repo_root)?
            .into_iter()
            .find(|record| resolve::same_path(&record.path, &worktree_path))
            .filter(|record| !record.is_detached())
            .map(|record| record.branch_name().to_string());

        Ok(DeletePlan {
            worktree_path,
            branch,
            repo_root,
        })
    }

    /// The worktree at `target` when it is an existing worktree directory.
    fn worktree_at_path(&self, target: &str) -> Result<Option<(PathBuf, PathBuf)>> {
        let candidate = self.cwd.join(target);
        if !candidate.is_dir() {
            return Ok(None);
        }
        let Ok(main) = git::main_repo_root(&candidate) else {
            return Ok(None);
        };
        let found = inventory::list_worktrees(&main)?
            .into_iter()
            .find(|record| resolve::same_path(&record.path, &candidate));
        Ok(found.map(|record| (record.path, main)))
    }

    /// Delete plan for a cleanup candidate.
    pub fn candidate_plan(&self, candidate: &CleanCandidate) -> Result<DeletePlan> {
        Ok(DeletePlan {
            worktree_path: candidate.worktree.path.clone(),
            branch: Some(candidate.worktree.branch.clone()),
            repo_root: self.main_repo()?,
        })
    }

    /// Remove the worktree in `plan` and, unless kept, its branch and metadata.
    pub fn delete(&self, plan: &DeletePlan, options: DeleteOptions) -> Result<DeleteReport> {
        if plan.worktree_path.exists() {
            git::remove_worktree(&plan.repo_root, &plan.worktree_path, options.force)?;
        } else {
            git::prune_worktrees(&plan.repo_root)?;
        }

        let mut report = DeleteReport {
            branch_deleted: None,
            remote: RemoteDeletion::Skipped,
        };
        let Some(branch) = plan.branch.as_deref().filter(|_| !options.keep_branch) else {
            return Ok(report);
        };

        git::delete_branch(&plan.repo_root, branch, true)?;
        MetadataStore::new(&plan.repo_root).remove(branch)?;
        report.branch_deleted = Some(branch.to_string());

        if options.delete_remote {
            report.remote = match git::delete_remote_branch(&plan.repo_root, branch) {
                Ok(()) => RemoteDeletion::Deleted,
                Err(err) => RemoteDeletion::Failed(err.to_string()),
            };
        }
        Ok(report)
    }

    /// Worktrees matching any of `criteria`.
    pub fn clean_candidates(&self, criteria: CleanCriteria) -> Result<Vec<CleanCandidate>> {
        let main = self.main_repo()?;
        let store = MetadataStore::new(&main);
        let mut candidates = Vec::new();

        for worktree in self.feature_worktrees()? {
            let mut reasons = Vec::new();

            if criteria.stale && worktree.status == WorktreeStatus::Stale {
                reasons.push("stale (directory missing)".to_string());
            }

            if criteria.merged
                && let Some(base) = store.base_branch(&worktree.branch)?
            {
                match git::merged_branches(&main, &base) {
                    Ok(merged) if merged.contains(&worktree.branch) => {
                        reasons.push(format!("merged into {base}"));
                    }
                    Ok(_) => {}
                    Err(err) => debug!("cannot list branches merged into {base}: {err}"),
                }
            }

            if let Some(days) = criteria.older_than_days
                && let Some(age) = age_days(&worktree.path)
                && age > days as f64
            {
                reasons.push(format!("older than {days} days ({age:.1} days)"));
            }

            if !reasons.is_empty() {
                candidates.push(CleanCandidate { worktree, reasons });
            }
        }

        Ok(candidates)
    }

    /// Every worktree of the current repository.
    pub fn list(&self) -> Result<WorktreeListing> {
        let repo_root = self.main_repo()?;
        let entries = inventory::list_worktrees(&repo_root)?
            .into_iter()
            .map(|record| WorktreeEntry {
                branch: record.branch_name().to_string(),
                relative_path: relative_path(&record.path, &repo_root),
                status: inventory::worktree_status(&record.path, &self.cwd),
                path: record.path,
            })
            .collect();
        Ok(WorktreeListing { repo_root, entries })
    }

    /// Feature worktrees arranged under the main repository, sorted by branch.
    pub fn tree(&self) -> Result<WorktreeTree> {
        let repo_root = self.main_repo()?;
        let mut nodes: Vec<TreeNode> = self
            .feature_worktrees()?
            .into_iter()
            .map(|worktree| TreeNode {
                relative_path: relative_path(&worktree.path, &repo_root),
                branch: worktree.branch,
                status: worktree.status,
            })
            .collect();
        nodes.sort_by(|a, b| a.branch.cmp(&b.branch));
        Ok(WorktreeTree { repo_root, nodes })
    }

    /// Age and commit figures for every feature worktree.
    ///
    /// Commits are counted from the recorded (or inferred) base branch.
    pub fn stats(&self) -> Result<WorktreeStats> {
        let main = self.main_repo()?;
        let store = MetadataStore::new(&main);
        let worktrees = self
            .feature_worktrees()?
            .into_iter()
            .map(|worktree| {
                let commits = if worktree.status == WorktreeStatus::Stale {
                    0
                } else {
                    store
                        .worktree_metadata(&worktree.branch)
                        .and_then(|metadata| {
                            git::count_commits(&main, &metadata.base_branch, &worktree.branch)
                        })
                        .unwrap_or_else(|err| {
                            debug!("no commit count for {}: {err}", worktree.branch);
                            0
                        })
                };
                WorktreeStat {
                    age_days: age_days(&worktree.path),
                    branch: worktree.branch,
                    status: worktree.status,
                    commits,
                }
            })
            .collect();
        Ok(WorktreeStats { worktrees })
    }

    /// Metadata of the worktree containing the working directory, when it
    /// has a branch checked out.
    pub fn current_worktree(&self) -> Result<Option<CurrentWorktree>> {
        let repo_root = git::repo_root(&self.cwd)?;
        let Ok(branch) = git::current_branch(&self.cwd) else {
            return Ok(None);
        };
        let store = MetadataStore::new(&repo_root);
        Ok(Some(CurrentWorktree {
            base_branch: store.base_branch(&branch)?,
            base_path: store.base_path(&branch)?,
            feature_branch: branch,
        }))
    }

    /// Feature worktrees of every registered repository, after pruning the registry.
    pub fn global_list(&self) -> Result<GlobalListing> {
        let pruned = self.registry.prune()?;
        for path in &pruned {
            warn!("pruned stale registry entry {}", path.display());
        }

        let mut repos = self.registry.repositories()?;
        repos.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));

        let mut listing = GlobalListing {
            pruned,
            registered: repos.len(),
            ..GlobalListing::default()
        };

        for repo in repos {
            if !repo.path.exists() {
                listing.unreadable.push(UnreadableRepo {
                    name: repo.name,
                    path: repo.path,
                    reason: "repository not found".to_string(),
                });
                continue;
            }
            let records = match inventory::list_worktrees(&repo.path) {
                Ok(records) => records,
                Err(err) => {
                    debug!("cannot list worktrees of {}: {err}", repo.path.display());
                    listing.unreadable.push(UnreadableRepo {
                        name: repo.name,
                        path: repo.path,
                        reason: "failed to read worktrees".to_string(),
                    });
                    continue;
                }
            };

            let store = MetadataStore::new(&repo.path);
            for record in records {
                if record.is_detached() || resolve::same_path(&record.path, &repo.path) {
                    continue;
                }
                let branch = record.branch_name().to_string();
                let worktree_id = store
                    .intended_branch(&branch)
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| branch.clone());
                listing.worktrees.push(GlobalWorktree {
                    repo_name: repo.name.clone(),
                    worktree_id,
                    status: inventory::worktree_status(&record.path, &self.cwd),
                    age: age_days(&record.path).map(format_age),
                    relative_path: relative_path(&record.path, &repo.path),
                    branch,
                });
            }
        }

        Ok(listing)
    }

    /// Remove administrative data for worktrees whose directories are gone.
    pub fn prune(&self) -> Result<()> {
        git::prune_worktrees(&self.main_repo()?)
    }

    /// Drop registry entries for repositories that no longer exist.
    pub fn prune_registry(&self) -> Result<Vec<PathBuf>> {
        self.registry.prune()
    }

    /// Find repositories with worktrees below `dir` and register them.
    pub fn scan(&self, dir: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
        let found = registry::scan_for_repos(dir, max_depth);
        for repo in &found {
            self.registry.register(repo)?;
        }
        Ok(found)
    }

    /// Diff between two existing branches of the current repository.
    pub fn diff(&self, branch1: &str, branch2: &str, format: DiffFormat) -> Result<String> {
        let repo_root = git::repo_root(&self.cwd)?;
        for branch in [branch1, branch2] {
            if !git::rev_exists(&repo_root, branch)? {
                return Err(CwError::invalid_branch(format!(
                    "Branch '{branch}' not found"
                )));
            }
        }
        git::diff(&repo_root, branch1, branch2, format)
    }

    /// Health report for the worktrees of the current repository.
    pub fn doctor(&self) -> Result<DoctorReport> {
        let main = self.main_repo()?;
        let store = MetadataStore::new(&main);
        let worktrees = self.feature_worktrees()?;

        let fetched = git::fetch_all(&main)?;
        if !fetched {
            debug!("fetch failed in {}", main.display());
        }

        let mut report = DoctorReport {
            git_version: git::version(&self.cwd).ok(),
            worktree_count: worktrees.len(),
            stale: Vec::new(),
            uncommitted: Vec::new(),
            behind: Vec::new(),
            conflicted: Vec::new(),
        };

        for worktree in &worktrees {
            if worktree.status == WorktreeStatus::Stale {
                report.stale.push(worktree.branch.clone());
                continue;
            }

            if matches!(
                worktree.status,
                WorktreeStatus::Modified | WorktreeStatus::Active
            ) && git::has_uncommitted_changes(&worktree.path).unwrap_or(false)
            {
                report.uncommitted.push(worktree.branch.clone());
            }

            if let Some(base) = store.base_branch(&worktree.branch)?
                && let Some(commits) = self.commits_behind(&worktree.path, &worktree.branch, &base)
            {
                report.behind.push(BehindWorktree {
                    branch: worktree.branch.clone(),
                    base_branch: base,
                    commits,
                });
            }

            let conflicts = git::conflicted_files(&worktree.path).unwrap_or_default();
            if !conflicts.is_empty() {
                report
                    .conflicted
                    .push((worktree.branch.clone(), conflicts.len()));
            }
        }

        Ok(report)
    }

    /// Commits on `origin/<base>` missing from `branch`, when behind.
    fn commits_behind(&self, worktree: &Path, branch: &str, base: &str) -> Option<u32> {
        let remote_base = format!("origin/{base}");
        let merge_base = git::merge_base(worktree, branch, &remote_base).ok()??;
        let base_commit = git::rev_parse(worktree, &remote_base).ok()?;
        if merge_base == base_commit {
            return None;
        }
        git::count_commits(worktree, branch, &remote_base).ok()
    }
}
