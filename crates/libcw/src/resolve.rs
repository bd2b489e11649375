//! Resolution of user-supplied targets to a single worktree.
//!
//! A target may name a branch (the branch a worktree was created for, or the
//! one it has checked out), a worktree directory, or in global mode a
//! `repo:branch` pair searched across every registered repository. When a
//! token matches distinct worktrees the resolver either asks through a
//! [`Chooser`] or fails with [`CwError::AmbiguousTarget`].

use std::path::{Path, PathBuf};

use log::debug;

use crate::{
    error::{CwError, Result},
    git,
    inventory::{self, WorktreeRecord},
    metadata::MetadataStore,
    registry::Registry,
};

/// Hint shown when a local target is ambiguous.
const LOCAL_HINT: &str = "Use --branch (-b) or --worktree (-w) flag to specify which one.";

/// Hint shown when a global target is ambiguous.
const GLOBAL_HINT: &str = "Use 'repo:branch' notation to specify directly.";

/// Restricts which kind of lookup is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Match only worktrees by intended or checked-out branch.
    Branch,
    /// Match only worktrees by directory name.
    Worktree,
}

/// A resolved worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionMatch {
    /// Path of the worktree.
    pub worktree_path: PathBuf,
    /// Branch associated with the worktree.
    pub branch_name: String,
    /// Top-level directory of the repository the worktree belongs to.
    pub repository_root: PathBuf,
}

/// Interactive selection between candidates.
pub trait Chooser {
    /// Ask the user to pick one of `options`, returning its index.
    ///
    /// Implementations keep asking until a valid choice is made and report
    /// cancellation as [`CwError::UserAborted`].
    fn choose(&self, prompt: &str, options: &[String]) -> Result<usize>;
}

/// Split `repo:branch` notation. Both halves must be non-empty.
pub fn parse_repo_branch_target(target: &str) -> (Option<&str>, &str) {
    match target.split_once(':') {
        Some((repo, branch)) if !repo.is_empty() && !branch.is_empty() => (Some(repo), branch),
        _ => (None, target),
    }
}

/// Whether `a` and `b` refer to the same directory.
pub fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Worktree whose intended branch, or else checked-out branch, equals `branch`.
pub fn find_worktree_by_intended_branch(repo: &Path, branch: &str) -> Result<Option<WorktreeRecord>> {
    let records = inventory::list_worktrees(repo)?;
    let store = MetadataStore::new(repo);

    for record in &records {
        if record.is_detached() {
            continue;
        }
        if store.intended_branch(record.branch_name())?.as_deref() == Some(branch) {
            return Ok(Some(record.clone()));
        }
    }

    Ok(records
        .into_iter()
        .find(|record| !record.is_detached() && record.branch_name() == branch))
}

/// Worktree whose directory name equals `name`.
pub fn find_worktree_by_name(repo: &Path, name: &str) -> Result<Option<WorktreeRecord>> {
    Ok(inventory::list_worktrees(repo)?
        .into_iter()
        .find(|record| record.dir_name() == Some(name)))
}

/// Matches found in one repository.
struct DualMatch {
    /// Worktree found by branch.
    branch: Option<WorktreeRecord>,
    /// Worktree found by directory name.
    worktree: Option<WorktreeRecord>,
}

impl DualMatch {
    /// Run the lookups permitted by `mode` in `repo`.
    fn lookup(repo: &Path, target: &str, mode: Option<LookupMode>) -> Result<Self> {
        let branch = match mode {
            Some(LookupMode::Worktree) => None,
            _ => find_worktree_by_intended_branch(repo, target)?,
        };
        let worktree = match mode {
            Some(LookupMode::Branch) => None,
            _ => find_worktree_by_name(repo, target)?,
        };
        Ok(Self { branch, worktree })
    }

    /// Both lookups hit the same directory.
    fn is_same_worktree(&self) -> bool {
        match (&self.branch, &self.worktree) {
            (Some(b), Some(w)) => same_path(&b.path, &w.path),
            _ => false,
        }
    }
}

/// Build a match for `record`, using `fallback` as the branch when it is detached.
fn match_for(record: &WorktreeRecord, fallback: &str, main_repo: &Path) -> ResolutionMatch {
    let branch_name = if record.is_detached() {
        fallback.to_string()
    } else {
        record.branch_name().to_string()
    };
    let repository_root = if record.path.exists() {
        git::repo_root(&record.path).unwrap_or_else(|_| record.path.clone())
    } else {
        main_repo.to_path_buf()
    };
    ResolutionMatch {
        worktree_path: record.path.clone(),
        branch_name,
        repository_root,
    }
}

/// Error for a chooser answer past the end of the candidate list.
fn out_of_range(index: usize) -> CwError {
    CwError::OperationError(format!("Selection {} is out of range", index + 1))
}

/// Candidate found during a global lookup.
struct GlobalCandidate {
    /// Registered repository name.
    repo_name: String,
    /// Resolved worktree.
    found: ResolutionMatch,
}

impl GlobalCandidate {
    /// `repo:branch → path` label.
    fn label(&self) -> String {
        format!(
            "{}:{} → {}",
            self.repo_name,
            self.found.branch_name,
            self.found.worktree_path.display()
        )
    }
}

/// Resolves targets relative to a working directory.
pub struct TargetResolver<'a> {
    /// Directory the lookup starts from.
    cwd: PathBuf,
    /// Whether prompting is allowed.
    interactive: bool,
    /// Prompt used for interactive disambiguation.
    chooser: &'a dyn Chooser,
    /// Registry searched in global mode.
    registry: Option<&'a Registry>,
}

impl<'a> TargetResolver<'a> {
    /// Create a resolver for `cwd`.
    pub fn new(cwd: &Path, interactive: bool, chooser: &'a dyn Chooser) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            interactive,
            chooser,
            registry: None,
        }
    }

    /// Enable global lookups through `registry`.
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Resolve `target` to exactly one worktree.
    pub fn resolve(
        &self,
        target: Option<&str>,
        mode: Option<LookupMode>,
        global: bool,
    ) -> Result<ResolutionMatch> {
        match (target, global) {
            (None, true) => Err(CwError::not_found(
                None,
                "Global mode requires an explicit target (branch or worktree name).",
            )),
            (None, false) => self.resolve_current(),
            (Some(target), false) => self.resolve_local(target, mode),
            (Some(target), true) => self.resolve_global(target, mode),
        }
    }

    /// The worktree containing the current directory and its checked-out branch.
    fn resolve_current(&self) -> Result<ResolutionMatch> {
        let repository_root = git::repo_root(&self.cwd)?;
        let branch_name = git::current_branch(&self.cwd)
            .map_err(|_| CwError::invalid_branch("Cannot determine current branch"))?;
        Ok(ResolutionMatch {
            worktree_path: repository_root.clone(),
            branch_name,
            repository_root,
        })
    }

    /// Dual lookup in the repository containing the current directory.
    fn resolve_local(&self, target: &str, mode: Option<LookupMode>) -> Result<ResolutionMatch> {
        let main_repo = git::main_repo_root(&self.cwd)?;
        let found = DualMatch::lookup(&main_repo, target, mode)?;

        match (&found.branch, &found.worktree) {
            (None, None) => Err(CwError::not_found(
                Some(target),
                match mode {
                    Some(LookupMode::Branch) => format!("No worktree found for branch '{target}'"),
                    Some(LookupMode::Worktree) => {
                        format!("No worktree found with name '{target}'")
                    }
                    None => format!(
                        "No worktree found for '{target}'. Try: full path, branch name (--branch), or worktree name (--worktree)."
                    ),
                },
            )),
            (Some(branch), None) => Ok(match_for(branch, target, &main_repo)),
            (None, Some(worktree)) => Ok(match_for(worktree, target, &main_repo)),
            (Some(branch), Some(_)) if found.is_same_worktree() => {
                Ok(match_for(branch, target, &main_repo))
            }
            (Some(branch), Some(worktree)) => {
                let worktree_name = worktree.dir_name().unwrap_or(target);
                let candidates = vec![
                    format!("Branch '{target}' → {}", branch.path.display()),
                    format!("Worktree '{worktree_name}' → {}", worktree.path.display()),
                ];
                if !self.interactive {
                    return Err(CwError::AmbiguousTarget {
                        target: target.to_string(),
                        candidates,
                        hint: LOCAL_HINT.to_string(),
                    });
                }
                let prompt = format!("Multiple matches found for '{target}':");
                let chosen = match self.chooser.choose(&prompt, &candidates)? {
                    0 => branch,
                    1 => worktree,
                    index => return Err(out_of_range(index)),
                };
                Ok(match_for(chosen, target, &main_repo))
            }
        }
    }

    /// Lookup across every registered repository.
    fn resolve_global(&self, target: &str, mode: Option<LookupMode>) -> Result<ResolutionMatch> {
        let registry = self.registry.ok_or_else(|| {
            CwError::OperationError("Global lookup requires the repository registry".to_string())
        })?;
        let (repo_filter, branch_target) = parse_repo_branch_target(target);

        let mut candidates = Vec::new();
        for repo in registry.repositories()? {
            if repo_filter.is_some_and(|name| name != repo.name) {
                continue;
            }
            if !repo.path.exists() {
                debug!("skipping missing repository {}", repo.path.display());
                continue;
            }
            match Self::global_matches(&repo.path, branch_target, mode) {
                Ok(found) => candidates.extend(found.into_iter().map(|found| GlobalCandidate {
                    repo_name: repo.name.clone(),
                    found,
                })),
                Err(err) => debug!("skipping repository {}: {err}", repo.path.display()),
            }
        }

        match candidates.len() {
            0 => Err(CwError::not_found(
                Some(target),
                format!(
                    "'{target}' not found in any registered repository. Run 'cw scan' to register repos."
                ),
            )),
            1 => Ok(candidates.remove(0).found),
            _ => {
                let labels: Vec<String> = candidates.iter().map(GlobalCandidate::label).collect();
                if !self.interactive {
                    return Err(CwError::AmbiguousTarget {
                        target: target.to_string(),
                        candidates: labels,
                        hint: GLOBAL_HINT.to_string(),
                    });
                }
                let prompt = format!("Multiple matches found for '{target}':");
                let index = self.chooser.choose(&prompt, &labels)?;
                if index >= candidates.len() {
                    return Err(out_of_range(index));
                }
                Ok(candidates.swap_remove(index).found)
            }
        }
    }

    /// Matches contributed by one repository in a global lookup.
    fn global_matches(
        repo: &Path,
        target: &str,
        mode: Option<LookupMode>,
    ) -> Result<Vec<ResolutionMatch>> {
        let found = DualMatch::lookup(repo, target, mode)?;
        if found.is_same_worktree() {
            return Ok(found
                .branch
                .iter()
                .map(|record| match_for(record, target, repo))
                .collect());
        }
        Ok(found
            .branch
            .iter()
            .chain(found.worktree.iter())
            .map(|record| match_for(record, target, repo))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_branch_notation_requires_both_halves() {
        assert_eq!(parse_repo_branch_target("app:fix"), (Some("app"), "fix"));
        assert_eq!(parse_repo_branch_target("fix"), (None, "fix"));
        assert_eq!(parse_repo_branch_target(":fix"), (None, ":fix"));
        assert_eq!(parse_repo_branch_target("app:"), (None, "app:"));
        assert_eq!(
            parse_repo_branch_target("app:feature/x"),
            (Some("app"), "feature/x")
        );
    }

    #[test]
    fn same_path_falls_back_to_equality_for_missing_paths() {
        assert!(same_path(Path::new("/nope/a"), Path::new("/nope/a")));
        assert!(!same_path(Path::new("/nope/a"), Path::new("/nope/b")));
    }
}
