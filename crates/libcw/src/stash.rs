//! Stashes shared between the worktrees of a repository.
//!
//! Git keeps one stash stack per repository, so a stash saved in one worktree
//! can be applied in any other. Stashes saved by `cw` carry a `[branch]`
//! prefix in their message so they can be grouped by origin.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    error::{CwError, Result},
    git,
    resolve,
    worktrees::Worktrees,
};

/// Most recent stash.
pub const LATEST_STASH: &str = "stash@{0}";

/// Group name for stashes whose origin cannot be determined.
const UNKNOWN_BRANCH: &str = "unknown";

/// One entry of `git stash list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    /// Reference such as `stash@{0}`.
    pub reference: String,
    /// Branch the stash was saved from.
    pub branch: String,
    /// Message without the branch prefix.
    pub message: String,
}

/// Message of a stash saved from `branch`.
pub fn stash_message(branch: &str, message: Option<&str>) -> String {
    format!("[{branch}] {}", message.unwrap_or("WIP"))
}

/// Parse `git stash list` output.
///
/// Lines look like `stash@{0}: On main: [main] message` or
/// `stash@{1}: WIP on feature: abc1234 commit subject`.
pub fn parse_stash_list(output: &str) -> Vec<StashEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, ':');
            let reference = parts.next()?.trim();
            let info = parts.next()?.trim();
            let message = parts.next()?.trim();

            if let Some(rest) = message.strip_prefix('[')
                && let Some((branch, message)) = rest.split_once(']')
            {
                return Some(StashEntry {
                    reference: reference.to_string(),
                    branch: branch.to_string(),
                    message: message.trim().to_string(),
                });
            }

            let branch = info
                .strip_prefix("On ")
                .or_else(|| info.strip_prefix("WIP on "))
                .unwrap_or(UNKNOWN_BRANCH);
            Some(StashEntry {
                reference: reference.to_string(),
                branch: branch.to_string(),
                message: message.to_string(),
            })
        })
        .collect()
}

/// Stashes keyed by originating branch, in branch order.
pub fn group_by_branch(entries: Vec<StashEntry>) -> BTreeMap<String, Vec<StashEntry>> {
    let mut groups: BTreeMap<String, Vec<StashEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.branch.clone()).or_default().push(entry);
    }
    groups
}

impl Worktrees {
    /// Stash the changes of the worktree containing the working directory.
    ///
    /// Returns the stash message, or `None` when there was nothing to stash.
    pub fn stash_save(&self, message: Option<&str>) -> Result<Option<String>> {
        let worktree = git::repo_root(self.cwd())?;
        let branch = git::current_branch(&worktree)
            .map_err(|_| CwError::invalid_branch("Cannot determine current branch"))?;

        if !git::has_uncommitted_changes(&worktree)? {
            return Ok(None);
        }

        let message = stash_message(&branch, message);
        git::stash_push(&worktree, &message)?;
        debug!("stashed changes of {branch}: {message}");
        Ok(Some(message))
    }

    /// Every stash of the current repository, newest first.
    pub fn stash_list(&self) -> Result<Vec<StashEntry>> {
        let repo = git::repo_root(self.cwd())?;
        Ok(parse_stash_list(&git::stash_list(&repo)?))
    }

    /// Apply `stash_ref` in the worktree of `branch`. Returns that worktree's path.
    pub fn stash_apply(&self, branch: &str, stash_ref: &str) -> Result<PathBuf> {
        let main = self.main_repo()?;
        let record = resolve::find_worktree_by_intended_branch(&main, branch)?.ok_or_else(|| {
            CwError::not_found(
                Some(branch),
                format!(
                    "No worktree found for branch '{branch}'. Use 'cw list' to see available worktrees."
                ),
            )
        })?;

        if !stash_exists(&main, stash_ref)? {
            return Err(CwError::OperationError(format!(
                "Stash '{stash_ref}' not found. Use 'cw stash list' to see available stashes."
            )));
        }

        git::stash_apply(&record.path, stash_ref)?;
        Ok(record.path)
    }
}

/// Whether `stash_ref` names an existing stash of `repo`.
fn stash_exists(repo: &Path, stash_ref: &str) -> Result<bool> {
    Ok(parse_stash_list(&git::stash_list(repo)?)
        .iter()
        .any(|entry| entry.reference == stash_ref))
}
