use std::path::{Path, PathBuf};

use crate::{
    error::{CwError, Result},
    process::{self, CommandOutput},
};

/// Run a git command in `repo`, failing on a non-zero exit.
fn git(repo: &Path, args: &[&str]) -> Result<CommandOutput> {
    process::run_checked("git", args, repo)
}

/// Run a git command in `repo`, returning its output whatever the exit status.
fn git_unchecked(repo: &Path, args: &[&str]) -> Result<CommandOutput> {
    process::run("git", args, repo)
}

/// Convert a path into a UTF-8 argument for git.
fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| CwError::OperationError(format!("Invalid path: {}", path.display())))
}

/// Return the top-level directory of the working tree containing `path`.
pub fn repo_root(path: &Path) -> Result<PathBuf> {
    let output = git_unchecked(path, &["rev-parse", "--show-toplevel"])?;
    if !output.success() || output.trimmed().is_empty() {
        return Err(CwError::NotARepository {
            path: path.to_path_buf(),
        });
    }
    Ok(PathBuf::from(output.trimmed()))
}

/// Return the main working tree of the repository containing `path`.
///
/// Git always lists the main working tree first, so this is stable from any
/// linked worktree.
pub fn main_repo_root(path: &Path) -> Result<PathBuf> {
    let root = repo_root(path)?;
    let records = crate::inventory::list_worktrees(&root)?;
    Ok(records
        .into_iter()
        .next()
        .map_or(root, |record| record.path))
}

/// Return the branch checked out in `path`.
///
/// Fails with [`CwError::InvalidBranch`] on a detached HEAD.
pub fn current_branch(path: &Path) -> Result<String> {
    repo_root(path)?;
    let output = git_unchecked(path, &["symbolic-ref", "--quiet", "--short", "HEAD"])?;
    let branch = output.trimmed();
    if !output.success() || branch.is_empty() {
        return Err(CwError::invalid_branch("In detached HEAD state"));
    }
    Ok(branch.to_string())
}

/// Whether `rev` names an existing commit (branch, remote branch, tag or hash).
pub fn rev_exists(repo: &Path, rev: &str) -> Result<bool> {
    let spec = format!("{rev}^{{commit}}");
    let output = git_unchecked(repo, &["rev-parse", "--verify", "--quiet", &spec])?;
    Ok(output.success())
}

/// Resolve `rev` to a full commit hash.
pub fn rev_parse(repo: &Path, rev: &str) -> Result<String> {
    Ok(git(repo, &["rev-parse", rev])?.trimmed().to_string())
}

/// Whether `name` is acceptable to git as a branch name.
pub fn is_valid_branch_name(repo: &Path, name: &str) -> Result<bool> {
    if name.trim().is_empty() {
        return Ok(false);
    }
    let output = git_unchecked(repo, &["check-ref-format", "--branch", name])?;
    Ok(output.success())
}

/// Read a local config value, returning `None` when the key is unset.
pub fn config_get(repo: &Path, key: &str) -> Result<Option<String>> {
    let output = git_unchecked(repo, &["config", "--local", "--get", key])?;
    match output.code {
        0 => Ok(Some(output.trimmed().to_string())),
        1 => Ok(None),
        _ => Err(CwError::Git {
            command: format!("git config --local --get {key}"),
            output: output.trimmed().to_string(),
        }),
    }
}

/// Write a local config value.
pub fn config_set(repo: &Path, key: &str, value: &str) -> Result<()> {
    git(repo, &["config", "--local", key, value])?;
    Ok(())
}

/// Remove every value of a local config key. Absent keys are not an error.
pub fn config_unset(repo: &Path, key: &str) -> Result<()> {
    let output = git_unchecked(repo, &["config", "--local", "--unset-all", key])?;
    // 5: the key did not exist.
    if output.success() || output.code == 5 {
        return Ok(());
    }
    Err(CwError::Git {
        command: format!("git config --local --unset-all {key}"),
        output: output.trimmed().to_string(),
    })
}

/// Check whether the working tree at `path` has staged, unstaged or untracked changes.
pub fn has_uncommitted_changes(path: &Path) -> Result<bool> {
    let output = git(path, &["status", "--porcelain"])?;
    Ok(!output.trimmed().is_empty())
}

/// Create a worktree at `path` on a new branch `branch` started from `base`.
pub fn create_worktree(repo: &Path, path: &Path, branch: &str, base: &str) -> Result<()> {
    git(repo, &["worktree", "add", "-b", branch, path_arg(path)?, base])?;
    Ok(())
}

/// Remove the worktree at `path`, optionally forcing removal of a dirty tree.
pub fn remove_worktree(repo: &Path, path: &Path, force: bool) -> Result<()> {
    let mut args = vec!["worktree", "remove", path_arg(path)?];
    if force {
        args.push("--force");
    }
    git(repo, &args)?;
    Ok(())
}

/// Remove administrative data for worktrees whose directories are gone.
pub fn prune_worktrees(repo: &Path) -> Result<()> {
    git(repo, &["worktree", "prune"])?;
    Ok(())
}

/// Delete the local branch `branch`, forcing the deletion when `force` is `true`.
pub fn delete_branch(repo: &Path, branch: &str, force: bool) -> Result<()> {
    let flag = if force { "-D" } else { "-d" };
    git(repo, &["branch", flag, branch])?;
    Ok(())
}

/// Delete `branch` on the `origin` remote.
pub fn delete_remote_branch(repo: &Path, branch: &str) -> Result<()> {
    git(repo, &["push", "origin", &format!(":{branch}")])?;
    Ok(())
}

/// Fetch every remote, pruning deleted remote branches. Returns whether the fetch succeeded.
pub fn fetch_all(repo: &Path) -> Result<bool> {
    Ok(git_unchecked(repo, &["fetch", "--all", "--prune"])?.success())
}

/// Whether `origin/<branch>` exists locally.
pub fn has_remote_branch(repo: &Path, branch: &str) -> Result<bool> {
    rev_exists(repo, &format!("origin/{branch}"))
}

/// Rebase the branch checked out at `worktree` onto `onto`.
///
/// Returns `false` when the rebase stopped, leaving it in progress. An
/// interactive rebase runs attached to the terminal.
pub fn rebase(worktree: &Path, onto: &str, interactive: bool) -> Result<bool> {
    if interactive {
        let code = process::run_attached("git", &["rebase", "--interactive", onto], worktree)?;
        return Ok(code == 0);
    }
    Ok(git_unchecked(worktree, &["rebase", onto])?.success())
}

/// Abort an in-progress rebase, ignoring failures.
pub fn rebase_abort(worktree: &Path) -> Result<()> {
    git_unchecked(worktree, &["rebase", "--abort"])?;
    Ok(())
}

/// List files with unresolved merge conflicts.
pub fn conflicted_files(worktree: &Path) -> Result<Vec<String>> {
    let output = git_unchecked(worktree, &["diff", "--name-only", "--diff-filter=U"])?;
    if !output.success() {
        return Ok(Vec::new());
    }
    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Check out `branch` in the working tree at `repo`.
pub fn switch(repo: &Path, branch: &str) -> Result<()> {
    git(repo, &["switch", branch])?;
    Ok(())
}

/// Fast-forward the current branch of `repo` to `branch`.
pub fn merge_ff_only(repo: &Path, branch: &str) -> Result<()> {
    git(repo, &["merge", "--ff-only", branch])?;
    Ok(())
}

/// Push `branch` to `origin`.
pub fn push(repo: &Path, branch: &str) -> Result<()> {
    git(repo, &["push", "origin", branch])?;
    Ok(())
}

/// Local branches already merged into `base`.
pub fn merged_branches(repo: &Path, base: &str) -> Result<Vec<String>> {
    let output = git(
        repo,
        &["branch", "--merged", base, "--format=%(refname:short)"],
    )?;
    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Count commits reachable from `to` but not from `from`.
pub fn count_commits(repo: &Path, from: &str, to: &str) -> Result<u32> {
    let range = format!("{from}..{to}");
    let output = git(repo, &["rev-list", "--count", &range])?;
    output
        .trimmed()
        .parse::<u32>()
        .map_err(|e| CwError::OperationError(format!("Unexpected rev-list output: {e}")))
}

/// Best common ancestor of `a` and `b`, if any.
pub fn merge_base(repo: &Path, a: &str, b: &str) -> Result<Option<String>> {
    let output = git_unchecked(repo, &["merge-base", a, b])?;
    if !output.success() {
        return Ok(None);
    }
    Ok(Some(output.trimmed().to_string()))
}

/// Output of `git diff` between two revisions in one of the supported formats.
pub fn diff(repo: &Path, from: &str, to: &str, format: DiffFormat) -> Result<String> {
    let mut args = vec!["diff"];
    match format {
        DiffFormat::Full => {}
        DiffFormat::Stat => args.push("--stat"),
        DiffFormat::NameStatus => args.push("--name-status"),
    }
    args.push(from);
    args.push(to);
    Ok(git(repo, &args)?.stdout)
}

/// Stash every change in `path`, untracked files included, under `message`.
pub fn stash_push(path: &Path, message: &str) -> Result<()> {
    git(path, &["stash", "push", "--include-untracked", "-m", message])?;
    Ok(())
}

/// Raw `git stash list` output. Stashes are shared by every worktree of a repository.
pub fn stash_list(repo: &Path) -> Result<String> {
    Ok(git(repo, &["stash", "list"])?.stdout)
}

/// Apply `stash_ref` to the working tree at `path`, keeping the stash.
pub fn stash_apply(path: &Path, stash_ref: &str) -> Result<()> {
    git(path, &["stash", "apply", stash_ref])?;
    Ok(())
}

/// Layout of a branch comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffFormat {
    /// Complete patch.
    Full,
    /// `--stat` summary.
    Stat,
    /// `--name-status` file list.
    NameStatus,
}

/// Installed git version as `(major, minor, patch)`.
pub fn version(cwd: &Path) -> Result<(u32, u32, u32)> {
    let output = process::run_checked("git", &["--version"], cwd)?;
    parse_version(output.trimmed()).ok_or_else(|| {
        CwError::OperationError(format!("Unrecognized git version: {}", output.trimmed()))
    })
}

/// Parse `git version 2.39.2 (Apple Git-143)` into its numeric components.
fn parse_version(text: &str) -> Option<(u32, u32, u32)> {
    let raw = text.split_whitespace().nth(2)?;
    let mut parts = raw
        .split('.')
        .map(|part| part.chars().take_while(char::is_ascii_digit).collect::<String>());
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major, minor, patch))
}
