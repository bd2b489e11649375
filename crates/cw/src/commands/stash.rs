use anyhow::Result;
use libcw::{CwError, Worktrees, stash};
use liboutput::Output;

use crate::ui::emit;

/// Run `cw stash save`.
pub fn save(cw: &Worktrees, output: &dyn Output, message: Option<&str>) -> Result<()> {
    match cw.stash_save(message)? {
        Some(message) => emit(output.success(&format!("✓ Stashed changes: {message}"))),
        None => emit(output.warn("⚠ No changes to stash")),
    }
}

/// Run `cw stash list`.
pub fn list(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    let entries = cw.stash_list()?;
    if entries.is_empty() {
        return emit(output.warn("No stashes found"));
    }

    emit(output.heading("Stashes by worktree:"))?;
    for (branch, entries) in stash::group_by_branch(entries) {
        emit(output.message(""))?;
        emit(output.success(&format!("{branch}:")))?;
        for entry in entries {
            emit(output.message(&format!("  {}: {}", entry.reference, entry.message)))?;
        }
    }
    Ok(())
}

/// Run `cw stash apply`.
pub fn apply(cw: &Worktrees, output: &dyn Output, target: &str, stash_ref: &str) -> Result<()> {
    emit(output.message(&format!("Applying {stash_ref} to {target}...")))?;
    match cw.stash_apply(target, stash_ref) {
        Ok(path) => {
            emit(output.success(&format!("✓ Stash applied to {target}")))?;
            emit(output.message(&format!("Worktree path: {}", path.display())))
        }
        Err(err @ CwError::Git { .. }) => {
            emit(output.warn(
                "Tip: There may be conflicts. Check the worktree and resolve manually.",
            ))?;
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
