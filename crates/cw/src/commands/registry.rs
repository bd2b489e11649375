use std::path::Path;

use anyhow::Result;
use libcw::Worktrees;
use liboutput::Output;

use crate::ui::emit;

/// Run `cw prune`: drop git's records of worktrees whose directories are gone.
pub fn prune(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    emit(output.message("Pruning stale worktrees..."))?;
    cw.prune()?;
    emit(output.success("✓ Prune complete"))
}

/// Run `cw -g prune`: drop registry entries whose repositories are gone.
pub fn global_prune(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    emit(output.message("Pruning registry..."))?;
    let removed = cw.prune_registry()?;
    if removed.is_empty() {
        return emit(output.success("* Registry is clean, nothing to prune."));
    }
    emit(output.success(&format!("* Removed {} stale entry(s):", removed.len())))?;
    for path in &removed {
        emit(output.message(&format!("  - {}", path.display())))?;
    }
    Ok(())
}

/// Run `cw scan`: find repositories with worktrees below `dir` and register them.
pub fn scan(cw: &Worktrees, output: &dyn Output, dir: &Path, depth: usize) -> Result<()> {
    emit(output.message("Scanning for repositories..."))?;
    emit(output.message(&format!("  Directory: {}", dir.display())))?;
    emit(output.message(&format!("  Max depth: {depth}")))?;

    let spinner = output.spinner("Scanning...");
    let found = cw.scan(dir, depth);
    spinner.finish();
    let found = found?;

    if found.is_empty() {
        return emit(output.warn("No repositories with worktrees found."));
    }
    emit(output.success(&format!("* Found {} repository(s):", found.len())))?;
    for repo in &found {
        let name = repo
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        emit(output.message(&format!("  + {name} ({})", repo.display())))?;
    }
    emit(output.message(""))?;
    emit(output.success(&format!("* Registered {} repository(s)", found.len())))?;
    emit(output.message("Use 'cw -g list' to see all worktrees."))
}
