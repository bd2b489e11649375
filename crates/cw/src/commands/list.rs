use anyhow::Result;
use libcw::{GlobalListing, GlobalWorktree, WorktreeStatus, Worktrees};
use liboutput::Output;

use crate::ui::{emit, field};

/// Width of the status column.
const STATUS_WIDTH: usize = 10;

/// Width of the age column in the global listing.
const AGE_WIDTH: usize = 12;

/// Column width for values of at most `longest` characters, clamped to `min..=max`.
fn column_width(longest: usize, min: usize, max: usize) -> usize {
    (longest + 2).clamp(min, max)
}

/// Run the `cw list` command logic.
pub fn list(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    let listing = cw.list()?;
    emit(output.heading(&format!(
        "Worktrees for repository: {}",
        listing.repo_root.display()
    )))?;
    emit(output.message(""))?;

    let longest = listing
        .entries
        .iter()
        .map(|entry| entry.branch.chars().count())
        .max()
        .unwrap_or(0);
    let width = column_width(longest, 35, 60);

    emit(output.message(&format!(
        "{:<width$} {:<STATUS_WIDTH$} PATH",
        "BRANCH", "STATUS"
    )))?;
    emit(output.message(&"-".repeat(width + STATUS_WIDTH + 2 + 40)))?;
    for entry in &listing.entries {
        emit(output.message(&format!(
            "{:<width$} {:<STATUS_WIDTH$} {}",
            entry.branch,
            entry.status.as_str(),
            entry.relative_path
        )))?;
    }
    Ok(())
}

/// Run the `cw status` command logic.
pub fn status(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    match cw.current_worktree()? {
        Some(current) if current.base_branch.is_some() => {
            emit(output.heading("Current worktree:"))?;
            emit(output.message(&field("Feature", &current.feature_branch, 10)))?;
            emit(output.message(&field(
                "Base",
                current.base_branch.as_deref().unwrap_or("N/A"),
                10,
            )))?;
            let base_path = current
                .base_path
                .as_ref()
                .map_or_else(|| "N/A".to_string(), |path| path.display().to_string());
            emit(output.message(&field("Base path", base_path, 10)))?;
        }
        _ => emit(output.warn(
            "Current directory is not a feature worktree or is the main repository.",
        ))?,
    }
    emit(output.message(""))?;
    list(cw, output)
}

/// Run `cw -g list`: feature worktrees across every registered repository.
pub fn global_list(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    let listing = cw.global_list()?;

    if !listing.pruned.is_empty() {
        emit(output.warn(&format!(
            "Auto-pruned {} stale registry entry(s)",
            listing.pruned.len()
        )))?;
    }
    if listing.registered == 0 {
        emit(output.warn("No repositories registered."))?;
        emit(output.message("Use 'cw -g scan' to find repositories, or create a worktree with 'cw new'."))?;
        return Ok(());
    }

    emit(output.heading("Global Worktree Overview"))?;
    emit(output.message(""))?;
    for repo in &listing.unreadable {
        emit(output.warn(&format!(
            "⚠ {} ({}): {}",
            repo.name,
            repo.path.display(),
            repo.reason
        )))?;
    }
    if listing.worktrees.is_empty() {
        return emit(output.message("No repositories with active worktrees found."));
    }

    render_table(output, &listing)?;

    let counts = [
        WorktreeStatus::Clean,
        WorktreeStatus::Modified,
        WorktreeStatus::Active,
        WorktreeStatus::Stale,
    ]
    .map(|status| format!("{} {status}", listing.count_status(status)));
    emit(output.message(""))?;
    emit(output.message(&format!(
        "{} repo(s), {} worktree(s): {}",
        listing.repo_count(),
        listing.worktrees.len(),
        counts.join(", ")
    )))
}

/// Table rows of the global listing.
fn render_table(output: &dyn Output, listing: &GlobalListing) -> Result<()> {
    let longest = |f: fn(&GlobalWorktree) -> usize| {
        listing.worktrees.iter().map(f).max().unwrap_or(0)
    };
    let repo_width = column_width(longest(|w| w.repo_name.chars().count()), 12, 25);
    let id_width = column_width(longest(|w| w.worktree_id.chars().count()), 20, 35);
    let branch_width = column_width(longest(|w| w.branch.chars().count() + 5), 20, 35);

    emit(output.message(&format!(
        "{:<repo_width$} {:<id_width$} {:<branch_width$} {:<STATUS_WIDTH$} {:<AGE_WIDTH$} PATH",
        "REPO", "WORKTREE", "CURRENT BRANCH", "STATUS", "AGE"
    )))?;
    emit(output.message(&"─".repeat(repo_width + id_width + branch_width + 82)))?;

    for worktree in &listing.worktrees {
        let branch = if worktree.is_mismatched() {
            format!("{} (⚠️)", worktree.branch)
        } else {
            worktree.branch.clone()
        };
        emit(output.message(&format!(
            "{:<repo_width$} {:<id_width$} {:<branch_width$} {:<STATUS_WIDTH$} {:<AGE_WIDTH$} {}",
            worktree.repo_name,
            worktree.worktree_id,
            branch,
            worktree.status.as_str(),
            worktree.age.as_deref().unwrap_or("-"),
            worktree.relative_path
        )))?;
    }
    Ok(())
}
