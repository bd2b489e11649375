use anyhow::Result;
use libcw::{WorktreeStatus, Worktrees, format_age};
use liboutput::Output;

use super::tree::status_icon;
use crate::ui::emit;

/// Entries shown in each ranking.
const TOP: usize = 5;

/// Run the `cw stats` command logic.
pub fn stats(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    let stats = cw.stats()?;
    if stats.worktrees.is_empty() {
        return emit(output.warn("No feature worktrees found"));
    }

    emit(output.heading("Worktree Statistics"))?;
    emit(output.message(""))?;
    emit(output.heading("Overview:"))?;
    emit(output.message(&format!("  Total worktrees: {}", stats.worktrees.len())))?;
    let counts = [
        WorktreeStatus::Clean,
        WorktreeStatus::Modified,
        WorktreeStatus::Active,
        WorktreeStatus::Stale,
    ]
    .map(|status| format!("{} {status}", stats.count_status(status)));
    emit(output.message(&format!("  Status: {}", counts.join(", "))))?;

    if let Some((average, oldest, newest)) = stats.age_summary() {
        emit(output.message(""))?;
        emit(output.heading("Age Statistics:"))?;
        emit(output.message(&format!("  Average age: {average:.1} days")))?;
        emit(output.message(&format!("  Oldest: {oldest:.1} days")))?;
        emit(output.message(&format!("  Newest: {newest:.1} days")))?;
    }

    if let Some((total, average, max)) = stats.commit_summary() {
        emit(output.message(""))?;
        emit(output.heading("Commit Statistics:"))?;
        emit(output.message(&format!("  Total commits across all worktrees: {total}")))?;
        emit(output.message(&format!("  Average commits per worktree: {average:.1}")))?;
        emit(output.message(&format!("  Most commits in a worktree: {max}")))?;
    }

    emit(output.message(""))?;
    emit(output.heading("Oldest Worktrees:"))?;
    for worktree in stats.oldest(TOP) {
        emit(output.message(&format!(
            "  {} {:<30} {}",
            status_icon(worktree.status),
            worktree.branch,
            worktree.age_days.map(format_age).unwrap_or_default()
        )))?;
    }

    emit(output.message(""))?;
    emit(output.heading("Most Active Worktrees (by commits):"))?;
    for worktree in stats.most_active(TOP) {
        emit(output.message(&format!(
            "  {} {:<30} {} commit(s)",
            status_icon(worktree.status),
            worktree.branch,
            worktree.commits
        )))?;
    }
    Ok(())
}
