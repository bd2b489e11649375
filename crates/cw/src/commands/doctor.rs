use anyhow::Result;
use libcw::{DoctorReport, Worktrees};
use liboutput::Output;

use crate::ui::emit;

/// Render a `(major, minor, patch)` version.
fn version_string((major, minor, patch): (u32, u32, u32)) -> String {
    format!("{major}.{minor}.{patch}")
}

/// Run the `cw doctor` command logic.
pub fn doctor(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    emit(output.heading("claude-worktree Health Check"))?;
    emit(output.message(""))?;

    let spinner = output.spinner("Inspecting worktrees...");
    let report = cw.doctor();
    spinner.finish();
    let report = report?;

    let minimum = version_string(DoctorReport::MIN_GIT_VERSION);
    emit(output.message("1. Checking Git version..."))?;
    match report.git_version {
        Some(version) if report.git_version_ok() => emit(output.success(&format!(
            "   ✓ Git version {} (minimum: {minimum})",
            version_string(version)
        )))?,
        Some(version) => emit(output.fail(&format!(
            "   ✗ Git version {} is too old (minimum: {minimum})",
            version_string(version)
        )))?,
        None => emit(output.fail("   ✗ Could not detect Git version"))?,
    }

    emit(output.message(""))?;
    emit(output.message("2. Checking worktree accessibility..."))?;
    if report.stale.is_empty() {
        emit(output.success(&format!(
            "   ✓ All {} worktree(s) accessible",
            report.worktree_count
        )))?;
    }
    for branch in &report.stale {
        emit(output.fail(&format!("   ✗ {branch}: Stale (directory missing)")))?;
    }

    emit(output.message(""))?;
    emit(output.message("3. Checking for uncommitted changes..."))?;
    if report.uncommitted.is_empty() {
        emit(output.success("   ✓ No uncommitted changes"))?;
    } else {
        emit(output.warn(&format!(
            "   ⚠ {} worktree(s) with uncommitted changes:",
            report.uncommitted.len()
        )))?;
        for branch in &report.uncommitted {
            emit(output.message(&format!("     • {branch}")))?;
        }
    }

    emit(output.message(""))?;
    emit(output.message("4. Checking if worktrees are behind base branch..."))?;
    if report.behind.is_empty() {
        emit(output.success("   ✓ All worktrees up-to-date with base"))?;
    } else {
        emit(output.warn(&format!(
            "   ⚠ {} worktree(s) behind base branch:",
            report.behind.len()
        )))?;
        for behind in &report.behind {
            emit(output.message(&format!(
                "     • {}: {} commit(s) behind {}",
                behind.branch, behind.commits, behind.base_branch
            )))?;
        }
        emit(output.message("   Tip: Use 'cw sync --all' to update all worktrees"))?;
    }

    emit(output.message(""))?;
    emit(output.message("5. Checking for merge conflicts..."))?;
    if report.conflicted.is_empty() {
        emit(output.success("   ✓ No merge conflicts detected"))?;
    } else {
        emit(output.fail(&format!(
            "   ✗ {} worktree(s) with unresolved conflicts:",
            report.conflicted.len()
        )))?;
        for (branch, files) in &report.conflicted {
            emit(output.message(&format!("     • {branch}: {files} conflicted file(s)")))?;
        }
        emit(output.message(
            "   Tip: Use 'cw finish --ai-merge' for AI-assisted conflict resolution",
        ))?;
    }

    render_summary(output, &report)
}

/// Closing summary and recommendations.
fn render_summary(output: &dyn Output, report: &DoctorReport) -> Result<()> {
    emit(output.message(""))?;
    emit(output.heading("Summary:"))?;
    let issues = report.issue_count();
    let warnings = report.warning_count();
    if issues == 0 && warnings == 0 {
        return emit(output.success("✓ Everything looks healthy!"));
    }
    if issues > 0 {
        emit(output.fail(&format!("✗ {issues} issue(s) found")))?;
    }
    if warnings > 0 {
        emit(output.warn(&format!("⚠ {warnings} warning(s) found")))?;
    }

    emit(output.message(""))?;
    emit(output.heading("Recommendations:"))?;
    if !report.git_version_ok() {
        emit(output.message("  • Upgrade Git to a newer version"))?;
    }
    if !report.stale.is_empty() {
        emit(output.message("  • Run 'cw prune' to clean up stale worktrees"))?;
    }
    if !report.behind.is_empty() {
        emit(output.message("  • Run 'cw sync --all' to update outdated worktrees"))?;
    }
    if !report.conflicted.is_empty() {
        emit(output.message("  • Resolve conflicts in conflicted worktrees"))?;
    }
    if !report.uncommitted.is_empty() {
        emit(output.message("  • Commit or stash changes in worktrees with uncommitted work"))?;
    }
    Ok(())
}
