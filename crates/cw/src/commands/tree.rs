use anyhow::Result;
use libcw::{WorktreeStatus, Worktrees};
use liboutput::Output;

use crate::ui::emit;

/// Marker drawn before a branch of the given status.
pub fn status_icon(status: WorktreeStatus) -> &'static str {
    match status {
        WorktreeStatus::Active => "●",
        WorktreeStatus::Clean => "○",
        WorktreeStatus::Modified => "◉",
        WorktreeStatus::Stale => "✗",
    }
}

/// Run the `cw tree` command logic.
pub fn tree(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    let tree = cw.tree()?;
    let name = tree
        .repo_root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    emit(output.heading(&format!("{name}/ (base repository)")))?;
    emit(output.message(&tree.repo_root.display().to_string()))?;
    emit(output.message(""))?;

    if tree.nodes.is_empty() {
        return emit(output.message("  (no feature worktrees)"));
    }

    let last = tree.nodes.len() - 1;
    for (index, node) in tree.nodes.iter().enumerate() {
        let (branch_prefix, path_prefix) = if index == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let current = if node.status == WorktreeStatus::Active {
            "★ "
        } else {
            ""
        };
        let line = format!(
            "{branch_prefix}{} {current}{}",
            status_icon(node.status),
            node.branch
        );
        match node.status {
            WorktreeStatus::Stale | WorktreeStatus::Modified => emit(output.warn(&line))?,
            WorktreeStatus::Active => emit(output.success(&line))?,
            WorktreeStatus::Clean => emit(output.message(&line))?,
        }
        emit(output.message(&format!("{path_prefix}{}", node.relative_path)))?;
    }

    emit(output.message(""))?;
    emit(output.heading("Legend:"))?;
    for status in [
        WorktreeStatus::Active,
        WorktreeStatus::Clean,
        WorktreeStatus::Modified,
        WorktreeStatus::Stale,
    ] {
        emit(output.message(&format!("  {} {status}", status_icon(status))))?;
    }
    emit(output.message("  ★ currently active worktree"))
}
