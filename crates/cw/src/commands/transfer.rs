use std::path::Path;

use anyhow::Result;
use libcw::{ExportDocument, Worktrees, transfer};
use liboutput::Output;

use crate::ui::{emit, field};

/// Run the `cw export` command logic.
pub fn export(cw: &Worktrees, output: &dyn Output, file: Option<&Path>) -> Result<()> {
    let file = file.map_or_else(transfer::default_export_file, Path::to_path_buf);
    emit(output.message(&format!("Exporting configuration to: {}", file.display())))?;
    let document = cw.export_to(&file)?;

    emit(output.success("✓ Export complete!"))?;
    emit(output.heading("Exported:"))?;
    emit(output.message(&format!("  • {} worktree(s)", document.worktrees.len())))?;
    emit(output.message("  • Configuration settings"))?;
    emit(output.message(""))?;
    emit(output.message(
        "Transfer this file to another machine and use 'cw import' to restore.",
    ))
}

/// Run the `cw import` command logic: preview, then apply with `--apply`.
pub fn import(cw: &Worktrees, output: &dyn Output, file: &Path, apply: bool) -> Result<()> {
    emit(output.message(&format!("Loading import file: {}", file.display())))?;
    let document = transfer::read_export(file)?;
    preview(output, &document)?;

    if !apply {
        return emit(output.warn(
            "Preview mode: No changes made. Use --apply to import configuration.",
        ));
    }

    emit(output.message("Applying import..."))?;
    let report = cw.import(&document)?;
    if report.config_imported {
        emit(output.success("✓ Configuration imported"))?;
    }
    if let Some(err) = &report.config_error {
        emit(output.warn(&format!("⚠ Configuration import failed: {err}")))?;
    }
    for _ in 0..report.invalid {
        emit(output.warn("⚠ Skipping invalid worktree entry"))?;
    }
    for (branch, base) in &report.missing {
        emit(output.warn(&format!(
            "⚠ Branch '{branch}' not found locally. Create it with 'cw new {branch} --base {base}'"
        )))?;
    }
    for branch in &report.imported {
        emit(output.success(&format!("✓ Imported metadata for: {branch}")))?;
    }
    emit(output.success(&format!(
        "✓ Import complete! Imported {} worktree(s)",
        report.imported.len()
    )))
}

/// What an import file contains.
fn preview(output: &dyn Output, document: &ExportDocument) -> Result<()> {
    let unknown = || "unknown".to_string();
    emit(output.heading("Import Preview:"))?;
    emit(output.message(&field(
        "Exported from",
        document
            .repository
            .as_ref()
            .map_or_else(unknown, |path| path.display().to_string()),
        14,
    )))?;
    emit(output.message(&field(
        "Exported at",
        document.exported_at.clone().unwrap_or_else(unknown),
        14,
    )))?;
    emit(output.message(&field("Worktrees", document.worktrees.len(), 14)))?;

    for worktree in &document.worktrees {
        emit(output.message(""))?;
        emit(output.message(&format!(
            "  • {}",
            worktree.branch.clone().unwrap_or_else(unknown)
        )))?;
        emit(output.message(&format!(
            "    Base: {}",
            worktree.base_branch.clone().unwrap_or_else(unknown)
        )))?;
        emit(output.message(&format!(
            "    Original path: {}",
            worktree
                .path
                .as_ref()
                .map_or_else(unknown, |path| path.display().to_string())
        )))?;
    }
    emit(output.message(""))
}
