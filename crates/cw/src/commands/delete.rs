use anyhow::Result;
use libcw::{DeleteOptions, DeleteReport, LookupMode, RemoteDeletion, Worktrees};
use liboutput::Output;

use crate::ui::{OutputChooser, Prompt, emit};

/// Options of `cw delete`.
pub struct DeleteRequest<'a> {
    /// Branch, worktree name or path.
    pub target: &'a str,
    /// Lookup restriction.
    pub mode: Option<LookupMode>,
    /// Look across registered repositories.
    pub global: bool,
    /// How much to remove.
    pub options: DeleteOptions,
}

/// Run the `cw delete` command logic.
pub fn delete(
    cw: &Worktrees,
    output: &dyn Output,
    prompt: Prompt,
    request: DeleteRequest<'_>,
) -> Result<()> {
    let chooser = OutputChooser::new(output);
    let resolver = cw.resolver(prompt.interactive, &chooser);
    let plan = cw.delete_plan(&resolver, request.target, request.mode, request.global)?;

    emit(output.message(&format!(
        "Removing worktree: {}",
        plan.worktree_path.display()
    )))?;
    if let Some(branch) = plan.branch.as_deref()
        && !request.options.keep_branch
    {
        emit(output.message(&format!("Deleting local branch: {branch}")))?;
        if request.options.delete_remote {
            emit(output.message(&format!("Deleting remote branch: origin/{branch}")))?;
        }
    }

    let report = cw.delete(&plan, request.options)?;
    render_report(output, &report)
}

/// Report what a delete removed.
fn render_report(output: &dyn Output, report: &DeleteReport) -> Result<()> {
    emit(output.success("✓ Worktree removed"))?;
    if report.branch_deleted.is_some() {
        emit(output.success("✓ Local branch and metadata removed"))?;
    }
    match &report.remote {
        RemoteDeletion::Skipped => Ok(()),
        RemoteDeletion::Deleted => emit(output.success("✓ Remote branch deleted")),
        RemoteDeletion::Failed(err) => {
            emit(output.warn(&format!("⚠ Remote branch deletion failed: {err}")))
        }
    }
}
