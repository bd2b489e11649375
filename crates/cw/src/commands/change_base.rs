use anyhow::Result;
use libcw::{CwError, LookupMode, RebaseOutcome, Worktrees};
use liboutput::Output;

use crate::ui::{OutputChooser, Prompt, emit, field, render_dry_run};

/// Options of `cw change-base`.
pub struct ChangeBaseRequest<'a> {
    /// The new base branch.
    pub new_base: &'a str,
    /// Branch or worktree to move.
    pub target: Option<&'a str>,
    /// Lookup restriction.
    pub mode: Option<LookupMode>,
    /// Run `git rebase -i`.
    pub interactive: bool,
    /// Only list the steps.
    pub dry_run: bool,
}

/// Run the `cw change-base` command logic.
pub fn change_base(
    cw: &Worktrees,
    output: &dyn Output,
    prompt: Prompt,
    request: ChangeBaseRequest<'_>,
) -> Result<()> {
    if request.interactive && !request.dry_run && !prompt.interactive {
        return Err(CwError::OperationError(
            "--interactive rebase needs a terminal".to_string(),
        )
        .into());
    }

    let chooser = OutputChooser::new(output);
    let found = cw
        .resolver(prompt.interactive, &chooser)
        .resolve(request.target, request.mode, false)?;
    let plan = cw.change_base_plan(&found, request.new_base)?;

    emit(output.heading("Changing base branch:"))?;
    emit(output.message(&field("Feature", &plan.feature_branch, 13)))?;
    emit(output.message(&field("Current base", &plan.current_base, 13)))?;
    emit(output.message(&field("New base", &plan.new_base, 13)))?;
    emit(output.message(&field("Path", plan.worktree_path.display(), 13)))?;
    emit(output.message(""))?;

    if request.dry_run {
        return render_dry_run(output, &plan.steps());
    }

    let spinner = output.spinner("Fetching updates from remote...");
    let fetched = cw.fetch(&plan.repo_root);
    spinner.finish();
    let onto = cw.rebase_target(&plan.worktree_path, &plan.new_base, fetched?)?;

    emit(output.message(&format!(
        "Rebasing {} onto {onto}...",
        plan.feature_branch
    )))?;
    if let RebaseOutcome::Stopped {
        onto,
        conflicted_files,
    } = cw.rebase(&plan.worktree_path, &onto, request.interactive)?
    {
        return Err(cw
            .abort_rebase(
                &plan.worktree_path,
                &plan.feature_branch,
                &onto,
                conflicted_files,
                None,
            )
            .into());
    }
    emit(output.success("✓ Rebase successful"))?;

    cw.apply_change_base(&plan)?;
    emit(output.success(&format!(
        "✓ Base branch changed from {} to {}",
        plan.current_base, plan.new_base
    )))
}
