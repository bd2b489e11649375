use anyhow::Result;
use libcw::{CwError, FinishPlan, LookupMode, MetadataSource, RebaseOutcome, Worktrees};
use liboutput::Output;

use crate::ui::{
    OutputChooser, Prompt, StepAnswer, StoppedRebase, confirm_step, emit, field,
    handle_stopped_rebase, render_dry_run,
};

/// Options of `cw finish`.
pub struct FinishRequest<'a> {
    /// Branch or worktree to finish.
    pub target: Option<&'a str>,
    /// Lookup restriction.
    pub mode: Option<LookupMode>,
    /// Push the base branch afterwards.
    pub push: bool,
    /// Confirm each step.
    pub interactive: bool,
    /// Only list the steps.
    pub dry_run: bool,
    /// Offer the AI tool on conflicts.
    pub ai_merge: bool,
}

/// Ask about `step` when stepping interactively. `Ok(false)` skips it.
fn should_run(output: &dyn Output, stepping: bool, step: &str) -> Result<bool> {
    if !stepping {
        return Ok(true);
    }
    match confirm_step(output, step)? {
        StepAnswer::Run => Ok(true),
        StepAnswer::Skip => Ok(false),
        StepAnswer::Quit => {
            emit(output.warn("Aborting..."))?;
            Err(CwError::UserAborted.into())
        }
    }
}

/// Run the `cw finish` command logic.
pub fn finish(
    cw: &Worktrees,
    output: &dyn Output,
    prompt: Prompt,
    request: FinishRequest<'_>,
) -> Result<()> {
    if request.interactive && !prompt.interactive && !prompt.no_prompt {
        return Err(CwError::OperationError(
            "--interactive needs a terminal; use --no-prompt to run every step".to_string(),
        )
        .into());
    }
    let stepping = request.interactive && prompt.interactive;

    let chooser = OutputChooser::new(output);
    let found = cw
        .resolver(prompt.interactive, &chooser)
        .resolve(request.target, request.mode, false)?;
    let plan = cw.finish_plan(&found, request.push)?;

    emit(output.heading("Finishing worktree:"))?;
    emit(output.message(&field("Feature", &plan.feature_branch, 8)))?;
    emit(output.message(&field("Base", &plan.base_branch, 8)))?;
    emit(output.message(&field("Repo", plan.base_path.display(), 8)))?;
    emit(output.message(""))?;
    if plan.metadata_source == MetadataSource::Inferred {
        emit(output.warn(&format!(
            "⚠ No metadata recorded for '{}'; using base '{}' at {}",
            plan.feature_branch,
            plan.base_branch,
            plan.base_path.display()
        )))?;
    }

    if request.dry_run {
        return render_dry_run(output, &plan.steps());
    }

    if !should_run(
        output,
        stepping,
        &format!("Rebase {} onto {}", plan.feature_branch, plan.base_branch),
    )? {
        return emit(output.warn("Skipping rebase step..."));
    }

    let spinner = output.spinner("Fetching updates from remote...");
    let fetched = cw.fetch(&plan.feature_path);
    spinner.finish();
    let onto = cw.rebase_target(&plan.feature_path, &plan.base_branch, fetched?)?;

    emit(output.message(&format!(
        "Rebasing {} onto {onto}...",
        plan.feature_branch
    )))?;
    if let RebaseOutcome::Stopped {
        onto,
        conflicted_files,
    } = cw.rebase(&plan.feature_path, &onto, false)?
    {
        return handle_stopped_rebase(
            cw,
            output,
            prompt,
            StoppedRebase {
                worktree: &plan.feature_path,
                branch: &plan.feature_branch,
                onto: &onto,
                conflicted_files,
            },
            request.ai_merge,
            "cw finish",
        );
    }
    emit(output.success("✓ Rebase successful"))?;

    integrate(cw, output, &plan, stepping)
}

/// Merge, push and cleanup steps of a finish whose rebase succeeded.
fn integrate(cw: &Worktrees, output: &dyn Output, plan: &FinishPlan, stepping: bool) -> Result<()> {
    if !should_run(
        output,
        stepping,
        &format!("Merge {} into {}", plan.feature_branch, plan.base_branch),
    )? {
        return emit(output.warn("Skipping merge step..."));
    }
    emit(output.message(&format!(
        "Merging {} into {}...",
        plan.feature_branch, plan.base_branch
    )))?;
    if cw.merge_into_base(plan)? {
        emit(output.message(&format!(
            "Switched base worktree to '{}'",
            plan.base_branch
        )))?;
    }
    emit(output.success(&format!(
        "✓ Merged {} into {}",
        plan.feature_branch, plan.base_branch
    )))?;

    if plan.push {
        if should_run(
            output,
            stepping,
            &format!("Push {} to origin", plan.base_branch),
        )? {
            emit(output.message(&format!("Pushing {} to origin...", plan.base_branch)))?;
            match cw.push_base(plan) {
                Ok(()) => emit(output.success("✓ Pushed to origin"))?,
                Err(err) => emit(output.warn(&format!("⚠ Push failed: {err}")))?,
            }
        } else {
            emit(output.warn("Skipping push step..."))?;
        }
    }

    if !should_run(
        output,
        stepping,
        &format!(
            "Remove worktree and delete branch {}",
            plan.feature_branch
        ),
    )? {
        return emit(output.warn("Skipping cleanup step..."));
    }
    emit(output.message("Cleaning up worktree and branch..."))?;
    cw.cleanup_finished(plan)?;
    emit(output.success("✓ Cleanup complete!"))
}
