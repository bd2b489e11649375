use std::{fmt::Display, path::Path, result::Result as StdResult};

use anyhow::Result;
use libcw::{Chooser, CwError, LaunchMode, LaunchOutcome, Worktrees, process};
use liboutput::{Output, OutputError};

use crate::utils;

/// Convert output-layer failures into domain errors.
pub fn map_output_error(err: OutputError) -> CwError {
    match err {
        OutputError::Cancelled => CwError::UserAborted,
        other => CwError::OperationError(format!("Output operation failed: {other}")),
    }
}

/// Emit an output result, mapping errors into `CwError`.
pub fn emit(result: StdResult<(), OutputError>) -> Result<()> {
    result.map_err(map_output_error)?;
    Ok(())
}

/// How a command may interact with the user.
#[derive(Debug, Clone, Copy)]
pub struct Prompt {
    /// Prompts can be shown.
    pub interactive: bool,
    /// `--no-prompt`: confirmations are answered with yes.
    pub no_prompt: bool,
}

impl Prompt {
    /// Work out the prompt policy from the global flags and the environment.
    pub fn detect(no_prompt: bool, quiet: bool) -> Self {
        Self {
            interactive: !no_prompt && !quiet && utils::can_prompt(),
            no_prompt,
        }
    }
}

/// Yes/no question. Answered yes under `--no-prompt`, no when prompts are unavailable.
pub fn prompt_confirm(output: &dyn Output, prompt: Prompt, question: &str) -> Result<bool> {
    if prompt.no_prompt {
        return Ok(true);
    }
    if !prompt.interactive {
        return Ok(false);
    }
    Ok(output.confirm(question).map_err(map_output_error)?)
}

/// Destructive confirmation requiring the user to type `yes`.
///
/// Under `--no-prompt` it passes; without a terminal it fails rather than
/// deleting unattended.
pub fn confirm_typed(output: &dyn Output, prompt: Prompt, question: &str) -> Result<bool> {
    if prompt.no_prompt {
        return Ok(true);
    }
    if !prompt.interactive {
        return Err(CwError::OperationError(format!(
            "{question} needs confirmation. Re-run with --no-prompt to proceed without prompting."
        ))
        .into());
    }
    emit(output.warn(question))?;
    let answer = output
        .input("Type 'yes' to confirm")
        .map_err(map_output_error)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

/// Answer to a per-step confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAnswer {
    /// Run the step.
    Run,
    /// Skip the step.
    Skip,
    /// Stop the whole command.
    Quit,
}

/// Ask whether to run `step`.
pub fn confirm_step(output: &dyn Output, step: &str) -> Result<StepAnswer> {
    emit(output.warn(&format!("Next step: {step}")))?;
    let options = ["Yes", "No", "Quit"].map(str::to_string);
    let answer = match output.select("Continue?", &options) {
        Ok(0) => StepAnswer::Run,
        Ok(1) => StepAnswer::Skip,
        Ok(_) | Err(OutputError::Cancelled) => StepAnswer::Quit,
        Err(err) => return Err(map_output_error(err).into()),
    };
    Ok(answer)
}

/// Numbered-list chooser used by the target resolver.
pub struct OutputChooser<'a> {
    /// Where the list is shown and the answer read.
    output: &'a dyn Output,
}

impl<'a> OutputChooser<'a> {
    /// Chooser prompting through `output`.
    pub fn new(output: &'a dyn Output) -> Self {
        Self { output }
    }
}

impl Chooser for OutputChooser<'_> {
    fn choose(&self, prompt: &str, options: &[String]) -> libcw::Result<usize> {
        self.output.warn(prompt).map_err(map_output_error)?;
        for (index, option) in options.iter().enumerate() {
            self.output
                .message(&format!("  [{}] {option}", index + 1))
                .map_err(map_output_error)?;
        }
        let count = options.len();
        loop {
            let answer = self
                .output
                .input(&format!("Which one? [1-{count}]"))
                .map_err(map_output_error)?;
            match answer.trim().parse::<usize>() {
                Ok(choice) if (1..=count).contains(&choice) => return Ok(choice - 1),
                _ => self
                    .output
                    .warn(&format!("Please enter a number between 1 and {count}"))
                    .map_err(map_output_error)?,
            }
        }
    }
}

/// Launch the configured AI tool in `path` and report what happened.
pub fn launch_ai_tool(
    cw: &Worktrees,
    output: &dyn Output,
    path: &Path,
    mode: LaunchMode,
) -> Result<()> {
    if mode == LaunchMode::Foreground
        && let Some(program) = cw.config().ai_tool.first()
        && process::has_command(program)
    {
        emit(output.message(&format!("Starting {program} (Ctrl+C to exit)...")))?;
    }
    let outcome = cw.launch(path, mode)?;
    render_launch(output, &outcome)
}

/// Report the result of launching the AI tool.
fn render_launch(output: &dyn Output, outcome: &LaunchOutcome) -> Result<()> {
    match outcome {
        LaunchOutcome::Disabled => Ok(()),
        LaunchOutcome::NotInstalled { program } => emit(output.warn(&format!(
            "⚠ {program} not detected. Install it or set ai_tool in config.toml."
        ))),
        LaunchOutcome::Spawned { program, pid } => {
            emit(output.success(&format!("✓ {program} running in background (pid {pid})")))
        }
        LaunchOutcome::Exited { program, code } if *code != 0 => {
            emit(output.warn(&format!("{program} exited with status {code}")))
        }
        LaunchOutcome::Exited { .. } => Ok(()),
    }
}

/// List files left conflicted by a stopped rebase.
pub fn render_conflicts(output: &dyn Output, files: &[String]) -> Result<()> {
    emit(output.warn("⚠ Rebase conflicts detected!"))?;
    emit(output.message("Conflicted files:"))?;
    for file in files {
        emit(output.message(&format!("  • {file}")))?;
    }
    Ok(())
}

/// Steps to take after the AI tool exits with the rebase still in progress.
pub fn render_ai_followup(output: &dyn Output, rerun: &str) -> Result<()> {
    emit(output.warn("After resolving conflicts with AI:"))?;
    emit(output.message("  1. Stage resolved files: git add <files>"))?;
    emit(output.message("  2. Continue rebase: git rebase --continue"))?;
    emit(output.message(&format!("  3. Re-run: {rerun}")))
}

/// Render `steps` as a numbered dry-run listing.
pub fn render_dry_run(output: &dyn Output, steps: &[String]) -> Result<()> {
    emit(output.warn("DRY RUN MODE - No changes will be made"))?;
    emit(output.heading("The following operations would be performed:"))?;
    for (index, step) in steps.iter().enumerate() {
        emit(output.message(&format!("  {}. {step}", index + 1)))?;
    }
    emit(output.message(""))?;
    emit(output.message("Run without --dry-run to execute these operations."))
}

/// `label: value` line with the label padded to `width`.
pub fn field(label: &str, value: impl Display, width: usize) -> String {
    format!("  {:<width$} {value}", format!("{label}:"))
}

/// A rebase stopped on conflicts at `worktree`.
pub struct StoppedRebase<'a> {
    /// Worktree where the rebase runs.
    pub worktree: &'a Path,
    /// Branch being rebased.
    pub branch: &'a str,
    /// Revision rebased onto.
    pub onto: &'a str,
    /// Files with conflicts.
    pub conflicted_files: Vec<String>,
}

/// Deal with a stopped rebase: with `ai_merge` and the user's consent the
/// rebase stays in progress and the AI tool is launched, otherwise the
/// rebase is aborted and the returned error explains how to redo it.
pub fn handle_stopped_rebase(
    cw: &Worktrees,
    output: &dyn Output,
    prompt: Prompt,
    stopped: StoppedRebase<'_>,
    ai_merge: bool,
    rerun: &str,
) -> Result<()> {
    if ai_merge && !stopped.conflicted_files.is_empty() {
        render_conflicts(output, &stopped.conflicted_files)?;
        if prompt_confirm(
            output,
            prompt,
            "Would you like AI to help resolve these conflicts?",
        )? {
            emit(output.message("Launching AI tool with conflict context..."))?;
            launch_ai_tool(cw, output, stopped.worktree, LaunchMode::Foreground)?;
            return render_ai_followup(output, rerun);
        }
    }

    let tip = (!ai_merge).then_some("Tip: Use --ai-merge flag to get AI assistance with conflicts");
    Err(cw
        .abort_rebase(
            stopped.worktree,
            stopped.branch,
            stopped.onto,
            stopped.conflicted_files,
            tip,
        )
        .into())
}
