use anyhow::Result;
use libcw::{LaunchMode, LookupMode, Worktrees};
use liboutput::Output;

use crate::ui::{OutputChooser, Prompt, emit, launch_ai_tool};

/// Run the `cw resume` command logic.
pub fn resume(
    cw: &Worktrees,
    output: &dyn Output,
    prompt: Prompt,
    target: Option<&str>,
    mode: Option<LookupMode>,
    global: bool,
    background: bool,
) -> Result<()> {
    let chooser = OutputChooser::new(output);
    let found = cw
        .resolver(prompt.interactive, &chooser)
        .resolve(target, mode, global)?;

    if cw.config().ai_tool.is_empty() {
        emit(output.warn("AI tool launching is disabled"))?;
        return emit(output.message(&format!("cd {}", found.worktree_path.display())));
    }

    emit(output.message(&format!(
        "Resuming {} in: {}",
        cw.config().ai_tool_display(),
        found.worktree_path.display()
    )))?;
    let launch = if background {
        LaunchMode::Background
    } else {
        LaunchMode::Foreground
    };
    launch_ai_tool(cw, output, &found.worktree_path, launch)
}
