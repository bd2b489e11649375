use std::path::Path;

use anyhow::Result;
use libcw::{LaunchMode, Worktrees};
use liboutput::Output;

use crate::ui::{emit, field, launch_ai_tool};

/// Options of `cw new`.
pub struct NewRequest<'a> {
    /// Branch to create.
    pub branch: &'a str,
    /// Branch to start from.
    pub base: Option<&'a str>,
    /// Custom worktree location.
    pub path: Option<&'a Path>,
    /// Skip launching the AI tool.
    pub no_launch: bool,
    /// Launch the AI tool detached.
    pub background: bool,
}

/// Run the `cw new` command logic.
pub fn new(cw: &Worktrees, output: &dyn Output, request: NewRequest<'_>) -> Result<()> {
    let plan = cw.plan_new(request.branch, request.base, request.path)?;

    emit(output.heading("Creating new worktree:"))?;
    emit(output.message(&field("Base branch", &plan.base_branch, 12)))?;
    emit(output.message(&field("New branch", &plan.branch, 12)))?;
    emit(output.message(&field("Path", plan.path.display(), 12)))?;
    emit(output.message(""))?;

    let spinner = output.spinner("Fetching and creating worktree...");
    let created = cw.create(&plan);
    spinner.finish();
    let created = created?;

    if !created.fetched {
        emit(output.warn("⚠ Fetch failed or no remote configured"))?;
    }
    emit(output.success("✓ Worktree created successfully"))?;
    if let Some(err) = &created.registry_error {
        emit(output.warn(&format!("⚠ Could not register repository: {err}")))?;
    }

    if request.no_launch {
        emit(output.message(&format!("cd {}", created.path.display())))?;
        return Ok(());
    }

    let mode = if request.background {
        LaunchMode::Background
    } else {
        LaunchMode::Foreground
    };
    launch_ai_tool(cw, output, &created.path, mode)
}
