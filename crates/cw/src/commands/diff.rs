use anyhow::Result;
use libcw::{Worktrees, git::DiffFormat};
use liboutput::Output;

use crate::ui::emit;

/// Run the `cw diff` command logic.
pub fn diff(
    cw: &Worktrees,
    output: &dyn Output,
    branch1: &str,
    branch2: &str,
    format: DiffFormat,
) -> Result<()> {
    let diff = cw.diff(branch1, branch2, format)?;

    emit(output.heading("Comparing branches:"))?;
    emit(output.message(&format!("  {branch1} ... {branch2}")))?;
    emit(output.message(""))?;
    if diff.trim().is_empty() {
        return emit(output.message("No differences found"));
    }
    emit(output.message(diff.trim_end()))
}
