use std::io::{self, Write};

use anyhow::Result;
use libcw::{LookupMode, Worktrees};
use liboutput::Output;

use crate::ui::{OutputChooser, Prompt};

/// Print the path of the resolved worktree on stdout.
///
/// The path is written directly rather than through `Output` so that
/// `cd "$(cw path fix-auth)"` works with `--quiet` too.
pub fn path(
    cw: &Worktrees,
    output: &dyn Output,
    prompt: Prompt,
    target: &str,
    mode: Option<LookupMode>,
    global: bool,
) -> Result<()> {
    let chooser = OutputChooser::new(output);
    let found = cw
        .resolver(prompt.interactive, &chooser)
        .resolve(Some(target), mode, global)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", found.worktree_path.display())?;
    Ok(())
}
