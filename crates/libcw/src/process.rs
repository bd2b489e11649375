use std::{
    path::Path,
    process::{Command, Stdio},
};

use log::debug;

use crate::error::{CwError, Result};

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code, or `-1` when terminated by a signal.
    pub code: i32,
    /// Captured stdout (stderr is folded in for diagnostics).
    pub stdout: String,
}

impl CommandOutput {
    /// Whether the command exited successfully.
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Stdout with surrounding whitespace removed.
    pub fn trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Render a command line for diagnostics.
fn command_line(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program];
    parts.extend_from_slice(args);
    parts.join(" ")
}

/// Run `program` with `args` in `cwd`, capturing its output regardless of exit status.
///
/// Only a failure to spawn the process is reported as an error; callers inspect
/// [`CommandOutput::code`] themselves.
pub fn run(program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
    let line = command_line(program, args);
    let output = Command::new(program)
        .current_dir(cwd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| CwError::Git {
            command: line.clone(),
            output: format!("failed to execute: {e}"),
        })?;

    let code = output.status.code().unwrap_or(-1);
    debug!("{line} (in {}) exited with {code}", cwd.display());

    let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if code != 0 {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !stdout.is_empty() && !stdout.ends_with('\n') {
                stdout.push('\n');
            }
            stdout.push_str(&stderr);
        }
    }

    Ok(CommandOutput { code, stdout })
}

/// Run `program` with `args` in `cwd`, failing with [`CwError::Git`] on a non-zero exit.
pub fn run_checked(program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
    let output = run(program, args, cwd)?;
    if !output.success() {
        return Err(CwError::Git {
            command: command_line(program, args),
            output: output.stdout.trim().to_string(),
        });
    }
    Ok(output)
}

/// Run `program` attached to the current terminal and wait for it to exit.
pub fn run_attached(program: &str, args: &[&str], cwd: &Path) -> Result<i32> {
    let line = command_line(program, args);
    let status = Command::new(program)
        .current_dir(cwd)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| CwError::Git {
            command: line.clone(),
            output: format!("failed to execute: {e}"),
        })?;
    let code = status.code().unwrap_or(-1);
    debug!("{line} (attached, in {}) exited with {code}", cwd.display());
    Ok(code)
}

/// Start `program` detached from the current process without waiting for it.
pub fn spawn_detached(program: &str, args: &[&str], cwd: &Path) -> Result<u32> {
    let line = command_line(program, args);
    let child = Command::new(program)
        .current_dir(cwd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| CwError::Git {
            command: line.clone(),
            output: format!("failed to execute: {e}"),
        })?;
    debug!("{line} spawned in background as pid {}", child.id());
    Ok(child.id())
}

/// Check whether `name` resolves to an executable on `PATH`.
pub fn has_command(name: &str) -> bool {
    which::which(name).is_ok()
}
