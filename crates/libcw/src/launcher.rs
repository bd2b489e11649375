use std::{borrow::Cow, path::Path};

use shell_escape::unix::escape;

use crate::{error::Result, process};

/// Extra flag appended when the assistant is Claude.
const CLAUDE_AUTONOMY_FLAG: &str = "--dangerously-skip-permissions";

/// How the assistant process relates to `cw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Attach to the terminal and wait for exit.
    Foreground,
    /// Start detached and return immediately.
    Background,
}

/// What happened when launching the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// No command is configured.
    Disabled,
    /// The configured program is not on `PATH`.
    NotInstalled {
        /// Program that was looked up.
        program: String,
    },
    /// The assistant ran in the foreground and exited.
    Exited {
        /// Program that ran.
        program: String,
        /// Its exit code.
        code: i32,
    },
    /// The assistant was started in the background.
    Spawned {
        /// Program that was started.
        program: String,
        /// Process id of the login shell running it.
        pid: u32,
    },
}

/// Render `command` as a single shell-quoted line.
pub fn shell_line(command: &[String]) -> String {
    let mut parts: Vec<Cow<'_, str>> = command
        .iter()
        .map(|part| escape(Cow::Borrowed(part.as_str())))
        .collect();
    if command.first().is_some_and(|program| program == "claude")
        && !command.iter().any(|arg| arg == CLAUDE_AUTONOMY_FLAG)
    {
        parts.push(Cow::Borrowed(CLAUDE_AUTONOMY_FLAG));
    }
    parts.join(" ")
}

/// Launch the AI assistant `command` in `path` through a login shell.
pub fn launch(command: &[String], path: &Path, mode: LaunchMode) -> Result<LaunchOutcome> {
    let Some(program) = command.first() else {
        return Ok(LaunchOutcome::Disabled);
    };
    if !process::has_command(program) {
        return Ok(LaunchOutcome::NotInstalled {
            program: program.clone(),
        });
    }

    let line = shell_line(command);
    match mode {
        LaunchMode::Foreground => {
            let code = process::run_attached("bash", &["-lc", &line], path)?;
            Ok(LaunchOutcome::Exited {
                program: program.clone(),
                code,
            })
        }
        LaunchMode::Background => {
            let pid = process::spawn_detached("bash", &["-lc", &line], path)?;
            Ok(LaunchOutcome::Spawned {
                program: program.clone(),
                pid,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn shell_line_quotes_arguments() {
        let line = shell_line(&strings(&["aider", "--message", "fix the bug's cause"]));
        assert_eq!(line, r#"aider --message 'fix the bug'\''s cause'"#);
    }

    #[test]
    fn claude_gets_autonomy_flag_once() {
        assert_eq!(
            shell_line(&strings(&["claude"])),
            "claude --dangerously-skip-permissions"
        );
        assert_eq!(
            shell_line(&strings(&["claude", "--dangerously-skip-permissions"])),
            "claude --dangerously-skip-permissions"
        );
    }

    #[test]
    fn empty_command_is_disabled() {
        let tmp = tempdir().unwrap();
        let outcome = launch(&[], tmp.path(), LaunchMode::Foreground).unwrap();
        assert_eq!(outcome, LaunchOutcome::Disabled);
    }

    #[test]
    fn missing_program_is_reported_not_run() {
        let tmp = tempdir().unwrap();
        let outcome = launch(
            &strings(&["cw-test-assistant-that-does-not-exist"]),
            tmp.path(),
            LaunchMode::Background,
        )
        .unwrap();
        assert_eq!(
            outcome,
            LaunchOutcome::NotInstalled {
                program: "cw-test-assistant-that-does-not-exist".to_string()
            }
        );
    }

    #[test]
    fn foreground_launch_reports_exit_code() {
        let tmp = tempdir().unwrap();
        let outcome = launch(&strings(&["true"]), tmp.path(), LaunchMode::Foreground).unwrap();
        assert_eq!(
            outcome,
            LaunchOutcome::Exited {
                program: "true".to_string(),
                code: 0
            }
        );
    }
}
