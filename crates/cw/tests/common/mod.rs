#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use anyhow::{Context, Result, ensure};
use tempfile::TempDir;

/// Return the path to the compiled `cw` binary.
pub fn cw_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cw"))
}

/// Run a git command inside `repo_path`, ensuring it succeeds.
pub fn git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    ensure!(
        output.status.success(),
        "git command failed: git {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(output)
}

/// Initialise a repository on `main` at `repo_path` with a README commit.
pub fn init_repository(repo_path: &Path) -> Result<()> {
    fs::create_dir_all(repo_path)?;
    git(repo_path, &["init", "-b", "main"])?;
    git(repo_path, &["config", "user.email", "test@example.com"])?;
    git(repo_path, &["config", "user.name", "Test User"])?;

    fs::write(repo_path.join("README.md"), "# Test Project")?;
    git(repo_path, &["add", "README.md"])?;
    git(repo_path, &["commit", "-m", "Initial commit"])?;
    Ok(())
}

/// Commit `contents` to `file` in the worktree at `path`.
pub fn commit_file(path: &Path, file: &str, contents: &str) -> Result<()> {
    fs::write(path.join(file), contents)?;
    git(path, &["add", file])?;
    git(path, &["commit", "-m", &format!("Add {file}")])?;
    Ok(())
}

/// A throwaway repository named `app` plus a private config directory.
pub struct Fixture {
    /// Holds every directory of the fixture.
    pub temp: TempDir,
    /// Main working tree.
    pub repo: PathBuf,
    /// Value of `CW_CONFIG_DIR`.
    pub config_dir: PathBuf,
}

impl Fixture {
    /// Create the fixture repository.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        let repo = root.join("app");
        init_repository(&repo)?;
        let config_dir = root.join("config");
        fs::create_dir_all(&config_dir)?;
        Ok(Self {
            temp,
            repo,
            config_dir,
        })
    }

    /// Default location of the worktree for `branch`.
    pub fn worktree_path(&self, branch: &str) -> PathBuf {
        self.repo
            .with_file_name(format!("app-{}", branch.replace('/', "-")))
    }

    /// `cw` command running in `dir` with no prompts and no AI tool.
    pub fn command_in(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(cw_binary());
        cmd.current_dir(dir)
            .env("CW_CONFIG_DIR", &self.config_dir)
            .env("CW_AI_TOOL", "")
            .env("CW_NON_INTERACTIVE", "1")
            .env_remove("CW_LOG")
            .stdin(Stdio::null());
        cmd
    }

    /// Run `cw` in `dir` with `args`.
    pub fn run_in(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        self.command_in(dir)
            .args(args)
            .output()
            .with_context(|| format!("failed to run cw {}", args.join(" ")))
    }

    /// Run `cw` in the main repository.
    pub fn run(&self, args: &[&str]) -> Result<Output> {
        self.run_in(&self.repo, args)
    }

    /// Run `cw` in the main repository, ensuring it succeeds, and return stdout.
    pub fn run_ok(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        ensure!(
            output.status.success(),
            "cw {} failed\nstdout: {}\nstderr: {}",
            args.join(" "),
            stdout(&output),
            stderr(&output)
        );
        Ok(stdout(&output))
    }

    /// Create a worktree for `branch` with `cw new`.
    pub fn new_worktree(&self, branch: &str) -> Result<PathBuf> {
        self.run_ok(&["new", branch, "--no-launch"])?;
        Ok(self.worktree_path(branch))
    }
}

/// Captured stdout as text.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Captured stderr as text.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
