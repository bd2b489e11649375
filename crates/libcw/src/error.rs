use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Custom Result type for cw operations.
pub type Result<T> = StdResult<T, CwError>;

/// cw-specific error types.
#[derive(Error, Debug)]
pub enum CwError {
    /// The current directory (or the given path) is not inside a git repository.
    #[error("Not a git repository: {path}")]
    NotARepository {
        /// Path that was inspected.
        path: PathBuf,
    },

    /// A branch name is invalid or its branch could not be determined.
    #[error("Invalid branch: {message}")]
    InvalidBranch {
        /// Human-readable error description.
        message: String,
    },

    /// No worktree matched the requested target.
    #[error("{message}")]
    WorktreeNotFound {
        /// The user-supplied target token, when one was given.
        target: Option<String>,
        /// Human-readable error description.
        message: String,
    },

    /// A target matched more than one distinct worktree and no choice could be made.
    #[error("{}", ambiguity_message(.target, .candidates, .hint))]
    AmbiguousTarget {
        /// The user-supplied target token.
        target: String,
        /// Every candidate considered, rendered as `label → path`.
        candidates: Vec<String>,
        /// Advice on how to disambiguate explicitly.
        hint: String,
    },

    /// An external command exited with a non-zero status.
    #[error("Command failed: {command}\n{output}")]
    Git {
        /// The command line that was executed.
        command: String,
        /// Captured output of the command, preserved verbatim.
        output: String,
    },

    /// A rebase stopped on conflicts and was aborted (or left for resolution).
    #[error("{message}")]
    RebaseConflict {
        /// Branch being rebased.
        branch: String,
        /// Files reported as conflicted.
        conflicted_files: Vec<String>,
        /// Human-readable error description including recovery steps.
        message: String,
    },

    /// A fast-forward merge into the base branch failed.
    #[error("{message}")]
    MergeConflict {
        /// Branch being merged.
        branch: String,
        /// Human-readable error description including recovery steps.
        message: String,
    },

    /// Worktree metadata is absent and could not be inferred.
    #[error("Metadata missing for branch '{branch}': {message}")]
    MetadataMissing {
        /// Feature branch whose metadata was requested.
        branch: String,
        /// Human-readable error description.
        message: String,
    },

    /// The global repository registry could not be read or written.
    #[error("Registry error: {0}")]
    Registry(String),

    /// The configuration file could not be read or written.
    #[error("Config error: {0}")]
    Config(String),

    /// The operation was cancelled by the user.
    #[error("Aborted by user")]
    UserAborted,

    /// A high-level operation failed.
    #[error("Operation failed: {0}")]
    OperationError(String),

    /// An underlying I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl CwError {
    /// Return the recommended process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UserAborted => 130,
            Self::WorktreeNotFound { .. } | Self::AmbiguousTarget { .. } => 2,
            Self::InvalidBranch { .. } | Self::NotARepository { .. } => 2,
            Self::MetadataMissing { .. } => 3,
            Self::Git { .. } => 4,
            Self::RebaseConflict { .. } | Self::MergeConflict { .. } => 5,
            _ => 1,
        }
    }

    /// Build a not-found error for a target token.
    pub(crate) fn not_found(target: Option<&str>, message: impl Into<String>) -> Self {
        Self::WorktreeNotFound {
            target: target.map(str::to_string),
            message: message.into(),
        }
    }

    /// Build an invalid-branch error.
    pub(crate) fn invalid_branch(message: impl Into<String>) -> Self {
        Self::InvalidBranch {
            message: message.into(),
        }
    }
}

/// Render the message for [`CwError::AmbiguousTarget`].
fn ambiguity_message(target: &str, candidates: &[String], hint: &str) -> String {
    let mut lines = vec![format!("Ambiguous target '{target}' matches:")];
    for (index, candidate) in candidates.iter().enumerate() {
        lines.push(format!("  [{}] {candidate}", index + 1));
    }
    lines.push(hint.to_string());
    lines.join("\n")
}
