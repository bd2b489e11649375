#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Core library for the `cw` git worktree workflow.
//!
//! Worktrees are created per feature branch next to the main repository,
//! handed to an AI coding assistant, then rebased and merged back into the
//! branch they started from. This crate holds the git plumbing, the
//! per-branch metadata kept in git config, the cross-repository registry and
//! the resolution of user-supplied targets. The CLI binary in `crates/cw`
//! builds on top of it.

/// Configuration file and defaults.
pub mod config;
/// Error type shared by every operation.
mod error;
/// Helper routines for interacting with Git repositories.
pub mod git;
/// Parsing of the worktree listing and worktree status.
pub mod inventory;
/// Launching the AI assistant inside a worktree.
pub mod launcher;
/// Per-branch facts stored in the repository config.
pub mod metadata;
/// External process execution.
pub mod process;
/// Cross-repository catalog.
pub mod registry;
/// Resolution of targets to worktrees.
pub mod resolve;
/// Stashes shared across worktrees.
pub mod stash;
/// Export and import of metadata and settings.
pub mod transfer;
/// Plans and reports exchanged with callers.
mod types;
/// High-level orchestration of the worktree workflow.
mod worktrees;

pub use config::Config;
pub use error::{CwError, Result};
pub use inventory::{WorktreeRecord, WorktreeStatus};
pub use launcher::{LaunchMode, LaunchOutcome};
pub use metadata::{MetadataSource, MetadataStore, WorktreeMetadata};
pub use registry::Registry;
pub use resolve::{Chooser, LookupMode, ResolutionMatch, TargetResolver};
pub use stash::StashEntry;
pub use transfer::{ExportDocument, ImportReport};
pub use types::*;
pub use worktrees::{Worktrees, default_worktree_path, format_age};
