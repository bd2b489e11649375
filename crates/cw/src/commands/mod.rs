//! One module per `cw` subcommand.

/// `cw change-base`.
pub mod change_base;
/// `cw clean`.
pub mod clean;
/// `cw config`.
pub mod config;
/// `cw delete`.
pub mod delete;
/// `cw diff`.
pub mod diff;
/// `cw doctor`.
pub mod doctor;
/// `cw finish`.
pub mod finish;
/// `cw list` and `cw status`.
pub mod list;
/// `cw new`.
pub mod new;
/// `cw path`.
pub mod path;
/// `cw prune` and `cw scan`.
pub mod registry;
/// `cw resume`.
pub mod resume;
/// `cw stash`.
pub mod stash;
/// `cw stats`.
pub mod stats;
/// `cw sync`.
pub mod sync;
/// `cw export` and `cw import`.
pub mod transfer;
/// `cw tree`.
pub mod tree;
