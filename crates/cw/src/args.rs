use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use libcw::{LookupMode, stash::LATEST_STASH};

#[derive(Parser)]
#[command(name = "cw", author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("color_mode")
        .args(["color", "no_color"])
))]
/// Top-level CLI options for cw.
pub struct Cli {
    /// Operate across every registered repository (list, prune, resume, delete, path)
    #[arg(short = 'g', long, global = true)]
    pub global: bool,

    /// Directory holding config.toml and registry.json
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<String>,

    /// Enable colored output
    #[arg(long, global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Suppress all output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Never prompt: answer yes to confirmations and fail on ambiguous targets
    #[arg(long, global = true)]
    pub no_prompt: bool,

    /// Log git commands and lookups to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    /// The command to execute.
    pub command: Commands,
}

/// Restricts how a target argument is matched.
#[derive(Args, Clone, Copy, Default)]
#[group(multiple = false)]
pub struct LookupArgs {
    /// Match the target only against branch names
    #[arg(short = 'b', long)]
    pub branch: bool,

    /// Match the target only against worktree directory names
    #[arg(short = 'w', long)]
    pub worktree: bool,
}

impl LookupArgs {
    /// The lookup mode selected by the flags, if any.
    pub fn mode(self) -> Option<LookupMode> {
        match (self.branch, self.worktree) {
            (true, _) => Some(LookupMode::Branch),
            (_, true) => Some(LookupMode::Worktree),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
/// CLI subcommands supported by cw.
pub enum Commands {
    /// Create a worktree with a new feature branch and launch the AI tool in it
    New {
        /// Name of the new branch, e.g. fix-auth
        branch: String,

        /// Branch to start from (default: current branch)
        #[arg(short, long, value_name = "BRANCH")]
        base: Option<String>,

        /// Worktree location (default: ../<repo>-<branch>)
        #[arg(short, long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Do not launch the AI tool
        #[arg(long)]
        no_launch: bool,

        /// Launch the AI tool in the background
        #[arg(long)]
        bg: bool,

        /// AI tool command to use instead of the configured one
        #[arg(long, value_name = "CMD")]
        ai_tool: Option<String>,
    },

    /// Rebase a feature branch, merge it into its base and remove the worktree
    Finish {
        /// Branch or worktree to finish (default: current directory)
        target: Option<String>,

        #[command(flatten)]
        /// Lookup restriction for the target.
        lookup: LookupArgs,

        /// Push the base branch to origin after merging
        #[arg(long)]
        push: bool,

        /// Confirm each step before running it
        #[arg(short, long)]
        interactive: bool,

        /// Show the steps without running them
        #[arg(long)]
        dry_run: bool,

        /// Offer to launch the AI tool when the rebase hits conflicts
        #[arg(long)]
        ai_merge: bool,
    },

    /// Launch the AI tool in an existing worktree
    Resume {
        /// Branch or worktree to resume (default: current directory)
        target: Option<String>,

        #[command(flatten)]
        /// Lookup restriction for the target.
        lookup: LookupArgs,

        /// Launch the AI tool in the background
        #[arg(long)]
        bg: bool,

        /// AI tool command to use instead of the configured one
        #[arg(long, value_name = "CMD")]
        ai_tool: Option<String>,
    },

    /// List worktrees with their status
    #[command(alias = "ls")]
    List,

    /// Show the current worktree's metadata and list all worktrees
    Status,

    /// Remove data for worktrees whose directories are gone (-g: prune the registry)
    Prune,

    /// Find repositories with worktrees and register them
    Scan {
        /// Directory to scan (default: home directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<String>,

        /// Maximum directory depth (default: scan_depth from config)
        #[arg(long, value_name = "N")]
        depth: Option<usize>,
    },

    /// Delete worktrees in bulk
    Clean {
        /// Worktrees whose branch is merged into its base
        #[arg(long)]
        merged: bool,

        /// Worktrees whose directory is missing
        #[arg(long)]
        stale: bool,

        /// Worktrees not modified for more than DAYS days
        #[arg(long, value_name = "DAYS")]
        older_than: Option<u64>,

        /// Pick the worktrees to delete by hand
        #[arg(short, long)]
        interactive: bool,

        /// Show what would be deleted
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete a worktree and its branch
    #[command(alias = "rm")]
    Delete {
        /// Branch, worktree name or path
        target: String,

        #[command(flatten)]
        /// Lookup restriction for the target.
        lookup: LookupArgs,

        /// Keep the local branch
        #[arg(long)]
        keep_branch: bool,

        /// Also delete the branch on origin
        #[arg(long)]
        delete_remote: bool,

        /// Refuse to remove a worktree with uncommitted changes
        #[arg(long)]
        no_force: bool,
    },

    /// Rebase feature branches onto their updated base
    Sync {
        /// Branch or worktree to sync (default: current directory)
        target: Option<String>,

        #[command(flatten)]
        /// Lookup restriction for the target.
        lookup: LookupArgs,

        /// Sync every worktree of the repository
        #[arg(long = "all", conflicts_with = "target")]
        all: bool,

        /// Fetch without rebasing
        #[arg(long)]
        fetch_only: bool,

        /// Offer to launch the AI tool when the rebase hits conflicts
        #[arg(long)]
        ai_merge: bool,
    },

    /// Rebase a feature branch onto a different base branch
    ChangeBase {
        /// The new base branch
        new_base: String,

        /// Branch or worktree to move (default: current directory)
        target: Option<String>,

        #[command(flatten)]
        /// Lookup restriction for the target.
        lookup: LookupArgs,

        /// Run an interactive rebase
        #[arg(short, long)]
        interactive: bool,

        /// Show the steps without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare two branches
    Diff {
        /// First branch
        branch1: String,

        /// Second branch
        branch2: String,

        /// Show diff statistics only
        #[arg(short, long, conflicts_with = "files")]
        summary: bool,

        /// Show changed files only
        #[arg(short, long)]
        files: bool,
    },

    /// Check git and every worktree for problems
    Doctor,

    /// Print the path of a worktree
    Path {
        /// Branch, worktree name or repo:branch
        target: String,

        #[command(flatten)]
        /// Lookup restriction for the target.
        lookup: LookupArgs,
    },

    /// Save, list and move stashes between worktrees
    Stash {
        #[command(subcommand)]
        /// The stash action.
        command: StashCommand,
    },

    /// Show feature worktrees as a tree below the repository
    Tree,

    /// Show age and commit statistics of the feature worktrees
    Stats,

    /// Write worktree metadata and settings to a JSON file
    Export {
        /// Output file (default: cw-export-<timestamp>.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Preview or apply an export file
    Import {
        /// File written by `cw export`
        file: PathBuf,

        /// Apply the import instead of previewing it
        #[arg(long)]
        apply: bool,
    },

    /// Inspect or change configuration
    Config {
        #[command(subcommand)]
        /// The config action.
        command: ConfigCommand,
    },
}

impl Commands {
    /// Name of the subcommand as typed.
    pub fn name(&self) -> &'static str {
        match self {
            Self::New { .. } => "new",
            Self::Finish { .. } => "finish",
            Self::Resume { .. } => "resume",
            Self::List => "list",
            Self::Status => "status",
            Self::Prune => "prune",
            Self::Scan { .. } => "scan",
            Self::Clean { .. } => "clean",
            Self::Delete { .. } => "delete",
            Self::Sync { .. } => "sync",
            Self::ChangeBase { .. } => "change-base",
            Self::Diff { .. } => "diff",
            Self::Doctor => "doctor",
            Self::Path { .. } => "path",
            Self::Stash { .. } => "stash",
            Self::Tree => "tree",
            Self::Stats => "stats",
            Self::Export { .. } => "export",
            Self::Import { .. } => "import",
            Self::Config { .. } => "config",
        }
    }

    /// Whether `-g/--global` changes what the command does.
    pub fn supports_global(&self) -> bool {
        matches!(
            self,
            Self::List | Self::Prune | Self::Resume { .. } | Self::Delete { .. } | Self::Path { .. }
        )
    }
}

#[derive(Subcommand)]
/// Actions of `cw config`.
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Set a value (ai-tool, scan-depth, git.default_base_branch)
    Set {
        /// Configuration key
        key: String,

        /// New value; for ai-tool the whole command, e.g. "happy --backend claude"
        value: String,
    },

    /// Use a predefined AI tool command
    UsePreset {
        /// Preset name, see `cw config list-presets`
        preset: String,
    },

    /// List the predefined AI tool commands
    ListPresets,

    /// Restore the default configuration
    Reset,
}

#[derive(Subcommand)]
/// Actions of `cw stash`.
pub enum StashCommand {
    /// Stash the changes of the current worktree, untracked files included
    Save {
        /// Message stored with the stash
        message: Option<String>,
    },

    /// List stashes grouped by the branch they were saved from
    List,

    /// Apply a stash in the worktree of another branch
    Apply {
        /// Branch whose worktree receives the changes
        target: String,

        /// Stash to apply
        #[arg(short, long, default_value = LATEST_STASH)]
        stash: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flag_is_accepted_before_and_after_the_command() {
        let cli = Cli::try_parse_from(["cw", "-g", "list"]).unwrap();
        assert!(cli.global);
        let cli = Cli::try_parse_from(["cw", "path", "app:fix", "--global"]).unwrap();
        assert!(cli.global);
        assert!(cli.command.supports_global());
    }

    #[test]
    fn lookup_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["cw", "finish", "x", "-b", "-w"]).is_err());
        let cli = Cli::try_parse_from(["cw", "delete", "x", "-w"]).unwrap();
        let Commands::Delete { lookup, .. } = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(lookup.mode(), Some(LookupMode::Worktree));
    }

    #[test]
    fn new_uses_b_for_the_base_branch() {
        let cli = Cli::try_parse_from(["cw", "new", "fix", "-b", "develop"]).unwrap();
        let Commands::New { base, .. } = cli.command else {
            panic!("expected new");
        };
        assert_eq!(base.as_deref(), Some("develop"));
    }

    #[test]
    fn diff_formats_conflict() {
        assert!(Cli::try_parse_from(["cw", "diff", "a", "b", "-s", "-f"]).is_err());
    }

    #[test]
    fn stash_apply_defaults_to_the_latest_stash() {
        let cli = Cli::try_parse_from(["cw", "stash", "apply", "feature"]).unwrap();
        let Commands::Stash {
            command: StashCommand::Apply { target, stash },
        } = cli.command
        else {
            panic!("expected stash apply");
        };
        assert_eq!(target, "feature");
        assert_eq!(stash, "stash@{0}");
    }

    #[test]
    fn config_set_takes_key_and_value() {
        let cli =
            Cli::try_parse_from(["cw", "config", "set", "git.default_base_branch", "develop"])
                .unwrap();
        let Commands::Config {
            command: ConfigCommand::Set { key, value },
        } = cli.command
        else {
            panic!("expected config set");
        };
        assert_eq!(key, "git.default_base_branch");
        assert_eq!(value, "develop");
        assert!(Cli::try_parse_from(["cw", "config", "use-preset"]).is_err());
    }
}
