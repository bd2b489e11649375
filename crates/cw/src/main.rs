#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Command-line interface for feature-branch worktrees, built on the libcw crate.

use std::{
    env,
    io::{self, IsTerminal, Write},
    path::PathBuf,
    process,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use libcw::{CleanCriteria, Config, CwError, DeleteOptions, Worktrees, config, git::DiffFormat};
use liboutput::{Output, Quiet, Terminal};
use log::{LevelFilter, warn};

/// Command-line definition.
mod args;
/// One module per subcommand.
mod commands;
/// Prompting and rendering helpers shared by the commands.
mod ui;
/// Small environment and path helpers.
mod utils;

use args::{Cli, Commands, ConfigCommand, StashCommand};
use commands::{
    change_base::ChangeBaseRequest, delete::DeleteRequest, finish::FinishRequest,
    new::NewRequest, sync::SyncRequest,
};
use ui::Prompt;

/// Environment variable holding the log filter.
const ENV_LOG: &str = "CW_LOG";

/// Route `log` records to stderr. `--verbose` overrides `CW_LOG`.
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().filter_or(ENV_LOG, "warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

/// Config directory (priority: CLI flag > env var > default).
fn config_dir(flag: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(utils::expand_tilde(dir));
    }
    if let Ok(dir) = env::var(config::ENV_CONFIG_DIR)
        && !dir.is_empty()
    {
        return Ok(utils::expand_tilde(&dir));
    }
    Ok(config::default_config_dir()?)
}

/// CLI entrypoint.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none()
    };

    let output: Arc<dyn Output> = if cli.quiet {
        Arc::new(Quiet)
    } else {
        Arc::new(Terminal::new(color))
    };

    if let Err(e) = run(cli, output.as_ref()) {
        if color && io::stdout().is_terminal() {
            print!("\x1b[0m");
            if let Err(flush_err) = io::stdout().flush() {
                eprintln!("Failed to flush stdout while resetting colors: {flush_err}");
            }
        }

        let exit_code = match e.downcast_ref::<CwError>() {
            Some(err @ CwError::UserAborted) => err.exit_code(),
            Some(err) => {
                report(output.as_ref(), &e);
                err.exit_code()
            }
            None => {
                report(output.as_ref(), &e);
                1
            }
        };
        if let Err(finish_err) = output.finish() {
            eprintln!("Failed to flush output handler: {finish_err:#}");
        }
        process::exit(exit_code);
    }
    Ok(())
}

/// Print a failure through the output handler.
fn report(output: &dyn Output, e: &anyhow::Error) {
    if let Err(display_err) = output.fail(&format!("Error: {e:#}")) {
        eprintln!("Failed to report error via output handler: {display_err:#}");
    }
}

/// Execute the selected CLI command using the provided output implementation.
fn run(cli: Cli, output: &dyn Output) -> Result<()> {
    if cli.global && !cli.command.supports_global() {
        return Err(CwError::OperationError(format!(
            "--global is not supported by '{}'",
            cli.command.name()
        ))
        .into());
    }

    let config_dir = config_dir(cli.config_dir.as_deref())?;
    let flag_ai_tool = match &cli.command {
        Commands::New { ai_tool, .. } | Commands::Resume { ai_tool, .. } => ai_tool.clone(),
        _ => None,
    };
    let stored = match Config::load(&config_dir) {
        Ok(config) => config,
        Err(err)
            if matches!(
                cli.command,
                Commands::Config {
                    command: ConfigCommand::Reset
                }
            ) =>
        {
            warn!("ignoring unreadable config before reset: {err}");
            Config::default()
        }
        Err(err) => return Err(err.into()),
    };
    let config = stored
        .with_ai_tool_override(env::var(config::ENV_AI_TOOL).ok().as_deref())
        .with_ai_tool_override(flag_ai_tool.as_deref());
    let cwd = env::current_dir().context("Failed to determine the current directory")?;
    let cw = Worktrees::new(cwd, &config_dir, config);
    let prompt = Prompt::detect(cli.no_prompt, cli.quiet);
    let global = cli.global;

    match cli.command {
        Commands::New {
            branch,
            base,
            path,
            no_launch,
            bg,
            ai_tool: _,
        } => commands::new::new(
            &cw,
            output,
            NewRequest {
                branch: &branch,
                base: base.as_deref(),
                path: path.as_deref(),
                no_launch,
                background: bg,
            },
        )?,
        Commands::Finish {
            target,
            lookup,
            push,
            interactive,
            dry_run,
            ai_merge,
        } => commands::finish::finish(
            &cw,
            output,
            prompt,
            FinishRequest {
                target: target.as_deref(),
                mode: lookup.mode(),
                push,
                interactive,
                dry_run,
                ai_merge,
            },
        )?,
        Commands::Resume {
            target, lookup, bg, ..
        } => commands::resume::resume(
            &cw,
            output,
            prompt,
            target.as_deref(),
            lookup.mode(),
            global,
            bg,
        )?,
        Commands::List if global => commands::list::global_list(&cw, output)?,
        Commands::List => commands::list::list(&cw, output)?,
        Commands::Status => commands::list::status(&cw, output)?,
        Commands::Prune if global => commands::registry::global_prune(&cw, output)?,
        Commands::Prune => commands::registry::prune(&cw, output)?,
        Commands::Scan { dir, depth } => {
            let dir = match dir {
                Some(dir) => utils::expand_tilde(&dir),
                None => dirs::home_dir().ok_or_else(|| {
                    CwError::Config("cannot determine home directory".to_string())
                })?,
            };
            let depth = depth.unwrap_or(cw.config().scan_depth);
            commands::registry::scan(&cw, output, &dir, depth)?;
        }
        Commands::Clean {
            merged,
            stale,
            older_than,
            interactive,
            dry_run,
        } => commands::clean::clean(
            &cw,
            output,
            prompt,
            CleanCriteria {
                merged,
                stale,
                older_than_days: older_than,
            },
            interactive,
            dry_run,
        )?,
        Commands::Delete {
            target,
            lookup,
            keep_branch,
            delete_remote,
            no_force,
        } => commands::delete::delete(
            &cw,
            output,
            prompt,
            DeleteRequest {
                target: &target,
                mode: lookup.mode(),
                global,
                options: DeleteOptions {
                    keep_branch,
                    delete_remote,
                    force: !no_force,
                },
            },
        )?,
        Commands::Sync {
            target,
            lookup,
            all,
            fetch_only,
            ai_merge,
        } => commands::sync::sync(
            &cw,
            output,
            prompt,
            SyncRequest {
                target: target.as_deref(),
                mode: lookup.mode(),
                all,
                fetch_only,
                ai_merge,
            },
        )?,
        Commands::ChangeBase {
            new_base,
            target,
            lookup,
            interactive,
            dry_run,
        } => commands::change_base::change_base(
            &cw,
            output,
            prompt,
            ChangeBaseRequest {
                new_base: &new_base,
                target: target.as_deref(),
                mode: lookup.mode(),
                interactive,
                dry_run,
            },
        )?,
        Commands::Diff {
            branch1,
            branch2,
            summary,
            files,
        } => {
            let format = if summary {
                DiffFormat::Stat
            } else if files {
                DiffFormat::NameStatus
            } else {
                DiffFormat::Full
            };
            commands::diff::diff(&cw, output, &branch1, &branch2, format)?;
        }
        Commands::Doctor => commands::doctor::doctor(&cw, output)?,
        Commands::Path { target, lookup } => {
            commands::path::path(&cw, output, prompt, &target, lookup.mode(), global)?;
        }
        Commands::Stash { command } => match command {
            StashCommand::Save { message } => {
                commands::stash::save(&cw, output, message.as_deref())?;
            }
            StashCommand::List => commands::stash::list(&cw, output)?,
            StashCommand::Apply { target, stash } => {
                commands::stash::apply(&cw, output, &target, &stash)?;
            }
        },
        Commands::Tree => commands::tree::tree(&cw, output)?,
        Commands::Stats => commands::stats::stats(&cw, output)?,
        Commands::Export { output: file } => {
            commands::transfer::export(&cw, output, file.as_deref())?;
        }
        Commands::Import { file, apply } => {
            commands::transfer::import(&cw, output, &file, apply)?;
        }
        Commands::Config { command } => match command {
            ConfigCommand::Show => commands::config::show(&cw, output)?,
            ConfigCommand::Set { key, value } => {
                commands::config::set(&cw, output, &key, &value)?;
            }
            ConfigCommand::UsePreset { preset } => {
                commands::config::use_preset(&cw, output, &preset)?;
            }
            ConfigCommand::ListPresets => commands::config::list_presets(&cw, output)?,
            ConfigCommand::Reset => commands::config::reset(&cw, output)?,
        },
    }

    output.finish().map_err(ui::map_output_error)?;
    Ok(())
}
