use anyhow::Result;
use libcw::{
    Config, Worktrees,
    config::{AI_TOOL_PRESETS, CONFIG_FILE},
    git,
};
use liboutput::Output;

use crate::ui::{emit, field};

/// Width of the labels in `config show`.
const LABEL_WIDTH: usize = 14;

/// Print the effective configuration and where it lives.
pub fn show(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    let file = cw.config_dir().join(CONFIG_FILE);
    let config = cw.config();

    emit(output.heading("Configuration:"))?;
    let location = if file.exists() {
        file.display().to_string()
    } else {
        format!("{} (not present, using defaults)", file.display())
    };
    emit(output.message(&field("Config file", location, LABEL_WIDTH)))?;
    emit(output.message(&field(
        "Registry",
        cw.registry().path().display(),
        LABEL_WIDTH,
    )))?;
    emit(output.message(&field("AI tool", config.ai_tool_display(), LABEL_WIDTH)))?;
    emit(output.message(&field(
        "Default base",
        config
            .git
            .default_base_branch
            .as_deref()
            .unwrap_or("(current branch)"),
        LABEL_WIDTH,
    )))?;
    emit(output.message(&field("Scan depth", config.scan_depth, LABEL_WIDTH)))?;

    if let Ok(repo) = git::main_repo_root(cw.cwd()) {
        let registered = match cw.registry().entry(&repo)? {
            Some(entry) => format!(
                "registered as '{}' since {}",
                entry.name,
                entry.registered_at.format("%Y-%m-%d")
            ),
            None => "not registered".to_string(),
        };
        emit(output.message(&field("Repository", registered, LABEL_WIDTH)))?;
    }
    Ok(())
}

/// Run `cw config set`.
pub fn set(cw: &Worktrees, output: &dyn Output, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load(cw.config_dir())?;
    config.set(key, value)?;
    config.save(cw.config_dir())?;
    let label = if key == "ai-tool" { "AI tool set to" } else { key };
    emit(output.success(&format!("✓ {label}: {value}")))
}

/// Run `cw config use-preset`.
pub fn use_preset(cw: &Worktrees, output: &dyn Output, preset: &str) -> Result<()> {
    let mut config = Config::load(cw.config_dir())?;
    config.use_preset(preset)?;
    config.save(cw.config_dir())?;
    emit(output.success(&format!("✓ Using preset: {preset}")))
}

/// Run `cw config list-presets`.
pub fn list_presets(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    let stored = Config::load(cw.config_dir())?;
    let width = AI_TOOL_PRESETS
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    emit(output.heading("Available AI tool presets:"))?;
    for (name, command) in AI_TOOL_PRESETS {
        let current = if stored.ai_tool.iter().map(String::as_str).eq(command.iter().copied()) {
            " (current)"
        } else {
            ""
        };
        let command = if command.is_empty() {
            "(no tool launched)".to_string()
        } else {
            command.join(" ")
        };
        emit(output.message(&format!("  {name:<width$}  {command}{current}")))?;
    }
    Ok(())
}

/// Run `cw config reset`.
pub fn reset(cw: &Worktrees, output: &dyn Output) -> Result<()> {
    Config::reset(cw.config_dir())?;
    emit(output.success("✓ Configuration reset to defaults"))
}
