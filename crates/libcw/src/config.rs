use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{
    error::{CwError, Result},
    registry::DEFAULT_SCAN_DEPTH,
};

/// Environment variable overriding the config directory.
pub const ENV_CONFIG_DIR: &str = "CW_CONFIG_DIR";

/// Environment variable overriding the AI tool command (whitespace separated, empty disables).
pub const ENV_AI_TOOL: &str = "CW_AI_TOOL";

/// Name of the config file inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Config directory below the home directory.
const DEFAULT_CONFIG_SUBDIR: &str = ".config/claude-worktree";

/// Default AI assistant command.
const DEFAULT_AI_TOOL: &str = "claude";

/// Named AI tool commands selectable with `config use-preset`.
pub const AI_TOOL_PRESETS: &[(&str, &[&str])] = &[
    ("no-op", &[]),
    ("claude", &["claude"]),
    ("codex", &["codex"]),
    ("happy", &["happy"]),
    (
        "happy-codex",
        &["happy", "codex", "--permission-mode", "bypassPermissions"],
    ),
    ("happy-yolo", &["happy", "--yolo"]),
];

/// Keys accepted by [`Config::set`].
pub const SETTABLE_KEYS: &[&str] = &["ai-tool", "scan-depth", "git.default_base_branch"];

/// User settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command (program and arguments) launched in worktrees. Empty disables launching.
    pub ai_tool: Vec<String>,
    /// Maximum directory depth for `scan`.
    pub scan_depth: usize,
    /// Git-related settings.
    pub git: GitSettings,
}

/// The `[git]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Base branch for `new` when `--base` is not given. Unset means the
    /// branch checked out in the current worktree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_base_branch: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai_tool: vec![DEFAULT_AI_TOOL.to_string()],
            scan_depth: DEFAULT_SCAN_DEPTH,
            git: GitSettings::default(),
        }
    }
}

impl Config {
    /// Load `config.toml` from `config_dir`, falling back to defaults when absent.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        read_config(&path).map_err(|e| CwError::Config(format!("{e:#}")))
    }

    /// Atomically write this configuration to `config.toml` in `config_dir`.
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        write_config(self, config_dir).map_err(|e| CwError::Config(format!("{e:#}")))
    }

    /// Replace the stored configuration with the defaults.
    pub fn reset(config_dir: &Path) -> Result<Self> {
        let config = Self::default();
        config.save(config_dir)?;
        Ok(config)
    }

    /// Set one of [`SETTABLE_KEYS`] from its command-line form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "ai-tool" | "ai_tool" => {
                self.ai_tool = value.split_whitespace().map(str::to_string).collect();
            }
            "scan-depth" | "scan_depth" => {
                self.scan_depth = value.trim().parse().map_err(|_| {
                    CwError::Config(format!("scan-depth must be a number, got '{value}'"))
                })?;
            }
            "git.default_base_branch" => {
                let value = value.trim();
                self.git.default_base_branch = (!value.is_empty()).then(|| value.to_string());
            }
            _ => {
                return Err(CwError::Config(format!(
                    "Unknown configuration key '{key}'. Valid keys: {}",
                    SETTABLE_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Switch the AI tool to the preset called `name`.
    pub fn use_preset(&mut self, name: &str) -> Result<()> {
        let command = preset(name).ok_or_else(|| {
            let names: Vec<&str> = AI_TOOL_PRESETS.iter().map(|(name, _)| *name).collect();
            CwError::Config(format!(
                "Unknown preset '{name}'. Available presets: {}",
                names.join(", ")
            ))
        })?;
        self.ai_tool = command.iter().map(|arg| (*arg).to_string()).collect();
        Ok(())
    }

    /// Apply an AI tool override given as a single whitespace-separated string.
    pub fn with_ai_tool_override(mut self, command: Option<&str>) -> Self {
        if let Some(command) = command {
            self.ai_tool = command.split_whitespace().map(str::to_string).collect();
        }
        self
    }

    /// The AI tool command rendered for display.
    pub fn ai_tool_display(&self) -> String {
        if self.ai_tool.is_empty() {
            "(disabled)".to_string()
        } else {
            self.ai_tool.join(" ")
        }
    }
}

/// Read and decode a config file.
fn read_config(path: &Path) -> anyhow::Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Encode `config` and replace the file in `config_dir`.
fn write_config(config: &Config, config_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(config_dir).with_context(|| {
        format!("Failed to create config directory {}", config_dir.display())
    })?;
    let encoded = toml::to_string_pretty(config).context("Failed to encode config")?;
    let path = config_dir.join(CONFIG_FILE);
    let mut file = NamedTempFile::new_in(config_dir).with_context(|| {
        format!("Failed to create temporary file in {}", config_dir.display())
    })?;
    file.write_all(encoded.as_bytes())
        .context("Failed to write config")?;
    file.persist(&path)
        .with_context(|| format!("Failed to replace config file {}", path.display()))?;
    Ok(())
}

/// Command of the AI tool preset called `name`.
pub fn preset(name: &str) -> Option<&'static [&'static str]> {
    AI_TOOL_PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, command)| *command)
}

/// Default config directory: `~/.config/claude-worktree`.
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CONFIG_SUBDIR))
        .ok_or_else(|| CwError::Config("cannot determine home directory".to_string()))
}
