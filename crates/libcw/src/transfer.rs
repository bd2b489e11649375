//! Export and import of worktree metadata and settings.
//!
//! An export is a JSON document holding the stored configuration and the
//! base-branch metadata of every feature worktree. Importing it on another
//! machine restores the configuration and the metadata of branches that
//! exist there.

use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use chrono::{Local, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::Config,
    error::{CwError, Result},
    git, inventory,
    metadata::MetadataStore,
    resolve,
    worktrees::Worktrees,
};

/// Format version written into exports.
pub const EXPORT_VERSION: &str = "1.0";

/// Default export file name for the current time, e.g. `cw-export-20250101-120000.json`.
pub fn default_export_file() -> PathBuf {
    PathBuf::from(format!(
        "cw-export-{}.json",
        Local::now().format("%Y%m%d-%H%M%S")
    ))
}

/// Serialized export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Format version.
    pub export_version: String,
    /// When the export was written.
    #[serde(default)]
    pub exported_at: Option<String>,
    /// Main repository the export was taken from.
    #[serde(default)]
    pub repository: Option<PathBuf>,
    /// Stored configuration as raw JSON; decoded only when applied.
    #[serde(default)]
    pub config: Option<Value>,
    /// Feature worktrees.
    #[serde(default)]
    pub worktrees: Vec<ExportedWorktree>,
}

/// Metadata of one exported worktree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportedWorktree {
    /// Checked-out branch.
    pub branch: Option<String>,
    /// Recorded base branch.
    pub base_branch: Option<String>,
    /// Recorded base repository path.
    pub base_path: Option<PathBuf>,
    /// Worktree path on the exporting machine.
    pub path: Option<PathBuf>,
    /// Status at export time.
    pub status: Option<String>,
}

/// What an applied import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Whether the configuration file was replaced.
    pub config_imported: bool,
    /// Why the configuration could not be imported.
    pub config_error: Option<String>,
    /// Branches whose metadata was recorded.
    pub imported: Vec<String>,
    /// `(branch, base)` pairs skipped because the branch does not exist locally.
    pub missing: Vec<(String, String)>,
    /// Entries without a branch or base branch.
    pub invalid: usize,
}

/// Read and validate an export file.
pub fn read_export(file: &Path) -> Result<ExportDocument> {
    if !file.exists() {
        return Err(CwError::OperationError(format!(
            "Import file not found: {}",
            file.display()
        )));
    }
    let contents = fs::read_to_string(file).map_err(read_error)?;
    let raw: Value = serde_json::from_str(&contents).map_err(read_error)?;
    if raw.get("export_version").is_none() {
        return Err(CwError::OperationError(
            "Invalid export file format".to_string(),
        ));
    }
    serde_json::from_value(raw).map_err(read_error)
}

/// Failure to load an import file.
fn read_error(err: impl Display) -> CwError {
    CwError::OperationError(format!("Failed to read import file: {err}"))
}

impl Worktrees {
    /// Collect the stored configuration and the metadata of every feature worktree.
    pub fn export(&self) -> Result<ExportDocument> {
        let repo = self.main_repo()?;
        let store = MetadataStore::new(&repo);
        let config = Config::load(self.config_dir())?;

        let mut worktrees = Vec::new();
        for record in inventory::list_worktrees(&repo)? {
            if record.is_detached() || resolve::same_path(&record.path, &repo) {
                continue;
            }
            let branch = record.branch_name().to_string();
            worktrees.push(ExportedWorktree {
                base_branch: store.base_branch(&branch)?,
                base_path: store.base_path(&branch)?,
                status: Some(inventory::worktree_status(&record.path, self.cwd()).to_string()),
                path: Some(record.path),
                branch: Some(branch),
            });
        }

        Ok(ExportDocument {
            export_version: EXPORT_VERSION.to_string(),
            exported_at: Some(Utc::now().to_rfc3339()),
            repository: Some(repo),
            config: Some(serde_json::to_value(config).map_err(|e| {
                CwError::OperationError(format!("Failed to encode configuration: {e}"))
            })?),
            worktrees,
        })
    }

    /// Write [`Worktrees::export`] to `file` as pretty-printed JSON.
    pub fn export_to(&self, file: &Path) -> Result<ExportDocument> {
        let document = self.export()?;
        let encoded = serde_json::to_string_pretty(&document).map_err(|e| {
            CwError::OperationError(format!("Failed to encode export: {e}"))
        })?;
        fs::write(file, encoded + "\n").map_err(|e| {
            CwError::OperationError(format!("Failed to write export file: {e}"))
        })?;
        debug!("exported {} worktree(s) to {}", document.worktrees.len(), file.display());
        Ok(document)
    }

    /// Apply an export: replace the configuration and record the metadata of
    /// branches that exist in the current repository.
    pub fn import(&self, document: &ExportDocument) -> Result<ImportReport> {
        let repo = self.main_repo()?;
        let store = MetadataStore::new(&repo);
        let mut report = ImportReport::default();

        if let Some(raw) = &document.config {
            match serde_json::from_value::<Config>(raw.clone()) {
                Ok(config) => match config.save(self.config_dir()) {
                    Ok(()) => report.config_imported = true,
                    Err(err) => report.config_error = Some(err.to_string()),
                },
                Err(err) => {
                    warn!("skipping configuration in import: {err}");
                    report.config_error = Some(err.to_string());
                }
            }
        }

        for worktree in &document.worktrees {
            let (Some(branch), Some(base)) = (&worktree.branch, &worktree.base_branch) else {
                report.invalid += 1;
                continue;
            };
            if !git::rev_exists(&repo, branch)? {
                report.missing.push((branch.clone(), base.clone()));
                continue;
            }
            store.record(branch, base, &repo)?;
            report.imported.push(branch.clone());
        }

        Ok(report)
    }
}
