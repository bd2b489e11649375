//! Cross-repository catalog of repositories that use worktrees.
//!
//! The registry is a single JSON document:
//!
//! ```json
//! { "version": 1, "repositories": { "/abs/path": { "name": "...", "registered_at": "...", "last_seen": "..." } } }
//! ```
//!
//! Top-level keys this version does not understand are carried through rewrites.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::{
    error::{CwError, Result},
    inventory,
};

/// Current on-disk format version.
pub const REGISTRY_VERSION: u32 = 1;

/// File name of the registry inside the config directory.
pub const REGISTRY_FILE: &str = "registry.json";

/// Default scan depth below the starting directory.
pub const DEFAULT_SCAN_DEPTH: usize = 5;

/// Directory names never descended into while scanning.
const SCAN_SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".cache",
    ".npm",
    ".yarn",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".nox",
    ".eggs",
    "dist",
    "build",
    "target",
    ".git",
    "Library",
    ".Trash",
    ".local",
    "Applications",
    ".cargo",
    ".rustup",
    ".pyenv",
    ".nvm",
    ".rbenv",
    ".goenv",
    ".volta",
    "site-packages",
    ".mypy_cache",
    ".ruff_cache",
    ".pytest_cache",
    "coverage",
    ".next",
    ".nuxt",
    ".output",
    ".turbo",
];

/// Stored facts about one registered repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Display name (the repository directory name).
    pub name: String,
    /// When the repository was first registered.
    pub registered_at: DateTime<Utc>,
    /// When the repository was last registered or used.
    pub last_seen: DateTime<Utc>,
}

/// A registered repository as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRepo {
    /// Display name.
    pub name: String,
    /// Absolute repository path.
    pub path: PathBuf,
}

/// Serialized form of the registry file.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    /// Format version.
    version: u32,
    /// Entries keyed by canonical repository path.
    repositories: BTreeMap<String, RegistryEntry>,
    /// Top-level keys not understood by this version.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Default for RegistryDocument {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            repositories: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

/// Handle to the registry file.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Location of `registry.json`.
    path: PathBuf,
}

impl Registry {
    /// Registry stored in `config_dir`.
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(REGISTRY_FILE),
        }
    }

    /// Location of the registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, treating a missing file as empty.
    fn load(&self) -> anyhow::Result<RegistryDocument> {
        if !self.path.exists() {
            return Ok(RegistryDocument::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read registry {}", self.path.display()))?;
        let document: RegistryDocument = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse registry {}", self.path.display()))?;
        if document.version > REGISTRY_VERSION {
            bail!(
                "registry {} has version {}, newer than supported version {REGISTRY_VERSION}",
                self.path.display(),
                document.version
            );
        }
        Ok(document)
    }

    /// Atomically replace the file with `document`.
    fn save(&self, document: &RegistryDocument) -> anyhow::Result<()> {
        let dir = self
            .path
            .parent()
            .context("Registry path has no parent directory")?;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;

        let encoded =
            serde_json::to_string_pretty(document).context("Failed to encode registry")?;
        let mut file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        file.write_all(encoded.as_bytes())
            .context("Failed to write registry")?;
        file.write_all(b"\n").context("Failed to write registry")?;
        file.persist(&self.path)
            .with_context(|| format!("Failed to replace registry {}", self.path.display()))?;
        Ok(())
    }

    /// Register the repository at `repo`, refreshing `last_seen` when already present.
    pub fn register(&self, repo: &Path) -> Result<RegistryEntry> {
        let canonical = repo.canonicalize()?;
        let key = canonical.to_string_lossy().into_owned();
        let mut document = self.load().map_err(registry_error)?;
        let now = Utc::now();

        let entry = document
            .repositories
            .entry(key)
            .and_modify(|entry| entry.last_seen = now)
            .or_insert_with(|| RegistryEntry {
                name: repo_name(&canonical),
                registered_at: now,
                last_seen: now,
            })
            .clone();

        self.save(&document).map_err(registry_error)?;
        Ok(entry)
    }

    /// Drop entries whose path is gone or no longer holds a `.git` directory.
    ///
    /// Returns the removed paths. The file is rewritten only when something was removed.
    pub fn prune(&self) -> Result<Vec<PathBuf>> {
        let mut document = self.load().map_err(registry_error)?;
        let removed: Vec<String> = document
            .repositories
            .keys()
            .filter(|path| !Path::new(path).join(".git").is_dir())
            .cloned()
            .collect();

        if removed.is_empty() {
            return Ok(Vec::new());
        }
        for path in &removed {
            document.repositories.remove(path);
        }
        self.save(&document).map_err(registry_error)?;
        Ok(removed.into_iter().map(PathBuf::from).collect())
    }

    /// Every registered repository, ordered by path.
    pub fn repositories(&self) -> Result<Vec<RegisteredRepo>> {
        let document = self.load().map_err(registry_error)?;
        Ok(document
            .repositories
            .into_iter()
            .map(|(path, entry)| RegisteredRepo {
                name: entry.name,
                path: PathBuf::from(path),
            })
            .collect())
    }

    /// Stored entry for `repo`, if registered.
    pub fn entry(&self, repo: &Path) -> Result<Option<RegistryEntry>> {
        let key = repo
            .canonicalize()
            .unwrap_or_else(|_| repo.to_path_buf())
            .to_string_lossy()
            .into_owned();
        let mut document = self.load().map_err(registry_error)?;
        Ok(document.repositories.remove(&key))
    }
}

/// Wrap a file-level failure as a registry error.
fn registry_error(err: anyhow::Error) -> CwError {
    CwError::Registry(format!("{err:#}"))
}

/// Display name for a repository path.
fn repo_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Whether `path` is a main repository root (linked worktrees have a `.git` file).
fn is_main_repository(path: &Path) -> bool {
    path.join(".git").is_dir()
}

/// Whether the repository at `path` has worktrees beyond its main one.
fn has_linked_worktrees(path: &Path) -> bool {
    inventory::list_worktrees(path).is_ok_and(|records| records.len() > 1)
}

/// Find repositories with linked worktrees below `base_dir`.
///
/// Entries are visited in sorted order. Hidden directories and well-known
/// dependency and build directories are skipped, and a qualifying repository is
/// not descended into.
pub fn scan_for_repos(base_dir: &Path, max_depth: usize) -> Vec<PathBuf> {
    let base = base_dir
        .canonicalize()
        .unwrap_or_else(|_| base_dir.to_path_buf());
    let mut found = Vec::new();
    scan_dir(&base, 0, max_depth, &mut found);
    found
}

/// Recursive step of [`scan_for_repos`].
fn scan_dir(current: &Path, depth: usize, max_depth: usize, found: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let mut entries: Vec<PathBuf> = match fs::read_dir(current) {
        Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(err) => {
            debug!("skipping unreadable directory {}: {err}", current.display());
            return;
        }
    };
    entries.sort();

    for entry in entries {
        if !entry.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || SCAN_SKIP_DIRS.contains(&name) {
            continue;
        }

        if is_main_repository(&entry) && has_linked_worktrees(&entry) {
            found.push(entry);
            continue;
        }

        scan_dir(&entry, depth + 1, max_depth, found);
    }
}
