use std::path::{Path, PathBuf};

use anyhow::Result;
use libcw::{LookupMode, MetadataSource, RebaseOutcome, WorktreeStatus, Worktrees};
use liboutput::Output;

use crate::ui::{OutputChooser, Prompt, StoppedRebase, emit, field, handle_stopped_rebase};

/// Options of `cw sync`.
pub struct SyncRequest<'a> {
    /// Branch or worktree to sync.
    pub target: Option<&'a str>,
    /// Lookup restriction.
    pub mode: Option<LookupMode>,
    /// Sync every feature worktree.
    pub all: bool,
    /// Stop after fetching.
    pub fetch_only: bool,
    /// Offer the AI tool on conflicts.
    pub ai_merge: bool,
}

/// A worktree selected for syncing.
struct SyncTarget {
    /// Checked-out branch.
    branch: String,
    /// Worktree path.
    path: PathBuf,
}

/// A rebase that stopped during sync.
struct Stopped {
    /// Revision rebased onto.
    onto: String,
    /// Files with conflicts.
    conflicted_files: Vec<String>,
}

/// Run the `cw sync` command logic.
pub fn sync(
    cw: &Worktrees,
    output: &dyn Output,
    prompt: Prompt,
    request: SyncRequest<'_>,
) -> Result<()> {
    let repo_root = cw.main_repo()?;
    let targets = if request.all {
        let mut targets = Vec::new();
        for worktree in cw.feature_worktrees()? {
            if worktree.status == WorktreeStatus::Stale {
                emit(output.warn(&format!(
                    "⚠ {}: directory missing, skipping",
                    worktree.branch
                )))?;
                continue;
            }
            targets.push(SyncTarget {
                branch: worktree.branch,
                path: worktree.path,
            });
        }
        targets
    } else {
        let chooser = OutputChooser::new(output);
        let found = cw
            .resolver(prompt.interactive, &chooser)
            .resolve(request.target, request.mode, false)?;
        vec![SyncTarget {
            branch: found.branch_name,
            path: found.worktree_path,
        }]
    };

    let spinner = output.spinner("Fetching updates from remote...");
    let fetched = cw.fetch(&repo_root);
    spinner.finish();
    let fetched = fetched?;
    if fetched {
        emit(output.success("✓ Fetch complete"))?;
    } else {
        emit(output.warn("⚠ Fetch failed or no remote configured"))?;
    }
    if request.fetch_only {
        return Ok(());
    }

    for target in &targets {
        let result = sync_one(cw, output, &repo_root, target, fetched);
        let stopped = match result {
            Ok(None) => continue,
            Ok(Some(stopped)) => stopped,
            Err(err) if request.all => {
                emit(output.fail(&format!("✗ {err:#}")))?;
                emit(output.message("Continuing with remaining worktrees..."))?;
                continue;
            }
            Err(err) => return Err(err),
        };

        if request.all {
            let err = cw.abort_rebase(
                &target.path,
                &target.branch,
                &stopped.onto,
                stopped.conflicted_files,
                None,
            );
            emit(output.fail(&format!("✗ {err}")))?;
            emit(output.message("Continuing with remaining worktrees..."))?;
            continue;
        }
        return handle_stopped_rebase(
            cw,
            output,
            prompt,
            StoppedRebase {
                worktree: &target.path,
                branch: &target.branch,
                onto: &stopped.onto,
                conflicted_files: stopped.conflicted_files,
            },
            request.ai_merge,
            "cw sync",
        );
    }

    emit(output.success("✓ Sync complete!"))
}

/// Rebase one worktree onto its base.
fn sync_one(
    cw: &Worktrees,
    output: &dyn Output,
    repo_root: &Path,
    target: &SyncTarget,
    fetched: bool,
) -> Result<Option<Stopped>> {
    let metadata = cw.sync_metadata(repo_root, &target.branch)?;

    emit(output.message(""))?;
    emit(output.heading("Syncing worktree:"))?;
    emit(output.message(&field("Feature", &target.branch, 8)))?;
    emit(output.message(&field("Base", &metadata.base_branch, 8)))?;
    emit(output.message(&field("Path", target.path.display(), 8)))?;
    if metadata.source == MetadataSource::Inferred {
        emit(output.warn(&format!(
            "⚠ No metadata recorded for '{}'; assuming base '{}'",
            target.branch, metadata.base_branch
        )))?;
    }

    let onto = cw.rebase_target(&target.path, &metadata.base_branch, fetched)?;
    emit(output.message(&format!("Rebasing {} onto {onto}...", target.branch)))?;
    match cw.rebase(&target.path, &onto, false)? {
        RebaseOutcome::Rebased { .. } => {
            emit(output.success("✓ Rebase successful"))?;
            Ok(None)
        }
        RebaseOutcome::Stopped {
            onto,
            conflicted_files,
        } => Ok(Some(Stopped {
            onto,
            conflicted_files,
        })),
    }
}
