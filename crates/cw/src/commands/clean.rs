use anyhow::Result;
use libcw::{CleanCandidate, CleanCriteria, CwError, DeleteOptions, FeatureWorktree, Worktrees};
use liboutput::Output;

use crate::ui::{Prompt, confirm_typed, emit, map_output_error};

/// Batches larger than this need a typed confirmation.
const CONFIRM_THRESHOLD: usize = 3;

/// Run the `cw clean` command logic.
pub fn clean(
    cw: &Worktrees,
    output: &dyn Output,
    prompt: Prompt,
    criteria: CleanCriteria,
    interactive: bool,
    dry_run: bool,
) -> Result<()> {
    let candidates = if interactive {
        if !prompt.interactive {
            return Err(CwError::OperationError(
                "--interactive needs a terminal to pick worktrees".to_string(),
            )
            .into());
        }
        let picked = pick_worktrees(output, cw.feature_worktrees()?)?;
        if picked.is_empty() {
            return emit(output.warn("No worktrees selected for deletion"));
        }
        picked
    } else {
        if criteria.is_empty() {
            return Err(CwError::OperationError(
                "Please specify at least one cleanup criterion: --merged, --stale, --older-than, or -i/--interactive"
                    .to_string(),
            )
            .into());
        }
        cw.clean_candidates(criteria)?
    };

    if candidates.is_empty() {
        return emit(output.success("✓ No worktrees match the cleanup criteria"));
    }

    let prefix = if dry_run { "DRY RUN: " } else { "" };
    emit(output.heading(&format!("{prefix}Worktrees to delete:")))?;
    for candidate in &candidates {
        emit(output.message(&format!(
            "  • {} ({})",
            candidate.worktree.branch,
            candidate.reasons.join(", ")
        )))?;
        emit(output.message(&format!(
            "    Path: {}",
            candidate.worktree.path.display()
        )))?;
    }
    emit(output.message(""))?;

    if dry_run {
        emit(output.message(&format!(
            "Would delete {} worktree(s)",
            candidates.len()
        )))?;
        return emit(output.message("Run without --dry-run to actually delete them"));
    }

    if (interactive || candidates.len() > CONFIRM_THRESHOLD)
        && !confirm_typed(
            output,
            prompt,
            &format!("Delete {} worktree(s)?", candidates.len()),
        )?
    {
        return emit(output.warn("Deletion cancelled"));
    }

    let mut deleted = 0;
    for candidate in &candidates {
        let branch = &candidate.worktree.branch;
        emit(output.message(&format!("Deleting {branch}...")))?;
        let result = cw
            .candidate_plan(candidate)
            .and_then(|plan| cw.delete(&plan, DeleteOptions::default()));
        match result {
            Ok(_) => {
                deleted += 1;
                emit(output.success(&format!("✓ Deleted {branch}")))?;
            }
            Err(err) => emit(output.fail(&format!("✗ Failed to delete {branch}: {err}")))?,
        }
    }

    emit(output.message(""))?;
    emit(output.success(&format!(
        "✓ Cleanup complete! Deleted {deleted} worktree(s)"
    )))
}

/// Show every feature worktree and let the user name the ones to delete.
fn pick_worktrees(
    output: &dyn Output,
    worktrees: Vec<FeatureWorktree>,
) -> Result<Vec<CleanCandidate>> {
    if worktrees.is_empty() {
        return Ok(Vec::new());
    }
    emit(output.heading("Available worktrees:"))?;
    for worktree in &worktrees {
        emit(output.message(&format!(
            "  [{:<8}] {:<30} {}",
            worktree.status.as_str(),
            worktree.branch,
            worktree.path.display()
        )))?;
    }
    emit(output.message(""))?;

    let answer = output
        .input("Enter branch names to delete (space-separated), or 'all' for all:")
        .map_err(map_output_error)?;
    Ok(select_by_answer(worktrees, &answer))
}

/// Worktrees named in `answer`, or all of them for `all`.
fn select_by_answer(worktrees: Vec<FeatureWorktree>, answer: &str) -> Vec<CleanCandidate> {
    let answer = answer.trim();
    let names: Vec<&str> = answer.split_whitespace().collect();
    worktrees
        .into_iter()
        .filter(|worktree| {
            answer.eq_ignore_ascii_case("all") || names.contains(&worktree.branch.as_str())
        })
        .map(|worktree| CleanCandidate {
            worktree,
            reasons: vec!["selected".to_string()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use libcw::WorktreeStatus;

    use super::*;

    fn worktree(branch: &str) -> FeatureWorktree {
        FeatureWorktree {
            branch: branch.to_string(),
            path: PathBuf::from(format!("/src/app-{branch}")),
            status: WorktreeStatus::Clean,
        }
    }

    #[test]
    fn answer_selects_named_branches() {
        let all = vec![worktree("a"), worktree("b"), worktree("c")];
        let picked = select_by_answer(all, " c  a ");
        let branches: Vec<_> = picked.iter().map(|c| c.worktree.branch.as_str()).collect();
        assert_eq!(branches, ["a", "c"]);
        assert_eq!(picked[0].reasons, ["selected"]);
    }

    #[test]
    fn all_selects_everything_and_blank_selects_nothing() {
        assert_eq!(select_by_answer(vec![worktree("a"), worktree("b")], "ALL").len(), 2);
        assert!(select_by_answer(vec![worktree("a")], "  ").is_empty());
        assert!(select_by_answer(vec![worktree("a")], "zzz").is_empty());
    }
}
