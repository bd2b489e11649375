mod common;

use std::fs;

use anyhow::{Context, Result};
use common::{Fixture, commit_file, git, stderr, stdout};

#[test]
fn new_creates_worktree_with_metadata() -> Result<()> {
    let fx = Fixture::new()?;
    let out = fx.run_ok(&["new", "feature-x", "--no-launch"])?;

    let worktree = fx.worktree_path("feature-x");
    assert!(worktree.join("README.md").exists());
    assert!(out.contains("Creating new worktree:"));
    assert!(out.contains("✓ Worktree created successfully"));
    assert!(out.contains(&format!("cd {}", worktree.display())));

    let base = git(&fx.repo, &["config", "--local", "--get", "branch.feature-x.worktreeBase"])?;
    assert_eq!(stdout(&base).trim(), "main");
    Ok(())
}

#[test]
fn new_rejects_invalid_branch_names() -> Result<()> {
    let fx = Fixture::new()?;
    let out = fx.run(&["new", "bad..name", "--no-launch"])?;
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Invalid branch name"));
    Ok(())
}

#[test]
fn path_prints_the_worktree_location() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("fix/auth")?;

    let out = fx.run_ok(&["path", "fix/auth"])?;
    assert_eq!(fs::canonicalize(out.trim())?, worktree.canonicalize()?);

    let out = fx.run_ok(&["path", "-w", "app-fix-auth"])?;
    assert_eq!(fs::canonicalize(out.trim())?, worktree.canonicalize()?);
    Ok(())
}

#[test]
fn unknown_target_exits_with_resolution_code() -> Result<()> {
    let fx = Fixture::new()?;
    let out = fx.run(&["path", "nope"])?;
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("nope"));
    Ok(())
}

#[test]
fn ambiguous_target_names_both_worktrees() -> Result<()> {
    let fx = Fixture::new()?;
    let named = fx.repo.with_file_name("wt-dir");
    git(
        &fx.repo,
        &["worktree", "add", "-b", "other-branch", named.to_str().unwrap()],
    )?;
    let intended = fx.new_worktree("wt-dir")?;

    let out = fx.run(&["path", "wt-dir"])?;
    assert_eq!(out.status.code(), Some(2));
    let err = stderr(&out);
    assert!(err.contains(&named.display().to_string()), "{err}");
    assert!(err.contains(&intended.display().to_string()), "{err}");

    let out = fx.run_ok(&["path", "--branch", "wt-dir"])?;
    assert_eq!(fs::canonicalize(out.trim())?, intended.canonicalize()?);
    Ok(())
}

#[test]
fn list_and_status_show_worktrees() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;

    let out = fx.run_ok(&["list"])?;
    assert!(out.contains("BRANCH"));
    assert!(out.contains("feature-x"));
    assert!(out.contains("../app-feature-x"));

    let out = fx.run_in(&worktree, &["status"])?;
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Current worktree:"));
    assert!(text.contains("main"));
    assert!(text.contains("active"));

    let out = fx.run_ok(&["status"])?;
    assert!(out.contains("not a feature worktree"));
    Ok(())
}

#[test]
fn delete_removes_worktree_branch_and_metadata() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;

    let out = fx.run_ok(&["delete", "feature-x"])?;
    assert!(out.contains("✓ Worktree removed"));
    assert!(!worktree.exists());

    let branches = git(&fx.repo, &["branch", "--list", "feature-x"])?;
    assert!(stdout(&branches).trim().is_empty());
    let config = git(&fx.repo, &["config", "--local", "--list"])?;
    assert!(!stdout(&config).contains("feature-x"));
    Ok(())
}

#[test]
fn delete_keep_branch_leaves_the_branch() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;

    fx.run_ok(&["rm", "feature-x", "--keep-branch"])?;
    assert!(!worktree.exists());
    let branches = git(&fx.repo, &["branch", "--list", "feature-x"])?;
    assert!(stdout(&branches).contains("feature-x"));
    Ok(())
}

#[test]
fn delete_refuses_the_main_repository() -> Result<()> {
    let fx = Fixture::new()?;
    let out = fx.run(&["delete", "."])?;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Cannot delete main repository worktree"));
    Ok(())
}

#[test]
fn finish_merges_and_cleans_up() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;
    commit_file(&worktree, "feature.txt", "done")?;

    let out = fx.run_ok(&["finish", "feature-x"])?;
    assert!(out.contains("✓ Rebase successful"));
    assert!(out.contains("✓ Merged feature-x into main"));
    assert!(out.contains("✓ Cleanup complete!"));

    assert!(fx.repo.join("feature.txt").exists());
    assert!(!worktree.exists());
    let branches = git(&fx.repo, &["branch", "--list", "feature-x"])?;
    assert!(stdout(&branches).trim().is_empty());
    Ok(())
}

#[test]
fn finish_dry_run_changes_nothing() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;

    let out = fx.run_ok(&["finish", "feature-x", "--dry-run", "--push"])?;
    assert!(out.contains("DRY RUN MODE"));
    assert!(out.contains("Rebase feature-x onto main"));
    assert!(out.contains("Push main to origin"));
    assert!(worktree.exists());
    Ok(())
}

#[test]
fn finish_aborts_conflicting_rebase() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;
    commit_file(&worktree, "README.md", "feature side")?;
    commit_file(&fx.repo, "README.md", "main side")?;

    let out = fx.run(&["finish", "feature-x"])?;
    assert_eq!(out.status.code(), Some(5));
    let err = stderr(&out);
    assert!(err.contains("README.md"), "{err}");
    assert!(err.contains("--ai-merge"), "{err}");

    assert!(worktree.exists());
    let status = git(&worktree, &["status"])?;
    assert!(!stdout(&status).contains("rebase in progress"));
    Ok(())
}

#[test]
fn sync_rebases_onto_updated_base() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;
    commit_file(&fx.repo, "base.txt", "new on main")?;

    let out = fx.run_in(&worktree, &["sync"])?;
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("✓ Sync complete!"));
    assert!(worktree.join("base.txt").exists());
    Ok(())
}

#[test]
fn sync_all_continues_past_conflicts() -> Result<()> {
    let fx = Fixture::new()?;
    let clashing = fx.new_worktree("clashing")?;
    let clean = fx.new_worktree("clean")?;
    commit_file(&clashing, "README.md", "feature side")?;
    commit_file(&fx.repo, "README.md", "main side")?;

    let out = fx.run_ok(&["sync", "--all"])?;
    assert!(out.contains("Continuing with remaining worktrees..."));
    assert!(out.contains("✓ Sync complete!"));
    assert_eq!(fs::read_to_string(clean.join("README.md"))?, "main side");
    assert_eq!(fs::read_to_string(clashing.join("README.md"))?, "feature side");
    Ok(())
}

#[test]
fn change_base_updates_metadata() -> Result<()> {
    let fx = Fixture::new()?;
    git(&fx.repo, &["branch", "develop"])?;
    let worktree = fx.new_worktree("feature-x")?;

    let out = fx.run_ok(&["change-base", "develop", "feature-x", "--dry-run"])?;
    assert!(out.contains("Update base branch metadata: main → develop"));

    let out = fx.run_in(&worktree, &["change-base", "develop"])?;
    assert!(out.status.success(), "{}", stderr(&out));
    let base = git(&fx.repo, &["config", "--local", "--get", "branch.feature-x.worktreeBase"])?;
    assert_eq!(stdout(&base).trim(), "develop");

    let out = fx.run(&["change-base", "missing", "feature-x"])?;
    assert_eq!(out.status.code(), Some(2));
    Ok(())
}

#[test]
fn clean_requires_a_criterion() -> Result<()> {
    let fx = Fixture::new()?;
    let out = fx.run(&["clean"])?;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Please specify at least one cleanup criterion"));
    Ok(())
}

#[test]
fn clean_merged_deletes_merged_worktrees() -> Result<()> {
    let fx = Fixture::new()?;
    let merged = fx.new_worktree("merged")?;
    let active = fx.new_worktree("active")?;
    commit_file(&active, "work.txt", "unmerged")?;

    let out = fx.run_ok(&["clean", "--merged", "--dry-run"])?;
    assert!(out.contains("DRY RUN: Worktrees to delete:"));
    assert!(out.contains("merged (merged into main)"));
    assert!(!out.contains("• active"));
    assert!(merged.exists());

    let out = fx.run_ok(&["clean", "--merged"])?;
    assert!(out.contains("✓ Cleanup complete! Deleted 1 worktree(s)"));
    assert!(!merged.exists());
    assert!(active.exists());
    Ok(())
}

#[test]
fn diff_compares_branches() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;
    commit_file(&worktree, "new.txt", "hello")?;

    let out = fx.run_ok(&["diff", "main", "feature-x", "--files"])?;
    assert!(out.contains("Comparing branches:"));
    assert!(out.contains("A\tnew.txt"));

    let out = fx.run_ok(&["diff", "main", "main"])?;
    assert!(out.contains("No differences found"));

    let out = fx.run(&["diff", "main", "ghost"])?;
    assert_eq!(out.status.code(), Some(2));
    Ok(())
}

#[test]
fn global_list_and_scan_use_the_registry() -> Result<()> {
    let fx = Fixture::new()?;

    let out = fx.run_ok(&["-g", "list"])?;
    assert!(out.contains("No repositories registered."));

    fx.new_worktree("feature-x")?;
    let out = fx.run_ok(&["list", "--global"])?;
    assert!(out.contains("Global Worktree Overview"));
    assert!(out.contains("feature-x"));
    assert!(out.contains("1 repo(s), 1 worktree(s)"));

    let other = fx.temp.path().canonicalize()?.join("other");
    common::init_repository(&other)?;
    git(
        &other,
        &["worktree", "add", "-b", "side", "../other-side"],
    )?;
    let out = fx.run_ok(&["scan", "--dir", fx.temp.path().to_str().unwrap(), "--depth", "2"])?;
    assert!(out.contains("* Registered 2 repository(s)"));

    let out = fx.run_ok(&["path", "-g", "other:side"])?;
    assert!(out.trim().ends_with("other-side"));

    fs::remove_dir_all(&other)?;
    fs::remove_dir_all(fx.temp.path().join("other-side"))?;
    let out = fx.run_ok(&["-g", "prune"])?;
    assert!(out.contains("* Removed 1 stale entry(s):"));
    Ok(())
}

#[test]
fn global_flag_is_rejected_where_unsupported() -> Result<()> {
    let fx = Fixture::new()?;
    let out = fx.run(&["-g", "new", "x"])?;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("--global is not supported by 'new'"));
    Ok(())
}

#[test]
fn prune_forgets_removed_worktrees() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;
    fs::remove_dir_all(&worktree)?;

    let out = fx.run_ok(&["list"])?;
    assert!(out.contains("stale"));

    let out = fx.run_ok(&["prune"])?;
    assert!(out.contains("✓ Prune complete"));
    let out = fx.run_ok(&["list"])?;
    assert!(!out.contains("feature-x"));
    Ok(())
}

#[test]
fn doctor_reports_health() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;
    fs::write(worktree.join("scratch.txt"), "wip")?;

    let out = fx.run_ok(&["doctor"])?;
    assert!(out.contains("claude-worktree Health Check"));
    assert!(out.contains("1. Checking Git version..."));
    assert!(out.contains("1 worktree(s) with uncommitted changes"));
    assert!(out.contains("⚠ 1 warning(s) found"));
    Ok(())
}

#[test]
fn config_show_prints_effective_values() -> Result<()> {
    let fx = Fixture::new()?;
    fs::write(fx.config_dir.join("config.toml"), "scan_depth = 3\n")?;

    let out = fx.run_ok(&["config", "show"])?;
    assert!(out.contains("(disabled)"));
    assert!(out.contains("Scan depth:"));
    assert!(out.contains('3'));
    assert!(out.contains("registry.json"));
    Ok(())
}

#[test]
fn finish_from_a_worktree_subdirectory_removes_the_worktree() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;
    commit_file(&worktree, "feature.txt", "done")?;
    let nested = worktree.join("src");
    fs::create_dir_all(&nested)?;

    let out = fx.run_in(&nested, &["finish"])?;
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("✓ Cleanup complete!"));
    assert!(fx.repo.join("feature.txt").exists());
    assert!(!worktree.exists());
    Ok(())
}

#[test]
fn finish_refuses_the_main_repository_from_a_subdirectory() -> Result<()> {
    let fx = Fixture::new()?;
    git(&fx.repo, &["switch", "-c", "develop"])?;
    let docs = fx.repo.join("docs");
    fs::create_dir_all(&docs)?;

    let out = fx.run_in(&docs, &["finish"])?;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Cannot finish the main repository worktree"));
    let branches = git(&fx.repo, &["branch", "--list", "develop"])?;
    assert!(!stdout(&branches).trim().is_empty());
    Ok(())
}

#[test]
fn stash_moves_changes_between_worktrees() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;

    let out = fx.run_ok(&["stash", "save"])?;
    assert!(out.contains("No changes to stash"));

    fs::write(fx.repo.join("notes.txt"), "work in progress")?;
    let out = fx.run_ok(&["stash", "save", "half done"])?;
    assert!(out.contains("✓ Stashed changes: [main] half done"));
    assert!(!fx.repo.join("notes.txt").exists());

    let out = fx.run_ok(&["stash", "list"])?;
    assert!(out.contains("main:"));
    assert!(out.contains("stash@{0}: half done"));

    let out = fx.run_ok(&["stash", "apply", "feature-x"])?;
    assert!(out.contains("✓ Stash applied to feature-x"));
    assert_eq!(
        fs::read_to_string(worktree.join("notes.txt"))?,
        "work in progress"
    );

    let out = fx.run(&["stash", "apply", "feature-x", "--stash", "stash@{7}"])?;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Stash 'stash@{7}' not found"));
    Ok(())
}

#[test]
fn tree_and_stats_describe_feature_worktrees() -> Result<()> {
    let fx = Fixture::new()?;
    let worktree = fx.new_worktree("feature-x")?;
    commit_file(&worktree, "feature.txt", "done")?;

    let out = fx.run_ok(&["tree"])?;
    assert!(out.contains("app/ (base repository)"));
    assert!(out.contains("└── ○ feature-x"));
    assert!(out.contains("../app-feature-x"));

    let out = fx.run_in(&worktree, &["tree"])?;
    assert!(stdout(&out).contains("● ★ feature-x"));

    let out = fx.run_ok(&["stats"])?;
    assert!(out.contains("Total worktrees: 1"));
    assert!(out.contains("Total commits across all worktrees: 1"));
    assert!(out.contains("feature-x"));
    Ok(())
}

#[test]
fn export_then_import_restores_metadata() -> Result<()> {
    let fx = Fixture::new()?;
    fx.new_worktree("feature-x")?;
    let file = fx.temp.path().join("export.json");
    let file_arg = file.to_str().context("non-UTF-8 temp path")?;

    let out = fx.run_ok(&["export", "--output", file_arg])?;
    assert!(out.contains("✓ Export complete!"));
    assert!(out.contains("1 worktree(s)"));

    git(&fx.repo, &["config", "--unset", "branch.feature-x.worktreeBase"])?;

    let out = fx.run_ok(&["import", file_arg])?;
    assert!(out.contains("Import Preview:"));
    assert!(out.contains("• feature-x"));
    assert!(out.contains("Preview mode: No changes made."));
    let unset = git(&fx.repo, &["config", "--get-regexp", "worktreeBase"]);
    assert!(unset.is_err());

    let out = fx.run_ok(&["import", file_arg, "--apply"])?;
    assert!(out.contains("✓ Imported metadata for: feature-x"));
    let base = git(&fx.repo, &["config", "branch.feature-x.worktreeBase"])?;
    assert_eq!(stdout(&base).trim(), "main");
    Ok(())
}

#[test]
fn config_changes_are_persisted() -> Result<()> {
    let fx = Fixture::new()?;
    git(&fx.repo, &["branch", "develop"])?;

    fx.run_ok(&["config", "set", "git.default_base_branch", "develop"])?;
    fx.run_ok(&["config", "use-preset", "happy-yolo"])?;
    let stored = fs::read_to_string(fx.config_dir.join("config.toml"))?;
    assert!(stored.contains("default_base_branch = \"develop\""));
    assert!(stored.contains("--yolo"));

    let out = fx.run_ok(&["config", "list-presets"])?;
    assert!(out.contains("happy --yolo (current)"));
    assert!(out.contains("no-op"));

    fx.run_ok(&["new", "fix-auth", "--no-launch"])?;
    let base = git(&fx.repo, &["config", "branch.fix-auth.worktreeBase"])?;
    assert_eq!(stdout(&base).trim(), "develop");

    let out = fx.run_ok(&["config", "show"])?;
    assert!(out.contains("registered as 'app' since"));

    let out = fx.run(&["config", "set", "color", "always"])?;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Unknown configuration key 'color'"));

    fs::write(fx.config_dir.join("config.toml"), "scan_depth = \"deep\"")?;
    fx.run_ok(&["config", "reset"])?;
    let out = fx.run_ok(&["config", "show"])?;
    assert!(out.contains("(current branch)"));
    Ok(())
}
