use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
};

use libcw::{
    Chooser, CwError, LookupMode, MetadataStore, Registry, Result, TargetResolver,
    metadata::intended_branch_key, process,
};
use tempfile::TempDir;

/// Chooser that always answers with the same index and remembers what it was shown.
struct Scripted {
    answer: usize,
    shown: RefCell<Vec<Vec<String>>>,
}

impl Scripted {
    fn answering(answer: usize) -> Self {
        Self {
            answer,
            shown: RefCell::new(Vec::new()),
        }
    }
}

impl Chooser for Scripted {
    fn choose(&self, _prompt: &str, options: &[String]) -> Result<usize> {
        self.shown.borrow_mut().push(options.to_vec());
        Ok(self.answer)
    }
}

/// Chooser for paths that must never prompt.
struct Forbidden;

impl Chooser for Forbidden {
    fn choose(&self, prompt: &str, _options: &[String]) -> Result<usize> {
        panic!("unexpected prompt: {prompt}");
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    process::run_checked("git", args, dir).unwrap();
}

fn init_repo(path: &Path) -> PathBuf {
    fs::create_dir_all(path).unwrap();
    run_git(path, &["init", "-b", "main"]);
    run_git(path, &["config", "user.email", "test@example.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
    fs::write(path.join("README.md"), "base").unwrap();
    run_git(path, &["add", "README.md"]);
    run_git(path, &["commit", "-m", "Initial commit"]);
    path.canonicalize().unwrap()
}

fn add_worktree(repo: &Path, branch: &str, path: &Path) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    run_git(
        repo,
        &["worktree", "add", "-b", branch, path.to_str().unwrap()],
    );
    path.canonicalize().unwrap()
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap()
}

#[test]
fn single_worktree_resolves_without_prompting() {
    let tmp = TempDir::new().unwrap();
    let repo = init_repo(&tmp.path().join("app"));
    let worktree = add_worktree(&repo, "feature-x", &tmp.path().join("feature-x"));

    let resolver = TargetResolver::new(&repo, true, &Forbidden);
    let found = resolver.resolve(Some("feature-x"), None, false).unwrap();

    assert_eq!(canonical(&found.worktree_path), worktree);
    assert_eq!(found.branch_name, "feature-x");
    assert_eq!(canonical(&found.repository_root), worktree);
}

#[test]
fn branch_and_directory_collision_is_ambiguous_without_a_prompt() {
    let tmp = TempDir::new().unwrap();
    let repo = init_repo(&tmp.path().join("app"));
    let by_name = add_worktree(&repo, "other-branch", &tmp.path().join("wt-dir"));
    let by_branch = add_worktree(&repo, "wt-dir", &tmp.path().join("elsewhere"));
    MetadataStore::new(&repo)
        .set(&intended_branch_key("wt-dir"), "wt-dir")
        .unwrap();

    let resolver = TargetResolver::new(&repo, false, &Forbidden);
    let err = resolver.resolve(Some("wt-dir"), None, false).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, CwError::AmbiguousTarget { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(message.contains(&by_name.display().to_string()));
    assert!(message.contains(&by_branch.display().to_string()));
    assert!(message.contains("--branch (-b) or --worktree (-w)"));

    let found = resolver
        .resolve(Some("wt-dir"), Some(LookupMode::Branch), false)
        .unwrap();
    assert_eq!(canonical(&found.worktree_path), by_branch);

    let found = resolver
        .resolve(Some("wt-dir"), Some(LookupMode::Worktree), false)
        .unwrap();
    assert_eq!(canonical(&found.worktree_path), by_name);
    assert_eq!(found.branch_name, "other-branch");
}

#[test]
fn interactive_collision_uses_the_chosen_candidate() {
    let tmp = TempDir::new().unwrap();
    let repo = init_repo(&tmp.path().join("app"));
    let by_name = add_worktree(&repo, "other-branch", &tmp.path().join("wt-dir"));
    add_worktree(&repo, "wt-dir", &tmp.path().join("elsewhere"));

    let chooser = Scripted::answering(1);
    let resolver = TargetResolver::new(&repo, true, &chooser);
    let found = resolver.resolve(Some("wt-dir"), None, false).unwrap();

    assert_eq!(canonical(&found.worktree_path), by_name);
    let shown = chooser.shown.borrow();
    assert_eq!(shown.len(), 1);
    assert!(shown[0][0].starts_with("Branch 'wt-dir'"));
    assert!(shown[0][1].starts_with("Worktree 'wt-dir'"));
}

#[test]
fn local_misses_name_the_lookup_mode() {
    let tmp = TempDir::new().unwrap();
    let repo = init_repo(&tmp.path().join("app"));
    let resolver = TargetResolver::new(&repo, false, &Forbidden);

    let err = resolver.resolve(Some("ghost"), None, false).unwrap_err();
    assert!(err.to_string().starts_with("No worktree found for 'ghost'"));

    let err = resolver
        .resolve(Some("ghost"), Some(LookupMode::Branch), false)
        .unwrap_err();
    assert_eq!(err.to_string(), "No worktree found for branch 'ghost'");

    let err = resolver
        .resolve(Some("ghost"), Some(LookupMode::Worktree), false)
        .unwrap_err();
    assert_eq!(err.to_string(), "No worktree found with name 'ghost'");
}

/// Two registered repositories that each have a worktree named `shared`.
fn two_registered_repos(tmp: &TempDir) -> (Registry, PathBuf, PathBuf) {
    let alpha = init_repo(&tmp.path().join("alpha"));
    let beta = init_repo(&tmp.path().join("beta"));
    let alpha_shared = add_worktree(&alpha, "shared", &tmp.path().join("alpha-trees/shared"));
    let beta_shared = add_worktree(&beta, "shared", &tmp.path().join("beta-trees/shared"));

    let registry = Registry::new(&tmp.path().join("config"));
    registry.register(&alpha).unwrap();
    registry.register(&beta).unwrap();
    (registry, alpha_shared, beta_shared)
}

#[test]
fn global_collision_prompts_interactively() {
    let tmp = TempDir::new().unwrap();
    let (registry, _alpha_shared, beta_shared) = two_registered_repos(&tmp);

    let chooser = Scripted::answering(1);
    let resolver = TargetResolver::new(tmp.path(), true, &chooser).with_registry(&registry);
    let found = resolver.resolve(Some("shared"), None, true).unwrap();

    assert_eq!(canonical(&found.worktree_path), beta_shared);
    assert_eq!(found.branch_name, "shared");
    let shown = chooser.shown.borrow();
    assert!(shown[0][0].starts_with("alpha:shared → "));
    assert!(shown[0][1].starts_with("beta:shared → "));
}

#[test]
fn global_collision_lists_repo_branch_candidates_without_a_prompt() {
    let tmp = TempDir::new().unwrap();
    let (registry, alpha_shared, beta_shared) = two_registered_repos(&tmp);

    let resolver = TargetResolver::new(tmp.path(), false, &Forbidden).with_registry(&registry);
    let err = resolver.resolve(Some("shared"), None, true).unwrap_err();
    let message = err.to_string();
    assert!(message.contains(&format!("alpha:shared → {}", alpha_shared.display())));
    assert!(message.contains(&format!("beta:shared → {}", beta_shared.display())));
    assert!(message.contains("Use 'repo:branch' notation"));

    let found = resolver.resolve(Some("beta:shared"), None, true).unwrap();
    assert_eq!(canonical(&found.worktree_path), beta_shared);
}

#[test]
fn global_mode_requires_a_known_target() {
    let tmp = TempDir::new().unwrap();
    let (registry, _, _) = two_registered_repos(&tmp);
    let resolver = TargetResolver::new(tmp.path(), false, &Forbidden).with_registry(&registry);

    let err = resolver.resolve(None, None, true).unwrap_err();
    assert!(err.to_string().starts_with("Global mode requires an explicit target"));

    let err = resolver.resolve(Some("nowhere"), None, true).unwrap_err();
    assert!(matches!(err, CwError::WorktreeNotFound { .. }));
    assert!(err.to_string().contains("Run 'cw scan' to register repos."));
}

#[test]
fn global_lookup_skips_vanished_repositories() {
    let tmp = TempDir::new().unwrap();
    let (registry, alpha_shared, _) = two_registered_repos(&tmp);
    fs::remove_dir_all(tmp.path().join("beta")).unwrap();

    let resolver = TargetResolver::new(tmp.path(), false, &Forbidden).with_registry(&registry);
    let found = resolver.resolve(Some("shared"), None, true).unwrap();
    assert_eq!(canonical(&found.worktree_path), alpha_shared);
}

#[test]
fn out_of_range_choice_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let repo = init_repo(&tmp.path().join("app"));
    add_worktree(&repo, "other-branch", &tmp.path().join("wt-dir"));
    add_worktree(&repo, "wt-dir", &tmp.path().join("elsewhere"));

    let chooser = Scripted::answering(2);
    let resolver = TargetResolver::new(&repo, true, &chooser);
    let err = resolver.resolve(Some("wt-dir"), None, false).unwrap_err();

    assert!(matches!(err, CwError::OperationError(_)));
    assert!(err.to_string().ends_with("Selection 3 is out of range"));
}

#[test]
fn current_target_is_the_worktree_root_from_a_subdirectory() {
    let tmp = TempDir::new().unwrap();
    let repo = init_repo(&tmp.path().join("app"));
    let worktree = add_worktree(&repo, "feature-x", &tmp.path().join("app-feature-x"));
    let nested = worktree.join("src/deep");
    fs::create_dir_all(&nested).unwrap();

    let found = TargetResolver::new(&nested, false, &Forbidden)
        .resolve(None, None, false)
        .unwrap();

    assert_eq!(canonical(&found.worktree_path), worktree);
    assert_eq!(found.branch_name, "feature-x");
}

#[cfg(unix)]
#[test]
fn symlinked_paths_collapse_to_one_worktree() {
    use std::os::unix::fs::symlink;

    let tmp = TempDir::new().unwrap();
    let real = tmp.path().join("real");
    let repo = init_repo(&real.join("app"));
    let link = tmp.path().join("link");
    symlink(&real, &link).unwrap();

    // Registered through the link, so git records the unresolved path.
    run_git(
        &link.join("app"),
        &["worktree", "add", "-b", "feat", link.join("feat").to_str().unwrap()],
    );
    MetadataStore::new(&repo)
        .set(&intended_branch_key("feat"), "feat")
        .unwrap();

    let resolver = TargetResolver::new(&link.join("app"), false, &Forbidden);
    let found = resolver.resolve(Some("feat"), None, false).unwrap();

    assert_eq!(canonical(&found.worktree_path), canonical(&real.join("feat")));
    assert_eq!(found.branch_name, "feat");
    assert!(libcw::resolve::same_path(&link.join("feat"), &real.join("feat")));
}

#[test]
fn global_branch_and_directory_matches_in_one_repo_are_both_listed() {
    let tmp = TempDir::new().unwrap();
    let repo = init_repo(&tmp.path().join("app"));
    let by_name = add_worktree(&repo, "other-branch", &tmp.path().join("trees/report"));
    let by_branch = add_worktree(&repo, "report", &tmp.path().join("app-report"));

    let registry = Registry::new(&tmp.path().join("config"));
    registry.register(&repo).unwrap();

    let resolver = TargetResolver::new(tmp.path(), false, &Forbidden).with_registry(&registry);
    let err = resolver.resolve(Some("report"), None, true).unwrap_err();
    let message = err.to_string();

    assert!(matches!(err, CwError::AmbiguousTarget { .. }));
    assert!(message.contains(&format!("app:report → {}", by_branch.display())));
    assert!(message.contains(&format!("app:other-branch → {}", by_name.display())));

    let found = resolver
        .resolve(Some("report"), Some(LookupMode::Branch), true)
        .unwrap();
    assert_eq!(canonical(&found.worktree_path), by_branch);
}
