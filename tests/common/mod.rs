//! Shared fixtures for integration tests

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::MockPlatformService;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use pr_merge_commit::repo::GitRepository;
use pr_merge_commit::types::{PlatformConfig, PullRequestMetadata};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// PR number used by the fixture
pub const PR_NUMBER: u64 = 42;

/// Head branch of the fixture PR
pub const PR_BRANCH: &str = "feature/x";

/// A bare "origin" at `<tmp>/acme/widgets.git` and a working clone of it
///
/// Origin history:
///
/// ```text
/// main:      base ── squash   "Add feature x (#42)"
/// feature/x: base ── pr_head
/// ```
///
/// `pr_head` and `squash` carry the same content, as a squash merge does.
pub struct SquashMergedRepo {
    temp: TempDir,
    /// Path of the bare origin repository
    pub origin_path: PathBuf,
    /// Path of the working clone
    pub work_path: PathBuf,
    /// Root commit on both branches
    pub base: Oid,
    /// Last commit of the PR branch
    pub pr_head: Oid,
    /// Squash-merge commit on main
    pub squash: Oid,
}

impl SquashMergedRepo {
    /// Origin with the PR branch still present, cloned
    pub fn new() -> Self {
        Self::create(false)
    }

    /// Origin whose PR branch was deleted after merging; only `refs/pull/42/head`
    /// still points at the PR head
    pub fn with_deleted_pr_branch() -> Self {
        Self::create(true)
    }

    fn create(delete_pr_branch: bool) -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let origin_path = temp.path().join("acme").join("widgets.git");
        fs::create_dir_all(&origin_path).expect("failed to create origin dir");

        let mut opts = RepositoryInitOptions::new();
        opts.bare(true).initial_head("main");
        let origin = Repository::init_opts(&origin_path, &opts).expect("failed to init origin");

        let base = write_commit(
            &origin,
            "refs/heads/main",
            &[],
            &[("README.md", "widgets\n")],
            "Initial commit",
        );
        let pr_head = write_commit(
            &origin,
            &format!("refs/heads/{PR_BRANCH}"),
            &[base],
            &[("README.md", "widgets\n"), ("feature.txt", "x\n")],
            "Implement feature x",
        );
        let squash = write_commit(
            &origin,
            "refs/heads/main",
            &[base],
            &[("README.md", "widgets\n"), ("feature.txt", "x\n")],
            &format!("Add feature x (#{PR_NUMBER})\n\n* Implement feature x"),
        );

        origin
            .reference(&format!("refs/pull/{PR_NUMBER}/head"), pr_head, true, "pull ref")
            .expect("failed to create pull ref");
        if delete_pr_branch {
            origin
                .find_reference(&format!("refs/heads/{PR_BRANCH}"))
                .and_then(|mut r| r.delete())
                .expect("failed to delete PR branch");
        }

        let work_path = temp.path().join("work");
        let url = format!("file://{}", origin_path.display());
        let work = Repository::clone(&url, &work_path).expect("failed to clone origin");
        {
            let mut config = work.config().expect("failed to open config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        Self {
            temp,
            origin_path,
            work_path,
            base,
            pr_head,
            squash,
        }
    }

    /// Open the working clone
    pub fn work(&self) -> GitRepository {
        GitRepository::open(&self.work_path).expect("failed to open work repo")
    }

    /// Open the origin
    pub fn origin(&self) -> Repository {
        Repository::open_bare(&self.origin_path).expect("failed to open origin")
    }

    /// Scratch directory next to the repositories
    pub fn scratch_dir(&self) -> &Path {
        self.temp.path()
    }

    /// What the platform reports for the fixture PR
    pub fn pr_metadata(&self) -> PullRequestMetadata {
        make_pr(PR_NUMBER, PR_BRANCH, self.pr_head)
    }

    /// Commit files on the checked-out branch of the working clone
    pub fn commit_in_work(&self, files: &[(&str, &str)], message: &str) -> Oid {
        let repo = Repository::open(&self.work_path).expect("failed to open work repo");
        for (path, content) in files {
            fs::write(self.work_path.join(path), content).expect("failed to write file");
        }
        let mut index = repo.index().unwrap();
        for (path, _) in files {
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = repo.signature().unwrap();
        let parent = repo.head().unwrap().peel_to_commit().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
            .unwrap()
    }

    /// Commit a local branch points at, if it exists
    pub fn work_branch(&self, name: &str) -> Option<Oid> {
        let repo = Repository::open(&self.work_path).expect("failed to open work repo");
        repo.find_branch(name, git2::BranchType::Local)
            .ok()
            .and_then(|b| b.get().target())
    }
}

/// Write a commit with exactly `files` at the top level and move `refname` to it
pub fn write_commit(
    repo: &Repository,
    refname: &str,
    parents: &[Oid],
    files: &[(&str, &str)],
    message: &str,
) -> Oid {
    let mut builder = repo.treebuilder(None).unwrap();
    for (path, content) in files {
        let blob = repo.blob(content.as_bytes()).unwrap();
        builder.insert(*path, blob, 0o100_644).unwrap();
    }
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let parents: Vec<git2::Commit<'_>> = parents
        .iter()
        .map(|id| repo.find_commit(*id).unwrap())
        .collect();
    let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    repo.commit(Some(refname), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// Platform config matching the fixture's remote URL
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
    }
}

/// Build PR metadata
pub fn make_pr(number: u64, branch: &str, head: Oid) -> PullRequestMetadata {
    PullRequestMetadata {
        number,
        branch_name: branch.to_string(),
        head_commit: head.to_string(),
    }
}
