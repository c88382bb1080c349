//! Repository access on top of libgit2
//!
//! `GitRepository` is the only stateful object in a run. Methods that move HEAD,
//! touch the working tree or rewrite refs take `&mut self`, so a workflow holding
//! the handle mutably is the single writer for the checkout.

mod history;
mod sync;
mod synthetic;

pub use history::{CommitMatcher, SquashMessagePattern, locate_squash_commit};
pub use sync::MergeOutcome;
pub use synthetic::{build_commit, extract_tree};

use crate::error::{Error, Result};
use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, Oid, Repository, Signature};
use std::path::Path;
use tracing::debug;

/// Handle to a local git checkout
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open the repository containing `path`
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)?;
        if repo.is_bare() {
            return Err(Error::Internal(format!(
                "{} is a bare repository; a working tree is required",
                path.display()
            )));
        }
        Ok(Self { repo })
    }

    /// Wrap an already opened repository
    pub const fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    /// Underlying libgit2 repository
    pub const fn inner(&self) -> &Repository {
        &self.repo
    }

    /// Name of the checked-out branch
    ///
    /// An unborn branch (no commits yet) is reported by name. A detached HEAD is an
    /// error, because the run has to return to a branch at the end.
    pub fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => head
                .shorthand()
                .map(String::from)
                .ok_or_else(|| Error::Internal("branch name is not valid UTF-8".to_string())),
            Ok(_) => Err(Error::DetachedHead),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(String::from)
                    .ok_or(Error::DetachedHead)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether HEAD points at a branch that has no commits yet
    pub fn is_unborn(&self) -> Result<bool> {
        match self.repo.head() {
            Ok(_) => Ok(false),
            Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a revision (branch, remote-tracking ref, full ref name or hex id) to
    /// the commit it points at
    pub fn resolve_ref(&self, name: &str) -> Result<Option<Oid>> {
        match self.repo.revparse_single(name) {
            Ok(object) => Ok(Some(object.peel_to_commit()?.id())),
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::Ambiguous) => {
                debug!(name, "ref did not resolve");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a local branch with this name exists
    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the object store contains this commit
    pub fn has_commit(&self, id: Oid) -> bool {
        self.repo.find_commit(id).is_ok()
    }

    /// Check out a local branch
    ///
    /// With `create_from: None` the branch must already exist, otherwise
    /// `Error::RefNotFound` is returned; callers use that to fall back to creating it.
    /// With `Some(start)` a missing branch is created at `start` first.
    pub fn checkout(&mut self, name: &str, create_from: Option<&str>) -> Result<()> {
        if !self.branch_exists(name)? {
            let Some(start) = create_from else {
                return Err(Error::RefNotFound(name.to_string()));
            };
            let start_id = self
                .resolve_ref(start)?
                .ok_or_else(|| Error::RefNotFound(start.to_string()))?;
            let commit = self.repo.find_commit(start_id)?;
            self.repo.branch(name, &commit, false)?;
            debug!(branch = name, start, commit = %start_id, "created branch");
        }

        let branch = self.repo.find_branch(name, BranchType::Local)?;
        let refname = branch
            .get()
            .name()
            .ok_or_else(|| Error::Internal(format!("branch ref for '{name}' is not UTF-8")))?
            .to_string();
        let commit = branch.get().peel_to_commit()?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        self.repo.set_head(&refname)?;

        debug!(branch = name, commit = %commit.id(), "checked out branch");
        Ok(())
    }

    /// Delete a local branch
    ///
    /// Without `force`, a branch whose tip is not reachable from HEAD is kept and
    /// `Error::BranchNotMerged` is returned. The checked-out branch is never deleted.
    pub fn delete_branch(&mut self, name: &str, force: bool) -> Result<()> {
        let mut branch = match self.repo.find_branch(name, BranchType::Local) {
            Ok(branch) => branch,
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Err(Error::RefNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if branch.is_head() {
            return Err(Error::Internal(format!(
                "cannot delete the checked-out branch '{name}'"
            )));
        }

        if !force {
            let tip = branch.get().peel_to_commit()?.id();
            let head = self.repo.head()?.peel_to_commit()?.id();
            if tip != head && !self.repo.graph_descendant_of(head, tip)? {
                return Err(Error::BranchNotMerged(name.to_string()));
            }
        }

        branch.delete()?;
        debug!(branch = name, force, "deleted branch");
        Ok(())
    }

    /// URL of a configured remote
    pub fn remote_url(&self, remote: &str) -> Result<String> {
        let found = match self.repo.find_remote(remote) {
            Ok(found) => found,
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
                return Err(Error::NoRemoteConfigured(remote.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        found
            .url()
            .map(String::from)
            .ok_or_else(|| Error::NoRemoteConfigured(remote.to_string()))
    }

    /// Identity configured for this repository (`user.name` / `user.email`)
    pub fn signature(&self) -> Result<Signature<'static>> {
        self.repo
            .signature()
            .map_err(|e| Error::IdentityMissing(e.message().to_string()))
    }
}
