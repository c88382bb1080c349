//! Writing the synthetic merge commit
//!
//! The commit is written straight into the object store. No ref moves and the
//! working tree is not touched; the caller decides what to do with the new id.

use super::GitRepository;
use crate::error::{Error, Result};
use git2::{Oid, Signature};
use tracing::debug;

/// Tree of a commit
pub fn extract_tree(repo: &GitRepository, commit: Oid) -> Result<Oid> {
    let commit = repo
        .repo
        .find_commit(commit)
        .map_err(|_| Error::RefNotFound(commit.to_string()))?;
    Ok(commit.tree_id())
}

/// Write a commit with an explicit tree and exactly two parents, in order
///
/// The first parent becomes the first-parent lineage downstream tools follow.
/// A tree or parent missing from the object store is `Error::RefNotFound`; only
/// a failure to write the new commit is `Error::ObjectWrite`.
pub fn build_commit(
    repo: &GitRepository,
    tree: Oid,
    parents: [Oid; 2],
    message: &str,
    identity: &Signature<'_>,
) -> Result<Oid> {
    let tree = repo
        .repo
        .find_tree(tree)
        .map_err(|_| Error::RefNotFound(tree.to_string()))?;
    let [first, second] = parents.map(|id| {
        repo.repo
            .find_commit(id)
            .map_err(|_| Error::RefNotFound(id.to_string()))
    });
    let (first, second) = (first?, second?);

    let id = repo
        .repo
        .commit(None, identity, identity, message, &tree, &[&first, &second])
        .map_err(|e| Error::ObjectWrite(e.message().to_string()))?;

    debug!(commit = %id, tree = %tree.id(), first = %parents[0], second = %parents[1], "wrote commit");
    Ok(id)
}
