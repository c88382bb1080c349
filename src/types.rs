//! Core types for create-pr-merge-commit

use git2::Oid;
use serde::{Deserialize, Serialize};

/// Name of the short-lived branch used to stage the merged tree
pub const SUPPORT_BRANCH: &str = "create-merge-commit-support";

/// Remote used when none is given
pub const DEFAULT_REMOTE: &str = "origin";

/// Target branch used when none is given
pub const DEFAULT_TARGET_BRANCH: &str = "main";

/// Repository coordinates on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl std::fmt::Display for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The parts of a pull request the workflow needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestMetadata {
    /// PR number
    pub number: u64,
    /// Head branch name
    pub branch_name: String,
    /// Head commit id (hex)
    pub head_commit: String,
}

/// Everything a successful run produced
///
/// Mirrors the in-memory workflow state once every step has completed.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    /// PR number
    pub pr_number: u64,
    /// Branch that was checked out when the run started (and received the merge)
    pub original_branch: String,
    /// PR head branch
    pub pr_branch: String,
    /// Last commit of the PR branch
    pub pr_last_commit: Oid,
    /// Squash-merge commit found on the target branch
    pub squash_merge_commit: Oid,
    /// Tree of the support branch after merging the squash commit
    pub tree_id: Oid,
    /// The synthetic two-parent commit
    pub synthetic_commit: Oid,
    /// Merge of the synthetic commit into the original branch
    pub merge_commit: Oid,
}

/// Result of a fetch, captured as a value
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    /// Remote that was fetched
    pub remote: String,
    /// Objects received from the remote
    pub received_objects: usize,
    /// Refs that moved, as `(refname, old, new)`
    pub updated_refs: Vec<(String, Oid, Oid)>,
}
