//! Error types for create-pr-merge-commit

use crate::repo::MergeOutcome;
use thiserror::Error;

/// Errors that can abort a merge-commit run
///
/// Every variant is fatal to the workflow. Situations the workflow recovers from
/// (a PR branch missing locally or on the remote) never surface as errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before touching the repository
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The run was started on the support branch itself
    #[error(
        "you are on the helper branch '{0}'; switch to the branch that should receive the merge commit first"
    )]
    OnSupportBranch(String),

    /// The checked-out branch has no commits yet, so it cannot be checked out again
    #[error("branch '{0}' has no commits yet; check out a branch with history first")]
    UnbornBranch(String),

    /// HEAD is detached, so there is no branch to return to
    #[error("HEAD is detached; check out the branch that should receive the merge commit")]
    DetachedHead,

    /// The named remote does not exist or has no URL
    #[error("no remote named '{0}' is configured")]
    NoRemoteConfigured(String),

    /// The remote URL does not end in `owner/repo`
    #[error("cannot derive owner/repo from remote URL: {0}")]
    InvalidRemoteUrl(String),

    /// The hosting platform has no pull request with this number
    #[error("pull request #{0} not found")]
    PullRequestNotFound(u64),

    /// A branch, ref or commit could not be resolved
    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// Non-forced deletion of a branch that is not merged into HEAD
    #[error("branch '{0}' is not fully merged")]
    BranchNotMerged(String),

    /// No commit in the target history references the pull request
    #[error("could not find squash-merge commit for PR #{0}")]
    SquashCommitNotFound(u64),

    /// Writing an object to the object store failed
    #[error("failed to write object: {0}")]
    ObjectWrite(String),

    /// No committer identity is configured for the repository
    #[error("no git identity configured (set user.name and user.email): {0}")]
    IdentityMissing(String),

    /// A merge did not complete cleanly
    #[error("merge into '{target}' did not complete cleanly: {outcome}")]
    MergeNotClean {
        /// Branch the merge was made on
        target: String,
        /// What the merge produced instead
        outcome: MergeOutcome,
    },

    /// Authentication failure
    #[error("authentication failed: {0}")]
    Auth(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Underlying git engine error
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

/// Result type alias for create-pr-merge-commit
pub type Result<T> = std::result::Result<T, Error>;
