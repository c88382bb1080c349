//! Merge-commit workflow for a squash-merged pull request
//!
//! Runs a fixed, linear sequence of steps against one checkout:
//!
//! 1. Guard - refuse to start on the support branch or on a branch without
//!    commits; drop a stale support branch
//! 2. Gather - PR head branch and head commit, fetch the remote, sync the PR and
//!    target branches with their remote-tracking refs
//! 3. Stage - put the PR head on the support branch and merge the squash commit
//! 4. Synthesize - write a commit with the staged tree and parents
//!    `[pr head, squash commit]`, merge it into the original branch, clean up
//!
//! Nothing is rolled back on failure. A support branch created before the failure
//! is left in place for inspection.

use crate::error::{Error, Result};
use crate::platform::{PlatformService, resolve_pull_request};
use crate::repo::{
    CommitMatcher, GitRepository, MergeOutcome, SquashMessagePattern, build_commit,
    extract_tree, locate_squash_commit,
};
use crate::types::{DEFAULT_REMOTE, DEFAULT_TARGET_BRANCH, SUPPORT_BRANCH, WorkflowReport};
use git2::Oid;
use tracing::{debug, error, info, warn};

/// Steps of the workflow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    /// Not started yet
    Init,
    /// Refuse to run on the support branch, a detached HEAD or an unborn branch
    GuardNotOnSupportBranch,
    /// Force-delete a support branch left over from an aborted run
    CleanStaleSupportBranch,
    /// Ask the platform for the PR head branch and commit
    ResolvePrMetadata,
    /// Fetch the remote
    FetchRemote,
    /// Check out (or create) the local PR branch
    CheckoutPrBranch,
    /// Merge the PR branch's remote-tracking ref, if it still exists
    MergeRemotePrBranch,
    /// Check out the target branch
    CheckoutTarget,
    /// Merge the target branch's remote-tracking ref
    MergeRemoteTarget,
    /// Find the squash-merge commit in the target history
    LocateSquashCommit,
    /// Create the support branch at the PR head
    CreateSupportBranch,
    /// Merge the squash-merge commit into the support branch
    MergeSquashCommit,
    /// Read the tree of the support branch
    ExtractTree,
    /// Write the synthetic two-parent commit
    BuildSyntheticCommit,
    /// Return to the branch the run started on
    CheckoutOriginalBranch,
    /// Merge the synthetic commit into the original branch
    MergeSyntheticCommit,
    /// Delete the support branch
    DeleteSupportBranch,
    /// Finished successfully
    Done,
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::GuardNotOnSupportBranch => "guard-not-on-support-branch",
            Self::CleanStaleSupportBranch => "clean-stale-support-branch",
            Self::ResolvePrMetadata => "resolve-pr-metadata",
            Self::FetchRemote => "fetch-remote",
            Self::CheckoutPrBranch => "checkout-pr-branch",
            Self::MergeRemotePrBranch => "merge-remote-pr-branch",
            Self::CheckoutTarget => "checkout-target",
            Self::MergeRemoteTarget => "merge-remote-target",
            Self::LocateSquashCommit => "locate-squash-commit",
            Self::CreateSupportBranch => "create-support-branch",
            Self::MergeSquashCommit => "merge-squash-commit",
            Self::ExtractTree => "extract-tree",
            Self::BuildSyntheticCommit => "build-synthetic-commit",
            Self::CheckoutOriginalBranch => "checkout-original-branch",
            Self::MergeSyntheticCommit => "merge-synthetic-commit",
            Self::DeleteSupportBranch => "delete-support-branch",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Options for one run
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Pull request to rebuild the merge commit for
    pub pr_number: u64,
    /// Remote to fetch from and to read `owner/repo` from
    pub remote: String,
    /// Branch the PR was squash-merged into
    pub target_branch: String,
}

impl WorkflowOptions {
    /// Options with the default remote (`origin`) and target branch (`main`)
    pub fn new(pr_number: u64) -> Self {
        Self {
            pr_number,
            remote: DEFAULT_REMOTE.to_string(),
            target_branch: DEFAULT_TARGET_BRANCH.to_string(),
        }
    }
}

/// Drives the workflow for one pull request
///
/// Borrows the repository mutably for the whole run, so no other code can move
/// HEAD or touch the working tree while it is in progress.
pub struct MergeOrchestrator<'a> {
    repo: &'a mut GitRepository,
    platform: &'a dyn PlatformService,
    options: WorkflowOptions,
    matcher: Box<dyn CommitMatcher>,
    step: WorkflowStep,
}

impl<'a> MergeOrchestrator<'a> {
    /// Create an orchestrator using GitHub's squash-merge message convention
    pub fn new(
        repo: &'a mut GitRepository,
        platform: &'a dyn PlatformService,
        options: WorkflowOptions,
    ) -> Result<Self> {
        if options.pr_number == 0 {
            return Err(Error::InvalidInput(
                "PR number must be a positive integer".to_string(),
            ));
        }
        let matcher = Box::new(SquashMessagePattern::new(options.pr_number)?);

        Ok(Self {
            repo,
            platform,
            options,
            matcher,
            step: WorkflowStep::Init,
        })
    }

    /// Replace the predicate used to recognize the squash-merge commit
    #[must_use]
    pub fn with_matcher(mut self, matcher: Box<dyn CommitMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Run every step; the first failure aborts the run
    pub async fn run(mut self) -> Result<WorkflowReport> {
        match self.execute().await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(step = %self.step, error = %e, "workflow aborted");
                if matches!(self.repo.branch_exists(SUPPORT_BRANCH), Ok(true)) {
                    warn!(
                        branch = SUPPORT_BRANCH,
                        "support branch left in place for inspection"
                    );
                }
                Err(e)
            }
        }
    }

    fn enter(&mut self, step: WorkflowStep) {
        debug!(step = %step, "entering step");
        self.step = step;
    }

    #[allow(clippy::too_many_lines)]
    async fn execute(&mut self) -> Result<WorkflowReport> {
        let pr_number = self.options.pr_number;
        let remote = self.options.remote.clone();
        let target = self.options.target_branch.clone();

        // =====================================================================
        // Guard
        // =====================================================================

        self.enter(WorkflowStep::GuardNotOnSupportBranch);
        let original_branch = self.repo.current_branch()?;
        info!(branch = %original_branch, "current branch");
        if original_branch == SUPPORT_BRANCH {
            return Err(Error::OnSupportBranch(SUPPORT_BRANCH.to_string()));
        }
        if self.repo.is_unborn()? {
            return Err(Error::UnbornBranch(original_branch));
        }

        self.enter(WorkflowStep::CleanStaleSupportBranch);
        if self.repo.branch_exists(SUPPORT_BRANCH)? {
            self.repo.delete_branch(SUPPORT_BRANCH, true)?;
            info!(branch = SUPPORT_BRANCH, "deleted stale support branch");
        }

        // =====================================================================
        // Gather
        // =====================================================================

        self.enter(WorkflowStep::ResolvePrMetadata);
        let metadata =
            resolve_pull_request(&*self.repo, &remote, self.platform, pr_number).await?;
        let pr_branch = metadata.branch_name;
        let pr_last_commit = Oid::from_str(&metadata.head_commit).map_err(|_| {
            Error::GitHubApi(format!(
                "PR #{pr_number} has an invalid head commit id: {}",
                metadata.head_commit
            ))
        })?;
        info!(branch = %pr_branch, "PR branch");
        info!(commit = %pr_last_commit, "PR last commit");

        self.enter(WorkflowStep::FetchRemote);
        self.repo.fetch(&remote)?;
        self.ensure_commit_available(pr_last_commit)?;

        self.enter(WorkflowStep::CheckoutPrBranch);
        self.checkout_pr_branch(&pr_branch, pr_last_commit)?;

        self.enter(WorkflowStep::MergeRemotePrBranch);
        let outcome = self.repo.merge_remote_tracking(&remote, &pr_branch, false)?;
        match &outcome {
            MergeOutcome::Conflicted(_) => {
                return Err(Error::MergeNotClean {
                    target: pr_branch,
                    outcome: outcome.clone(),
                });
            }
            MergeOutcome::Skipped(reason) => {
                info!(branch = %pr_branch, reason = %reason, "remote PR branch not merged");
            }
            _ => info!(branch = %pr_branch, outcome = %outcome, "merged {remote}/{pr_branch}"),
        }

        self.enter(WorkflowStep::CheckoutTarget);
        self.repo.checkout(&target, None)?;
        info!(branch = %target, "checked out target branch");

        self.enter(WorkflowStep::MergeRemoteTarget);
        let outcome = self.repo.merge_remote_tracking(&remote, &target, true)?;
        if let MergeOutcome::Conflicted(_) = outcome {
            return Err(Error::MergeNotClean { target, outcome });
        }
        info!(branch = %target, outcome = %outcome, "merged {remote}/{target}");

        self.enter(WorkflowStep::LocateSquashCommit);
        let squash_merge_commit = locate_squash_commit(
            &*self.repo,
            &format!("refs/heads/{target}"),
            self.matcher.as_ref(),
        )?
        .ok_or(Error::SquashCommitNotFound(pr_number))?;
        info!(commit = %squash_merge_commit, "PR squash-merge commit");

        // =====================================================================
        // Stage
        // =====================================================================

        self.enter(WorkflowStep::CreateSupportBranch);
        self.repo
            .checkout(SUPPORT_BRANCH, Some(&pr_last_commit.to_string()))?;
        info!(
            branch = SUPPORT_BRANCH,
            commit = %pr_last_commit,
            "checked out PR last commit on support branch"
        );

        self.enter(WorkflowStep::MergeSquashCommit);
        let outcome = self.repo.merge_commit(
            squash_merge_commit,
            &format!("Merge PR squash-merge commit for PR #{pr_number}"),
        )?;
        if let MergeOutcome::Conflicted(_) = outcome {
            return Err(Error::MergeNotClean {
                target: SUPPORT_BRANCH.to_string(),
                outcome,
            });
        }
        info!(outcome = %outcome, "merged PR squash-merge commit");

        self.enter(WorkflowStep::ExtractTree);
        let support_head = self
            .repo
            .resolve_ref(&format!("refs/heads/{SUPPORT_BRANCH}"))?
            .ok_or_else(|| Error::RefNotFound(SUPPORT_BRANCH.to_string()))?;
        let tree_id = extract_tree(&*self.repo, support_head)?;
        info!(tree = %tree_id, "tree id");

        // =====================================================================
        // Synthesize
        // =====================================================================

        self.enter(WorkflowStep::BuildSyntheticCommit);
        let identity = self.repo.signature()?;
        let synthetic_commit = build_commit(
            &*self.repo,
            tree_id,
            [pr_last_commit, squash_merge_commit],
            &format!("Merge pull request #{pr_number} from {pr_branch}"),
            &identity,
        )?;
        info!(commit = %synthetic_commit, "created synthetic merge commit");

        self.enter(WorkflowStep::CheckoutOriginalBranch);
        self.repo.checkout(&original_branch, None)?;
        info!(branch = %original_branch, "checked out original branch");

        self.enter(WorkflowStep::MergeSyntheticCommit);
        let outcome = self.repo.merge_commit(
            synthetic_commit,
            &format!("Merge pull request #{pr_number} into {original_branch}"),
        )?;
        let merge_commit = match outcome {
            MergeOutcome::Merged(id) => id,
            other => {
                return Err(Error::MergeNotClean {
                    target: original_branch,
                    outcome: other,
                });
            }
        };
        info!(commit = %merge_commit, "merged synthetic commit");

        self.enter(WorkflowStep::DeleteSupportBranch);
        self.repo.delete_branch(SUPPORT_BRANCH, true)?;
        info!(branch = SUPPORT_BRANCH, "deleted support branch");

        self.enter(WorkflowStep::Done);
        info!(pr_number, "successfully created merge commit");

        Ok(WorkflowReport {
            pr_number,
            original_branch,
            pr_branch,
            pr_last_commit,
            squash_merge_commit,
            tree_id,
            synthetic_commit,
            merge_commit,
        })
    }

    /// Make sure the PR head commit is in the local object store
    ///
    /// A PR whose branch was deleted after merging is no longer covered by the
    /// default refspecs, but GitHub keeps `refs/pull/<n>/head`.
    fn ensure_commit_available(&mut self, commit: Oid) -> Result<()> {
        if self.repo.has_commit(commit) {
            return Ok(());
        }

        let pr_number = self.options.pr_number;
        let remote = self.options.remote.clone();
        let refspec = format!("+refs/pull/{pr_number}/head:refs/remotes/{remote}/pull/{pr_number}");
        debug!(commit = %commit, refspec = %refspec, "PR head missing locally, fetching PR ref");
        let fetch_error = self
            .repo
            .fetch_refspecs(&remote, &[refspec.as_str()])
            .err();
        if let Some(e) = &fetch_error {
            warn!(error = %e, "could not fetch PR head ref");
        }

        if self.repo.has_commit(commit) {
            Ok(())
        } else {
            Err(unavailable_commit(commit, &refspec, fetch_error.as_ref()))
        }
    }

    /// Check out the local PR branch, creating it when it does not exist
    ///
    /// A new branch starts at the remote-tracking ref when there is one, and at the
    /// PR head commit when the remote branch is gone.
    fn checkout_pr_branch(&mut self, pr_branch: &str, pr_last_commit: Oid) -> Result<()> {
        match self.repo.checkout(pr_branch, None) {
            Ok(()) => {
                info!(branch = %pr_branch, "checked out PR branch");
                Ok(())
            }
            Err(Error::RefNotFound(_)) => {
                info!(branch = %pr_branch, "could not check out PR branch directly");
                let tracking = format!("refs/remotes/{}/{pr_branch}", self.options.remote);
                let start = if self.repo.resolve_ref(&tracking)?.is_some() {
                    tracking
                } else {
                    pr_last_commit.to_string()
                };
                self.repo.checkout(pr_branch, Some(&start))?;
                info!(branch = %pr_branch, start = %start, "created and checked out PR branch");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Error for a PR head that is still missing after fetching its pull ref
fn unavailable_commit(commit: Oid, refspec: &str, fetch_error: Option<&Error>) -> Error {
    match fetch_error {
        Some(e) => Error::RefNotFound(format!("{commit} (fetching {refspec} failed: {e})")),
        None => Error::RefNotFound(commit.to_string()),
    }
}
