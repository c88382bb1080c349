//! Fetching and merging
//!
//! Merges are always true merges: a merge commit is written even when the other
//! side could be fast-forwarded to, so divergent history is never rewritten. The
//! only exception is merging into an unborn branch, which can only fast-forward.

use super::GitRepository;
use crate::error::{Error, Result};
use crate::types::FetchSummary;
use git2::build::CheckoutBuilder;
use git2::{Cred, CredentialType, FetchOptions, MergeOptions, Oid, RemoteCallbacks};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Give up after this many credential callbacks for one fetch
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

/// Report at most this many conflicting paths
const CONFLICT_SAMPLE_LIMIT: usize = 5;

/// Outcome of merging something into the checked-out branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A merge commit was written and checked out
    Merged(Oid),
    /// The other side is already contained in HEAD
    AlreadyUpToDate,
    /// The branch was unborn and now points at the other side
    FastForwarded(Oid),
    /// Nothing was merged, for the given reason
    Skipped(String),
    /// The merge conflicts; HEAD, index and working tree are untouched
    Conflicted(Vec<String>),
}

impl MergeOutcome {
    /// Whether a merge commit (or the fast-forward of an unborn branch) was produced
    pub const fn is_merge(&self) -> bool {
        matches!(self, Self::Merged(_) | Self::FastForwarded(_))
    }
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merged(id) => write!(f, "merged ({id})"),
            Self::AlreadyUpToDate => write!(f, "already up to date"),
            Self::FastForwarded(id) => write!(f, "fast-forwarded ({id})"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Conflicted(paths) if paths.is_empty() => write!(f, "conflicting"),
            Self::Conflicted(paths) => write!(f, "conflicting: {}", paths.join(", ")),
        }
    }
}

impl GitRepository {
    /// Fetch the configured refspecs of a remote
    pub fn fetch(&mut self, remote: &str) -> Result<FetchSummary> {
        self.fetch_refspecs(remote, &[])
    }

    /// Fetch explicit refspecs (or the configured ones when `refspecs` is empty)
    ///
    /// The summary is returned as a value; nothing is written to stdout.
    pub fn fetch_refspecs(&mut self, remote: &str, refspecs: &[&str]) -> Result<FetchSummary> {
        let mut found = self
            .repo
            .find_remote(remote)
            .map_err(|_| Error::NoRemoteConfigured(remote.to_string()))?;
        let config = self.repo.config()?;

        let mut updated_refs = Vec::new();
        let received_objects = {
            let mut attempts = 0usize;
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(|url, username, allowed| {
                attempts += 1;
                if attempts > MAX_CREDENTIAL_ATTEMPTS {
                    return Err(git2::Error::from_str(
                        "no usable credentials for remote (tried ssh-agent, credential helper, token)",
                    ));
                }
                credentials_for(&config, url, username, allowed, attempts)
            });
            callbacks.update_tips(|refname, old, new| {
                debug!(refname, %old, %new, "updated ref");
                updated_refs.push((refname.to_string(), old, new));
                true
            });

            let mut options = FetchOptions::new();
            options.remote_callbacks(callbacks);
            found.fetch(refspecs, Some(&mut options), None)?;
            found.stats().received_objects()
        };

        info!(
            remote,
            received_objects,
            updated = updated_refs.len(),
            "fetched"
        );
        Ok(FetchSummary {
            remote: remote.to_string(),
            received_objects,
            updated_refs,
        })
    }

    /// Merge `refs/remotes/<remote>/<branch>` into the checked-out branch
    ///
    /// A missing remote-tracking ref yields `MergeOutcome::Skipped` unless
    /// `required` is set, in which case it is `Error::RefNotFound`.
    pub fn merge_remote_tracking(
        &mut self,
        remote: &str,
        branch: &str,
        required: bool,
    ) -> Result<MergeOutcome> {
        let tracking = format!("refs/remotes/{remote}/{branch}");
        let Some(their) = self.resolve_ref(&tracking)? else {
            if required {
                return Err(Error::RefNotFound(tracking));
            }
            debug!(tracking = %tracking, "remote-tracking ref missing, skipping merge");
            return Ok(MergeOutcome::Skipped(format!("{tracking} does not exist")));
        };

        let local = self.current_branch()?;
        self.merge_commit(
            their,
            &format!("Merge remote-tracking branch '{remote}/{branch}' into {local}"),
        )
    }

    /// Merge a commit into the checked-out branch, never fast-forwarding
    pub fn merge_commit(&mut self, their_id: Oid, message: &str) -> Result<MergeOutcome> {
        let annotated = self.repo.find_annotated_commit(their_id)?;
        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            debug!(commit = %their_id, "already up to date");
            return Ok(MergeOutcome::AlreadyUpToDate);
        }

        if analysis.is_unborn() {
            let head = self.repo.find_reference("HEAD")?;
            let target = head
                .symbolic_target()
                .ok_or(Error::DetachedHead)?
                .to_string();
            self.repo.reference(&target, their_id, false, message)?;
            let mut checkout = CheckoutBuilder::new();
            checkout.safe();
            self.repo.checkout_head(Some(&mut checkout))?;
            debug!(commit = %their_id, "fast-forwarded unborn branch");
            return Ok(MergeOutcome::FastForwarded(their_id));
        }

        let ours = self.repo.head()?.peel_to_commit()?;
        let theirs = self.repo.find_commit(their_id)?;

        let mut merge_opts = MergeOptions::new();
        merge_opts.fail_on_conflict(false);
        let mut index = self
            .repo
            .merge_commits(&ours, &theirs, Some(&merge_opts))?;

        if index.has_conflicts() {
            let paths = collect_conflicting_paths(&index)?;
            warn!(commit = %their_id, conflicts = ?paths, "merge has conflicts");
            return Ok(MergeOutcome::Conflicted(paths));
        }

        let tree_id = index.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_id)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(tree.as_object(), Some(&mut checkout))?;

        let signature = self.signature()?;
        let merge_id = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&ours, &theirs],
        )?;

        debug!(commit = %their_id, merge = %merge_id, "created merge commit");
        Ok(MergeOutcome::Merged(merge_id))
    }
}

/// Pick a credential for the given attempt
///
/// Order: ssh-agent, git credential helper, token from the environment, default.
fn credentials_for(
    config: &git2::Config,
    url: &str,
    username: Option<&str>,
    allowed: CredentialType,
    attempt: usize,
) -> std::result::Result<Cred, git2::Error> {
    let user = username.unwrap_or("git");

    if allowed.contains(CredentialType::SSH_KEY) {
        return Cred::ssh_key_from_agent(user);
    }

    if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
        if attempt == 1
            && let Ok(cred) = Cred::credential_helper(config, url, username)
        {
            return Ok(cred);
        }
        if let Some(token) = ["GITHUB_TOKEN", "GH_TOKEN"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        {
            return Cred::userpass_plaintext("x-access-token", &token);
        }
    }

    if allowed.contains(CredentialType::DEFAULT) {
        return Cred::default();
    }

    Err(git2::Error::from_str("no supported credential type"))
}

fn collect_conflicting_paths(index: &git2::Index) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();

    for conflict in index.conflicts()? {
        let conflict = conflict?;
        let path = conflict
            .our
            .as_ref()
            .or(conflict.their.as_ref())
            .or(conflict.ancestor.as_ref())
            .map(|entry| String::from_utf8_lossy(&entry.path).into_owned());

        if let Some(path) = path {
            seen.insert(path);
        }
        if seen.len() == CONFLICT_SAMPLE_LIMIT {
            break;
        }
    }

    Ok(seen.into_iter().collect())
}
