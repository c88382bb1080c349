//! Locating the squash-merge commit of a pull request

use super::GitRepository;
use crate::error::{Error, Result};
use git2::Sort;
use regex::Regex;
use tracing::{debug, trace};

/// Predicate deciding whether a commit message belongs to the pull request
///
/// The workflow only ever asks this one question, so other conventions (trailers,
/// rebase-merge markers) can be swapped in without touching the orchestration.
pub trait CommitMatcher: Send + Sync {
    /// Whether the full commit message matches
    fn matches(&self, message: &str) -> bool;

    /// Short human-readable description, used in logs
    fn describe(&self) -> String;
}

/// GitHub's default squash-merge title: `Some title (#42)`
///
/// Matches a space followed by `(#<n>)` anywhere in the message. The closing
/// parenthesis anchors the number, so `(#421)` never matches PR 42.
#[derive(Debug, Clone)]
pub struct SquashMessagePattern {
    pattern: Regex,
}

impl SquashMessagePattern {
    /// Pattern for a pull request number
    pub fn new(pr_number: u64) -> Result<Self> {
        let pattern = Regex::new(&format!(r" \(#{pr_number}\)"))
            .map_err(|e| Error::Internal(format!("invalid squash pattern: {e}")))?;
        Ok(Self { pattern })
    }
}

impl CommitMatcher for SquashMessagePattern {
    fn matches(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }

    fn describe(&self) -> String {
        format!("message containing '{}'", self.pattern.as_str().replace('\\', ""))
    }
}

/// Walk history from `start` (newest first) and return the first matching commit
///
/// Every ancestor is visited; `None` means nothing reachable matched.
pub fn locate_squash_commit(
    repo: &GitRepository,
    start: &str,
    matcher: &dyn CommitMatcher,
) -> Result<Option<git2::Oid>> {
    let start_id = repo
        .resolve_ref(start)?
        .ok_or_else(|| Error::RefNotFound(start.to_string()))?;

    let mut revwalk = repo.repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push(start_id)?;

    debug!(start, matcher = %matcher.describe(), "searching history");
    for oid in revwalk {
        let oid = oid?;
        let commit = repo.repo.find_commit(oid)?;
        let message = String::from_utf8_lossy(commit.message_bytes());
        debug!(commit = %oid, "checking commit");
        trace!(message = %message.trim(), "commit message");

        if matcher.matches(&message) {
            return Ok(Some(oid));
        }
    }

    Ok(None)
}
