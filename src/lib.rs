//! create-pr-merge-commit - rebuild a real merge commit for a squash-merged PR
//!
//! GitHub records a squash-merged pull request as one commit on the target branch,
//! which hides the PR branch's history from blame, bisect and changelog tooling.
//! This crate writes a synthetic commit whose parents are the PR's last commit and
//! the squash-merge commit, with the tree both sides produce when merged, and merges
//! it into the current branch.
//!
//! The entry point is [`workflow::MergeOrchestrator`].

pub mod auth;
pub mod error;
pub mod platform;
pub mod repo;
pub mod types;
pub mod workflow;

pub use error::{Error, Result};
