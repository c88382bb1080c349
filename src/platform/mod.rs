//! Hosting platform access
//!
//! Resolves which repository a checkout belongs to and asks the platform for a
//! pull request's head branch and head commit.

mod detection;
mod github;

pub use detection::parse_repo_info;
pub use github::GitHubService;

use crate::error::Result;
use crate::repo::GitRepository;
use crate::types::{PlatformConfig, PullRequestMetadata};
use async_trait::async_trait;
use tracing::debug;

/// Platform service trait for pull request lookups
///
/// Implemented by [`GitHubService`]; tests substitute their own implementation.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Head branch and head commit of a pull request
    ///
    /// Returns `Error::PullRequestNotFound` when the platform has no such PR.
    async fn get_pull_request(
        &self,
        config: &PlatformConfig,
        pr_number: u64,
    ) -> Result<PullRequestMetadata>;
}

/// Derive `owner/repo` from the URL of a configured remote
pub fn resolve_platform_config(repo: &GitRepository, remote: &str) -> Result<PlatformConfig> {
    let url = repo.remote_url(remote)?;
    let config = parse_repo_info(&url)?;
    debug!(remote, url = %url, %config, "resolved repository");
    Ok(config)
}

/// Look up the pull request for the repository behind `remote`
pub async fn resolve_pull_request(
    repo: &GitRepository,
    remote: &str,
    platform: &dyn PlatformService,
    pr_number: u64,
) -> Result<PullRequestMetadata> {
    let config = resolve_platform_config(repo, remote)?;
    platform.get_pull_request(&config, pr_number).await
}
