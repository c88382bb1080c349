//! Repository coordinates from remote URLs

use crate::error::{Error, Result};
use crate::types::PlatformConfig;

/// Parse `owner` and `repo` out of a remote URL
///
/// The URL is split on `:` and `/` and the last two segments are used, with a
/// trailing `.git` removed. That covers scp-style SSH (`git@host:owner/repo.git`),
/// `ssh://` and `https://` URLs, and local paths that end in `owner/repo`.
pub fn parse_repo_info(url: &str) -> Result<PlatformConfig> {
    let segments: Vec<&str> = url
        .trim()
        .split([':', '/'])
        .filter(|s| !s.is_empty())
        .collect();

    let [.., owner, repo] = segments.as_slice() else {
        return Err(Error::InvalidRemoteUrl(url.to_string()));
    };

    let repo = repo.strip_suffix(".git").unwrap_or(*repo);
    if repo.is_empty() {
        return Err(Error::InvalidRemoteUrl(url.to_string()));
    }

    Ok(PlatformConfig {
        owner: (*owner).to_string(),
        repo: repo.to_string(),
    })
}
