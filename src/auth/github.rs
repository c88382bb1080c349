//! GitHub token discovery

use super::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Environment variable overriding the API base URL
const API_URL_VAR: &str = "GITHUB_API_URL";

/// Resolved GitHub API settings
#[derive(Clone)]
pub struct GitHubAuthConfig {
    /// Token, if any was found
    pub token: Option<String>,
    /// Where the token came from
    pub source: AuthSource,
    /// API base URL override (GitHub Enterprise); `None` means api.github.com
    pub api_url: Option<String>,
}

impl std::fmt::Debug for GitHubAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAuthConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("source", &self.source)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Resolve auth settings from an arbitrary variable lookup
///
/// Only environment variables are consulted; `source` is `Anonymous` when no
/// token variable is set.
pub fn auth_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GitHubAuthConfig {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let token = TOKEN_VARS.iter().find_map(|var| non_empty(*var));
    let api_url = non_empty(API_URL_VAR).map(|url| url.trim_end_matches('/').to_string());
    let source = if token.is_some() {
        AuthSource::EnvVar
    } else {
        AuthSource::Anonymous
    };

    GitHubAuthConfig {
        token,
        source,
        api_url,
    }
}

/// Resolve GitHub auth from the environment, falling back to `gh auth token`
///
/// Never fails for a missing token: anonymous access still works for public
/// repositories. A `gh` binary that exists but errors is reported.
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    let mut config = auth_from_lookup(|name| std::env::var(name).ok());
    if config.token.is_some() {
        debug!(source = %config.source, "using GitHub token");
        return Ok(config);
    }

    match Command::new("gh").args(["auth", "token"]).output().await {
        Ok(output) if output.status.success() => {
            let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !token.is_empty() {
                config.token = Some(token);
                config.source = AuthSource::Cli;
            }
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.contains("not logged in") {
                return Err(Error::Auth(format!("gh auth token failed: {}", stderr.trim())));
            }
        }
        Err(e) => debug!(error = %e, "gh CLI not available"),
    }

    debug!(source = %config.source, "using GitHub token");
    Ok(config)
}
