//! GitHub platform service implementation

use crate::auth::GitHubAuthConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{PlatformConfig, PullRequestMetadata};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::{debug, warn};

// Only the fields the workflow reads; the full octocrab model is much stricter
// about what the response has to contain.

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    state: String,
    merged_at: Option<String>,
    head: PullHead,
}

#[derive(Deserialize)]
struct PullHead {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: String,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
}

impl GitHubService {
    /// Create a client from resolved auth settings
    ///
    /// Without a token the client is anonymous, which is enough for public repositories.
    pub fn new(auth: &GitHubAuthConfig) -> Result<Self> {
        let mut builder = Octocrab::builder();

        if let Some(ref token) = auth.token {
            builder = builder.personal_token(token.clone());
        }

        if let Some(ref base_url) = auth.api_url {
            builder = builder
                .base_uri(base_url.as_str())
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_pull_request(
        &self,
        config: &PlatformConfig,
        pr_number: u64,
    ) -> Result<PullRequestMetadata> {
        debug!(pr_number, repo = %config, "getting PR");
        let route = format!("/repos/{}/{}/pulls/{pr_number}", config.owner, config.repo);

        let pr: PullResponse = match self.client.get(route, None::<&()>).await {
            Ok(pr) => pr,
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code.as_u16() == 404
                    || source.message.eq_ignore_ascii_case("not found") =>
            {
                return Err(Error::PullRequestNotFound(pr_number));
            }
            Err(e) => return Err(e.into()),
        };

        if pr.merged_at.is_none() {
            warn!(
                pr_number,
                state = %pr.state,
                "PR is not merged; its squash-merge commit may not exist"
            );
        }

        let metadata = PullRequestMetadata {
            number: pr.number,
            branch_name: pr.head.ref_name,
            head_commit: pr.head.sha,
        };
        debug!(
            pr_number,
            branch = %metadata.branch_name,
            head = %metadata.head_commit,
            "got PR"
        );
        Ok(metadata)
    }
}
