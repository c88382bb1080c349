//! Mock platform service for testing

#![allow(dead_code)]

use async_trait::async_trait;
use pr_merge_commit::error::{Error, Result};
use pr_merge_commit::platform::PlatformService;
use pr_merge_commit::types::{PlatformConfig, PullRequestMetadata};
use std::collections::HashMap;
use std::sync::Mutex;

/// Call record for `get_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPrCall {
    pub config: PlatformConfig,
    pub pr_number: u64,
}

/// Simple mock platform service for testing
///
/// Features:
/// - Configurable responses per PR number (unknown numbers are "not found")
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    responses: Mutex<HashMap<u64, PullRequestMetadata>>,
    get_pr_calls: Mutex<Vec<GetPrCall>>,
    error_on_get_pr: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a mock that knows no pull requests
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            error_on_get_pr: Mutex::new(None),
        }
    }

    /// Create a mock that knows one pull request
    pub fn with_pr(pr: PullRequestMetadata) -> Self {
        let mock = Self::new();
        mock.set_pr_response(pr.number, pr);
        mock
    }

    /// Answer `get_pull_request` for `pr_number` with `pr`
    pub fn set_pr_response(&self, pr_number: u64, pr: PullRequestMetadata) {
        self.responses.lock().unwrap().insert(pr_number, pr);
    }

    /// Make `get_pull_request` return an API error
    pub fn fail_get_pr(&self, msg: &str) {
        *self.error_on_get_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Calls made to `get_pull_request`
    pub fn get_pr_calls(&self) -> Vec<GetPrCall> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// Assert that `get_pull_request` was called exactly once for `pr_number`
    pub fn assert_get_pr_called_once(&self, pr_number: u64) {
        let calls = self.get_pr_calls();
        assert_eq!(calls.len(), 1, "expected one get_pull_request call: {calls:?}");
        assert_eq!(calls[0].pr_number, pr_number);
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_pull_request(
        &self,
        config: &PlatformConfig,
        pr_number: u64,
    ) -> Result<PullRequestMetadata> {
        self.get_pr_calls.lock().unwrap().push(GetPrCall {
            config: config.clone(),
            pr_number,
        });

        if let Some(msg) = self.error_on_get_pr.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        self.responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .ok_or(Error::PullRequestNotFound(pr_number))
    }
}
