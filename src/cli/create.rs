//! Create command - rebuild the merge commit for one squash-merged PR

use crate::cli::style::{Stylize, check, short_id};
use anstream::println;
use pr_merge_commit::auth::get_github_auth;
use pr_merge_commit::error::Result;
use pr_merge_commit::platform::GitHubService;
use pr_merge_commit::repo::GitRepository;
use pr_merge_commit::types::WorkflowReport;
use pr_merge_commit::workflow::{MergeOrchestrator, WorkflowOptions};
use std::path::Path;

/// Run the create command
pub async fn run_create(path: &Path, options: WorkflowOptions) -> Result<WorkflowReport> {
    let mut repo = GitRepository::open(path)?;

    let auth = get_github_auth().await?;
    let platform = GitHubService::new(&auth)?;

    let report = MergeOrchestrator::new(&mut repo, &platform, options)?
        .run()
        .await?;

    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &WorkflowReport) {
    println!(
        "{} Created merge commit for PR {} on {}",
        check(),
        format!("#{}", report.pr_number).accent(),
        report.original_branch.emphasis()
    );
    println!(
        "  {} {} {}",
        "PR branch       ".muted(),
        report.pr_branch.emphasis(),
        format!("({})", short_id(report.pr_last_commit)).muted()
    );
    println!(
        "  {} {}",
        "squash commit   ".muted(),
        short_id(report.squash_merge_commit).accent()
    );
    println!(
        "  {} {}",
        "synthetic commit".muted(),
        short_id(report.synthetic_commit).accent()
    );
    println!(
        "  {} {}",
        "merge commit    ".muted(),
        short_id(report.merge_commit).success()
    );
}
