pub mod aggregate;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::github::{Commit, CommitScope, Contributor, GitHubError, HostingApi, PullRequest, RepoId};
use crate::report::types::RepositoryMetrics;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrCounts {
    pub open: usize,
    pub closed: usize,
    pub merged: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueCounts {
    pub open: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AveragePrSize {
    pub average_lines_added: f64,
    pub average_lines_removed: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CodeChurn {
    pub lines_added: u64,
    pub lines_removed: u64,
}

/// Average lines added/removed per PR, summed from the `stats` each PR's
/// commit listing exposes. Only PRs with at least one commit returned count
/// toward the denominator; a failed commit listing skips that PR.
#[instrument(skip_all, fields(prs = prs.len()))]
pub async fn average_pr_size(api: &dyn HostingApi, prs: &[PullRequest]) -> AveragePrSize {
    let mut added = 0u64;
    let mut removed = 0u64;
    let mut counted = 0u64;

    for pr in prs {
        let commits = match api.list_commits(CommitScope::PullRequest(pr)).await {
            Ok(commits) => commits,
            Err(err) => {
                warn!(pr = pr.number, error = %err, "failed to list PR commits, skipping");
                continue;
            }
        };
        for stats in commits.iter().filter_map(|c| c.stats) {
            added += stats.additions;
            removed += stats.deletions;
        }
        if !commits.is_empty() {
            counted += 1;
        }
    }

    if counted == 0 {
        return AveragePrSize::default();
    }
    AveragePrSize {
        average_lines_added: added as f64 / counted as f64,
        average_lines_removed: removed as f64 / counted as f64,
    }
}

/// Contributors in the order the API returns them.
pub async fn contributor_activity(api: &dyn HostingApi, repo: &RepoId) -> Result<Vec<Contributor>, GitHubError> {
    api.list_contributors(repo).await
}

/// Fetch the repository's issues and average their resolution time.
pub async fn issue_resolution_time(api: &dyn HostingApi, repo: &RepoId) -> Result<f64, GitHubError> {
    let issues = api.list_issues(repo).await?;
    Ok(aggregate::average_issue_resolution_time(&issues))
}

/// Sum per-commit stats, one fetch per commit. A failed fetch adds nothing.
#[instrument(skip_all, fields(commits = commits.len()))]
pub async fn code_churn(api: &dyn HostingApi, commits: &[Commit]) -> CodeChurn {
    let mut churn = CodeChurn::default();
    for commit in commits {
        match api.get_commit_stats(commit).await {
            Ok(stats) => {
                churn.lines_added += stats.additions;
                churn.lines_removed += stats.deletions;
            }
            Err(err) => {
                warn!(sha = %commit.sha, error = %err, "failed to fetch commit stats, skipping");
            }
        }
    }
    churn
}

/// Collect every repository metric. The pull request and issue listings are
/// required; contributor and commit listings degrade to empty on failure.
#[instrument(skip(api), fields(repo = %repo))]
pub async fn gather_repository_metrics(api: &dyn HostingApi, repo: &RepoId) -> Result<RepositoryMetrics, GitHubError> {
    let prs = api.list_pull_requests(repo).await?;
    let issues = api.list_issues(repo).await?;
    info!(prs = prs.len(), issues = issues.len(), "fetched pull requests and issues");

    let contributor_activity = contributor_activity(api, repo).await.unwrap_or_else(|err| {
        warn!(error = %err, "failed to fetch contributors");
        Vec::new()
    });

    let commits = api
        .list_commits(CommitScope::Repository(repo))
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "failed to list repository commits");
            Vec::new()
        });
    debug!(commits = commits.len(), "fetched repository commits");

    Ok(RepositoryMetrics {
        repo: repo.to_string(),
        pr_counts: aggregate::count_pull_requests(&prs),
        issue_counts: aggregate::count_issues(&issues),
        pr_response_time: aggregate::average_response_time(&prs),
        average_merge_time: aggregate::average_merge_time(&prs),
        contributor_activity,
        issue_resolution_time: aggregate::average_issue_resolution_time(&issues),
        average_size_of_prs: average_pr_size(api, &prs).await,
        code_churn: code_churn(api, &commits).await,
    })
}
