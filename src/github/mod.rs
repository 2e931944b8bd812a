pub mod client;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use client::GitHubClient;
pub use types::{
    ChangedFile, Commit, CommitStats, Contributor, IssueRecord, PrRef, PullRequest, RepoId, State,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode GitHub response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid repository (expected owner/repo): {0}")]
    InvalidRepo(String),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),
}

impl GitHubError {
    /// HTTP status reported by the remote API, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Status { status, .. } => Some(*status),
            GitHubError::ApiRequest(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Which commit listing to read.
#[derive(Debug, Clone, Copy)]
pub enum CommitScope<'a> {
    Repository(&'a RepoId),
    PullRequest(&'a PullRequest),
}

/// Read-only view of a code-hosting REST API.
///
/// Every call is a single request; callers decide whether a failure aborts
/// the whole operation or only skips one item.
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn get_pull_request(&self, pr: &PrRef) -> Result<PullRequest, GitHubError>;

    async fn list_pull_request_files(
        &self,
        pr: &PullRequest,
    ) -> Result<Vec<ChangedFile>, GitHubError>;

    async fn list_pull_requests(&self, repo: &RepoId) -> Result<Vec<PullRequest>, GitHubError>;

    async fn list_issues(&self, repo: &RepoId) -> Result<Vec<IssueRecord>, GitHubError>;

    async fn list_commits(&self, scope: CommitScope<'_>) -> Result<Vec<Commit>, GitHubError>;

    async fn get_commit_stats(&self, commit: &Commit) -> Result<CommitStats, GitHubError>;

    async fn list_contributors(&self, repo: &RepoId) -> Result<Vec<Contributor>, GitHubError>;

    async fn fetch_raw_file(&self, url: &str) -> Result<String, GitHubError>;
}

/// Parse a GitHub PR URL of the form
/// `https://github.com/{owner}/{repo}/pull/{number}`.
pub fn parse_pr_url(url: &str) -> Result<PrRef, GitHubError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| GitHubError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(GitHubError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| GitHubError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(GitHubError::InvalidUrl(url.to_string()));
    }

    let number = segments[3]
        .parse::<u64>()
        .map_err(|_| GitHubError::InvalidUrl(url.to_string()))?;

    Ok(PrRef {
        repo: RepoId {
            owner: segments[0].to_string(),
            repo: segments[1].to_string(),
        },
        number,
    })
}

/// Resolve CLI input into a pull request reference. Accepts either a PR URL,
/// or `owner/repo` followed by a separate PR number.
pub fn resolve_pr_ref(target: &str, number: Option<u64>) -> Result<PrRef, GitHubError> {
    match number {
        Some(number) => Ok(PrRef {
            repo: target.parse()?,
            number,
        }),
        None => parse_pr_url(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_pr_url() {
        let pr = parse_pr_url("https://github.com/org/repo/pull/42").unwrap();
        assert_eq!(pr.repo.owner, "org");
        assert_eq!(pr.repo.repo, "repo");
        assert_eq!(pr.number, 42);
    }

    #[test]
    fn test_parse_invalid_pr_url() {
        assert!(parse_pr_url("https://example.com").is_err());
        assert!(parse_pr_url("not-a-url").is_err());
        assert!(parse_pr_url("https://github.com/org/repo/pulls/42").is_err());
        assert!(parse_pr_url("https://github.com/org/repo/pull/abc").is_err());
    }

    #[test]
    fn test_resolve_pr_ref_with_number() {
        let pr = resolve_pr_ref("org/repo", Some(7)).unwrap();
        assert_eq!(pr.repo.to_string(), "org/repo");
        assert_eq!(pr.number, 7);
    }

    #[test]
    fn test_resolve_pr_ref_from_url() {
        let pr = resolve_pr_ref("https://github.com/org/repo/pull/9", None).unwrap();
        assert_eq!(pr.number, 9);
        assert!(resolve_pr_ref("org/repo", None).is_err());
    }

    #[test]
    fn test_status_is_exposed() {
        let err = GitHubError::Status {
            status: 404,
            url: "https://api.github.com/repos/o/r/pulls/1".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(GitHubError::InvalidRepo("x".to_string()).status(), None);
    }
}
