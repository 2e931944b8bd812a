//! In-memory [`HostingApi`] used by aggregator and classifier tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{ChangedFile, Commit, CommitStats, Contributor, IssueRecord, PrRef, PullRequest, RepoId, State};
use super::{CommitScope, GitHubError, HostingApi};

/// Canned responses keyed by URL. A missing key answers 404.
#[derive(Default)]
pub struct FakeHost {
    pub pull_request: Option<PullRequest>,
    pub files: Option<Vec<ChangedFile>>,
    pub pull_requests: Option<Vec<PullRequest>>,
    pub issues: Option<Vec<IssueRecord>>,
    pub repo_commits: Option<Vec<Commit>>,
    pub contributors: Option<Vec<Contributor>>,
    /// keyed by `commits_url`
    pub pr_commits: HashMap<String, Vec<Commit>>,
    /// keyed by commit url
    pub commit_stats: HashMap<String, CommitStats>,
    /// keyed by raw url
    pub raw_files: HashMap<String, String>,
    pub raw_fetches: AtomicUsize,
}

fn not_found(url: &str) -> GitHubError {
    GitHubError::Status {
        status: 404,
        url: url.to_string(),
    }
}

#[async_trait]
impl HostingApi for FakeHost {
    async fn get_pull_request(&self, pr: &PrRef) -> Result<PullRequest, GitHubError> {
        self.pull_request
            .clone()
            .ok_or_else(|| not_found(&format!("{}/pulls/{}", pr.repo, pr.number)))
    }

    async fn list_pull_request_files(&self, pr: &PullRequest) -> Result<Vec<ChangedFile>, GitHubError> {
        self.files
            .clone()
            .ok_or_else(|| not_found(&format!("{}/files", pr.url)))
    }

    async fn list_pull_requests(&self, repo: &RepoId) -> Result<Vec<PullRequest>, GitHubError> {
        self.pull_requests
            .clone()
            .ok_or_else(|| not_found(&format!("{repo}/pulls")))
    }

    async fn list_issues(&self, repo: &RepoId) -> Result<Vec<IssueRecord>, GitHubError> {
        self.issues.clone().ok_or_else(|| not_found(&format!("{repo}/issues")))
    }

    async fn list_commits(&self, scope: CommitScope<'_>) -> Result<Vec<Commit>, GitHubError> {
        match scope {
            CommitScope::Repository(repo) => self
                .repo_commits
                .clone()
                .ok_or_else(|| not_found(&format!("{repo}/commits"))),
            CommitScope::PullRequest(pr) => self
                .pr_commits
                .get(&pr.commits_url)
                .cloned()
                .ok_or_else(|| not_found(&pr.commits_url)),
        }
    }

    async fn get_commit_stats(&self, commit: &Commit) -> Result<CommitStats, GitHubError> {
        self.commit_stats
            .get(&commit.url)
            .copied()
            .ok_or_else(|| not_found(&commit.url))
    }

    async fn list_contributors(&self, repo: &RepoId) -> Result<Vec<Contributor>, GitHubError> {
        self.contributors
            .clone()
            .ok_or_else(|| not_found(&format!("{repo}/contributors")))
    }

    async fn fetch_raw_file(&self, url: &str) -> Result<String, GitHubError> {
        self.raw_fetches.fetch_add(1, Ordering::SeqCst);
        self.raw_files.get(url).cloned().ok_or_else(|| not_found(url))
    }
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub fn repo() -> RepoId {
    RepoId {
        owner: "owner".to_string(),
        repo: "repo".to_string(),
    }
}

/// A pull request created on Jan 1st 2024, 00:00 UTC.
pub fn pull_request(number: u64, state: State) -> PullRequest {
    PullRequest {
        id: 1000 + number,
        number,
        title: format!("PR {number}"),
        state,
        created_at: at(1, 0),
        updated_at: None,
        merged_at: None,
        mergeable: None,
        commits_url: format!("https://api.test/repos/owner/repo/pulls/{number}/commits"),
        url: format!("https://api.test/repos/owner/repo/pulls/{number}"),
    }
}

pub fn issue(state: State, closed_at: Option<DateTime<Utc>>) -> IssueRecord {
    IssueRecord {
        state,
        created_at: at(1, 0),
        closed_at,
        pull_request: None,
    }
}

pub fn commit(sha: &str, stats: Option<CommitStats>) -> Commit {
    Commit {
        sha: sha.to_string(),
        url: format!("https://api.test/repos/owner/repo/commits/{sha}"),
        stats,
    }
}

pub fn file(filename: &str, changes: u64) -> ChangedFile {
    ChangedFile {
        filename: filename.to_string(),
        changes,
        raw_url: Some(format!("https://raw.test/{filename}")),
    }
}
