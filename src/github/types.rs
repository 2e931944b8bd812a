use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::GitHubError;

/// Open/closed state shared by pull requests and issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

/// A pull request as returned by `GET /repos/{owner}/{repo}/pulls[/{number}]`.
/// Only the fields the quality checks and metrics read are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: State,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    /// GitHub computes this lazily; `None` means the check has not finished yet.
    #[serde(default)]
    pub mergeable: Option<bool>,
    pub commits_url: String,
    pub url: String,
}

/// An entry from `GET /repos/{owner}/{repo}/issues`.
/// The issues endpoint also returns pull requests, marked by the presence of
/// a `pull_request` key whatever its value.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRecord {
    pub state: State,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "key_present")]
    pub pull_request: Option<serde_json::Value>,
}

/// `Some` whenever the key exists, including `"key": null`.
fn key_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl IssueRecord {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// A file touched by a pull request (`GET {pr.url}/files`).
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    /// additions + deletions
    #[serde(default)]
    pub changes: u64,
    #[serde(default)]
    pub raw_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

/// A commit list entry. List endpoints usually omit `stats`; the commit
/// resource at `url` carries them.
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub sha: String,
    pub url: String,
    #[serde(default)]
    pub stats: Option<CommitStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
}

/// `owner/repo` pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, repo) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| GitHubError::InvalidRepo(s.to_string()))?;
        let valid = |part: &str| !part.is_empty() && part != ".." && !part.contains('/');
        if !valid(owner) || !valid(repo) {
            return Err(GitHubError::InvalidRepo(s.to_string()));
        }
        Ok(RepoId {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

/// A single pull request within a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    pub repo: RepoId,
    pub number: u64,
}
