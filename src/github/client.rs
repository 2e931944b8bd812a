//! reqwest-backed implementation of [`HostingApi`] for the GitHub REST API.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::types::{ChangedFile, Commit, CommitStats, Contributor, IssueRecord, PrRef, PullRequest, RepoId};
use super::{CommitScope, GitHubError, HostingApi};
use crate::config::GitHubConfig;

const GITHUB_JSON: &str = "application/vnd.github.v3+json";
const AGENT: &str = "pr-quality";

pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    per_page: u8,
}

impl GitHubClient {
    /// Build a client. The token is stored once and attached to every request.
    pub fn new(config: &GitHubConfig, token: Option<String>) -> Result<Self, GitHubError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            per_page: config.per_page,
        })
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url).header(USER_AGENT, AGENT);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("token {token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<reqwest::Response, GitHubError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), url, "GitHub API returned non-success status");
            return Err(GitHubError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GitHubError> {
        let request = self.request(url).header(ACCEPT, GITHUB_JSON);
        let body = self.send(request, url).await?.text().await?;
        serde_json::from_str(&body).map_err(|source| GitHubError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// GET a list endpoint with the configured page size.
    async fn get_list<T: DeserializeOwned>(&self, url: &str, state_all: bool) -> Result<Vec<T>, GitHubError> {
        let mut query = vec![("per_page", self.per_page.to_string())];
        if state_all {
            query.push(("state", "all".to_string()));
        }
        let request = self.request(url).header(ACCEPT, GITHUB_JSON).query(&query);
        let body = self.send(request, url).await?.text().await?;
        let items: Vec<T> = serde_json::from_str(&body).map_err(|source| GitHubError::Decode {
            url: url.to_string(),
            source,
        })?;
        debug!(url, count = items.len(), "received list");
        Ok(items)
    }

    fn repo_url(&self, repo: &RepoId, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.base_url, repo.owner, repo.repo, tail)
    }
}

#[derive(Deserialize)]
struct CommitDetail {
    #[serde(default)]
    stats: Option<CommitStats>,
}

#[async_trait]
impl HostingApi for GitHubClient {
    #[instrument(skip(self), fields(repo = %pr.repo, pr = pr.number))]
    async fn get_pull_request(&self, pr: &PrRef) -> Result<PullRequest, GitHubError> {
        let url = self.repo_url(&pr.repo, &format!("pulls/{}", pr.number));
        self.get_json(&url).await
    }

    #[instrument(skip(self, pr), fields(pr = pr.number))]
    async fn list_pull_request_files(&self, pr: &PullRequest) -> Result<Vec<ChangedFile>, GitHubError> {
        let url = format!("{}/files", pr.url.trim_end_matches('/'));
        self.get_list(&url, false).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_pull_requests(&self, repo: &RepoId) -> Result<Vec<PullRequest>, GitHubError> {
        self.get_list(&self.repo_url(repo, "pulls"), true).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_issues(&self, repo: &RepoId) -> Result<Vec<IssueRecord>, GitHubError> {
        self.get_list(&self.repo_url(repo, "issues"), true).await
    }

    async fn list_commits(&self, scope: CommitScope<'_>) -> Result<Vec<Commit>, GitHubError> {
        let url = match scope {
            CommitScope::Repository(repo) => self.repo_url(repo, "commits"),
            CommitScope::PullRequest(pr) => pr.commits_url.clone(),
        };
        self.get_list(&url, false).await
    }

    async fn get_commit_stats(&self, commit: &Commit) -> Result<CommitStats, GitHubError> {
        let detail: CommitDetail = self.get_json(&commit.url).await?;
        Ok(detail.stats.unwrap_or_default())
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_contributors(&self, repo: &RepoId) -> Result<Vec<Contributor>, GitHubError> {
        self.get_list(&self.repo_url(repo, "contributors"), false).await
    }

    async fn fetch_raw_file(&self, url: &str) -> Result<String, GitHubError> {
        let text = self.send(self.request(url), url).await?.text().await?;
        debug!(url, bytes = text.len(), "fetched raw file");
        Ok(text)
    }
}
