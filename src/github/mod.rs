//! GitHub REST transport for repository snapshots.
//!
//! [`RepositorySource`] is the seam the snapshot builder talks to;
//! [`GitHubClient`] is its production implementation. Only the top-level
//! contents listing is ever requested.

use crate::config::Config;
use crate::error::{CriticError, Result};
use async_trait::async_trait;
use base64::Engine;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = "codecritic";
const RAW_CONTENT_HOST: &str = "raw.githubusercontent.com";

/// One entry of a repository's top-level listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    /// File or directory name
    pub name: String,
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Raw download URL; absent for directories
    #[serde(default)]
    pub download_url: Option<String>,
    /// Contents API URL for this entry
    #[serde(default)]
    pub url: Option<String>,
}

impl RepoEntry {
    /// Builds a file entry with the given download reference
    pub fn file(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "file".to_string(),
            download_url: Some(download_url.into()),
            url: None,
        }
    }

    /// Reference to fetch the content from, preferring the raw download URL
    pub fn download_ref(&self) -> Option<&str> {
        self.download_url.as_deref().or(self.url.as_deref())
    }
}

/// A recent commit as attached to a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Full commit message
    pub message: String,
    /// Author name recorded in the commit
    pub author: String,
}

/// An open issue as attached to a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    /// Issue title
    pub title: String,
    /// Issue state, normally `open`
    pub state: String,
}

/// Source of repository metadata consumed by the snapshot builder
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Lists the top-level entries of a repository.
    ///
    /// Returns `Ok(None)` when the repository does not exist.
    async fn list_top_level(&self, owner: &str, repo: &str) -> Result<Option<Vec<RepoEntry>>>;

    /// Fetches a file body. Never fails: any error yields an empty string.
    async fn fetch_file_content(&self, download_ref: &str) -> String;

    /// Fetches up to `limit` commits, newest first. Empty on error.
    async fn fetch_recent_commits(&self, owner: &str, repo: &str, limit: usize) -> Vec<CommitSummary>;

    /// Fetches up to `limit` open issues. Empty on error.
    async fn fetch_open_issues(&self, owner: &str, repo: &str, limit: usize) -> Vec<IssueSummary>;
}

/// GitHub REST API client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    /// Creates a client against the public GitHub API
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(token, crate::config::DEFAULT_GITHUB_API_URL, Duration::from_secs(30))
    }

    /// Creates a client against a custom API base (GitHub Enterprise or a test server)
    pub fn with_base_url(token: Option<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            token: token.filter(|t| !t.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_base_url(
            config.github_token.clone(),
            &config.github_api_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(response.json().await?)
    }

    async fn try_fetch_content(&self, download_ref: &str) -> Result<String> {
        let response = self.get(download_ref).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CriticError::GitHubApi(format!(
                "Failed to fetch {}: HTTP {}",
                download_ref, status
            )));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v.contains("json"));
        if download_ref.contains(RAW_CONTENT_HOST) || !is_json {
            return Ok(response.text().await?);
        }

        let data: Value = response.json().await?;
        match data.get("content").and_then(Value::as_str) {
            Some(encoded) => decode_content(encoded),
            None => Ok(data.to_string()),
        }
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn list_top_level(&self, owner: &str, repo: &str) -> Result<Option<Vec<RepoEntry>>> {
        let url = format!("{}/repos/{}/{}/contents/", self.base_url, owner, repo);
        let response = self.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("Repository {}/{} not found", owner, repo);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        // A listing that is not an array (e.g. an empty repository's message
        // object) carries no entries.
        let data: Value = response.json().await?;
        match data {
            Value::Array(_) => Ok(Some(serde_json::from_value(data)?)),
            _ => Ok(None),
        }
    }

    async fn fetch_file_content(&self, download_ref: &str) -> String {
        match self.try_fetch_content(download_ref).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Treating {} as empty: {}", download_ref, e);
                String::new()
            }
        }
    }

    async fn fetch_recent_commits(&self, owner: &str, repo: &str, limit: usize) -> Vec<CommitSummary> {
        let url = format!("{}/repos/{}/{}/commits", self.base_url, owner, repo);
        match self.get_json(&url, &[("per_page", limit.to_string())]).await {
            Ok(Value::Array(items)) => items
                .iter()
                .take(limit)
                .map(|c| CommitSummary {
                    message: c["commit"]["message"].as_str().unwrap_or_default().to_string(),
                    author: c["commit"]["author"]["name"].as_str().unwrap_or("unknown").to_string(),
                })
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!("Failed to fetch commits for {}/{}: {}", owner, repo, e);
                Vec::new()
            }
        }
    }

    async fn fetch_open_issues(&self, owner: &str, repo: &str, limit: usize) -> Vec<IssueSummary> {
        let url = format!("{}/repos/{}/{}/issues", self.base_url, owner, repo);
        let query = [("state", "open".to_string()), ("per_page", limit.to_string())];
        match self.get_json(&url, &query).await {
            Ok(Value::Array(items)) => items
                .iter()
                .take(limit)
                .map(|i| IssueSummary {
                    title: i["title"].as_str().unwrap_or_default().to_string(),
                    state: i["state"].as_str().unwrap_or("open").to_string(),
                })
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!("Failed to fetch issues for {}/{}: {}", owner, repo, e);
                Vec::new()
            }
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> CriticError {
    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && body.to_lowercase().contains("rate limit"));
    if rate_limited {
        CriticError::RateLimitExceeded(format!("GitHub API returned {}", status))
    } else {
        CriticError::GitHubApi(format!("GitHub API request failed: HTTP {}", status))
    }
}

/// Decodes a base64 `content` field from the contents API (which wraps lines)
fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| CriticError::GitHubApi(format!("Invalid base64 content: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
