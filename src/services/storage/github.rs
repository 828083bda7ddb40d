//! Remote mirror on top of the GitHub contents API
//!
//! Documents live at `{path}{name}` in the configured repository/branch.
//! Reads decode the base64 `content` field; writes PUT the new content with
//! the current blob `sha` so existing files are updated in place.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{StorageBackend, StorageError};
use crate::config::MirrorConfig;

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// GitHub-hosted copy of the state files
pub struct GitHubMirror {
    http: Client,
    api_url: String,
    repo: String,
    branch: String,
    path: String,
    token: Option<String>,
}

impl GitHubMirror {
    pub fn new(config: &MirrorConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("xtream-reseller-server/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut path = config.path.trim_matches('/').to_string();
        if !path.is_empty() {
            path.push('/');
        }

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            path,
            token: config.token.clone(),
        })
    }

    fn contents_url(&self, name: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}{}",
            self.api_url, self.repo, self.path, name
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_contents(&self, name: &str) -> Result<Option<ContentsResponse>, StorageError> {
        let request = self
            .http
            .get(self.contents_url(name))
            .query(&[("ref", self.branch.as_str())]);

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StorageError::Remote(format!(
                "GET {} returned HTTP {}",
                name,
                status.as_u16()
            )));
        }

        response
            .json::<ContentsResponse>()
            .await
            .map(Some)
            .map_err(|e| StorageError::Remote(e.to_string()))
    }

    /// Fetch a document, `Ok(None)` if the repository has no such file
    pub async fn fetch(&self, name: &str) -> Result<Option<String>, StorageError> {
        debug!("Mirror fetch: {}", name);

        let Some(contents) = self.fetch_contents(name).await? else {
            return Ok(None);
        };

        decode_content(&contents.content).map(Some)
    }

    /// Create or update a document
    pub async fn push(&self, name: &str, contents: &str) -> Result<(), StorageError> {
        debug!("Mirror push: {}", name);

        let sha = self.fetch_contents(name).await?.map(|c| c.sha);
        let body = PutContentsRequest {
            message: format!("Update {}", name),
            content: STANDARD.encode(contents.as_bytes()),
            branch: &self.branch,
            sha,
        };

        let response = self
            .authorized(self.http.put(self.contents_url(name)))
            .json(&body)
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Remote(format!(
                "PUT {} returned HTTP {}",
                name,
                status.as_u16()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for GitHubMirror {
    async fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        self.fetch(name).await
    }

    async fn write(&self, name: &str, contents: &str) -> Result<(), StorageError> {
        self.push(name, contents).await
    }

    fn describe(&self) -> String {
        format!("github:{}@{}/{}", self.repo, self.branch, self.path)
    }
}

/// GitHub wraps base64 content at 60 columns
fn decode_content(encoded: &str) -> Result<String, StorageError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| StorageError::Remote(format!("Invalid base64 content: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| StorageError::Remote(format!("Invalid UTF-8 content: {}", e)))
}
