// ABOUTME: GitHub repository host client backed by the public repos API

use super::{split_author_repo, HostError, RepoHost, RepositorySnapshot};
use crate::{git, stdout_sink, ProgressSink};
use async_trait::async_trait;
use reqwest::Url;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const HOST: &str = "github.com";

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("shipwatch/", env!("CARGO_PKG_VERSION"));

pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
    author: String,
    repo: String,
    access_token: String,
    progress: ProgressSink,
}

impl GitHubClient {
    pub fn new(repository: &Url, access_token: String, timeout: Duration) -> Result<Self, HostError> {
        let api_base = Url::parse(API_BASE)
            .map_err(|_| HostError::UnsupportedHost(API_BASE.to_string()))?;
        Self::with_api_base(api_base, repository, access_token, timeout)
    }

    /// Construction against an explicit API base; the test seam for wiremock.
    pub fn with_api_base(
        api_base: Url,
        repository: &Url,
        access_token: String,
        timeout: Duration,
    ) -> Result<Self, HostError> {
        let (author, repo) = split_author_repo(repository)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_base,
            author,
            repo,
            access_token,
            progress: stdout_sink(),
        })
    }

    /// Replaces the clone progress sink.
    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, HostError> {
        self.api_base
            .join(path)
            .map_err(|_| HostError::InvalidRepositoryUrl)
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn ping(&self) -> Result<(), HostError> {
        let url = self.endpoint(&format!("users/{}", self.author))?;
        let res = self.http.get(url).send().await?;
        if !res.status().is_success() {
            return Err(HostError::Api(res.status()));
        }
        debug!(author = %self.author, "host ping succeeded");
        Ok(())
    }

    async fn fetch_repository(&self) -> Result<RepositorySnapshot, HostError> {
        let url = self.endpoint(&format!("repos/{}/{}", self.author, self.repo))?;
        let res = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(HostError::Api(res.status()));
        }
        Ok(res.json::<RepositorySnapshot>().await?)
    }

    async fn clone_into(&self, target: &Path) -> Result<(), HostError> {
        if self.access_token.is_empty() {
            return Err(HostError::EmptyAccessToken);
        }
        if target.as_os_str().is_empty() {
            return Err(HostError::EmptyCloneTarget);
        }

        let url = self.raw_url();
        let token = self.access_token.clone();
        let target = target.to_path_buf();
        let progress = Arc::clone(&self.progress);

        info!(repo_url = %url, clone_dir = %target.display(), "cloning repository");
        tokio::task::spawn_blocking(move || git::clone_repository(&url, &target, &token, progress))
            .await
            .map_err(|e| HostError::Clone(git2::Error::from_str(&e.to_string())))??;
        info!(repo = %self.repo, "repository cloned");
        Ok(())
    }

    fn raw_url(&self) -> String {
        format!("https://github.com/{}/{}", self.author, self.repo)
    }

    fn repo_name(&self) -> &str {
        &self.repo
    }

    fn repo_author(&self) -> &str {
        &self.author
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }
}
