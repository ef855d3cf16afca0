// ABOUTME: GitLab repository host client; metadata operations are typed as not supported yet

use super::{split_author_repo, HostError, RepoHost, RepositorySnapshot};
use crate::{git, stdout_sink, ProgressSink};
use async_trait::async_trait;
use reqwest::Url;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const HOST: &str = "gitlab.com";

/// GitLab variant. Cloning works like any git remote; the metadata API is not
/// wired up yet, so `ping` and `fetch_repository` return a typed
/// `NotSupported` instead of silently doing nothing.
pub struct GitLabClient {
    author: String,
    repo: String,
    access_token: String,
    progress: ProgressSink,
}

impl GitLabClient {
    pub fn new(repository: &Url, access_token: String) -> Result<Self, HostError> {
        let (author, repo) = split_author_repo(repository)?;
        Ok(Self {
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
}

#[async_trait]
impl RepoHost for GitLabClient {
    async fn ping(&self) -> Result<(), HostError> {
        Err(HostError::NotSupported("ping"))
    }

    async fn fetch_repository(&self) -> Result<RepositorySnapshot, HostError> {
        Err(HostError::NotSupported("repository metadata fetch"))
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
        format!("https://gitlab.com/{}/{}", self.author, self.repo)
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> GitLabClient {
        let url = Url::parse("https://gitlab.com/acme/widget").unwrap();
        GitLabClient::new(&url, "glpat_test".to_string()).unwrap()
    }

    #[test]
    fn derives_identity_from_the_repository_url() {
        let client = client();
        assert_eq!(client.repo_author(), "acme");
        assert_eq!(client.repo_name(), "widget");
        assert_eq!(client.raw_url(), "https://gitlab.com/acme/widget");
    }

    #[tokio::test]
    async fn ping_is_typed_not_supported() {
        assert!(matches!(
            client().ping().await,
            Err(HostError::NotSupported("ping"))
        ));
    }

    #[tokio::test]
    async fn metadata_fetch_is_typed_not_supported() {
        assert!(matches!(
            client().fetch_repository().await,
            Err(HostError::NotSupported(_))
        ));
    }
}
