// ABOUTME: Repository host abstraction with GitHub and GitLab client variants

pub mod github;
pub mod gitlab;
pub mod snapshot;

pub use github::GitHubClient;
pub use gitlab::GitLabClient;
pub use snapshot::RepositorySnapshot;

use crate::config::Settings;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("invalid repository URL: expected exactly two path segments (author/repo)")]
    InvalidRepositoryUrl,
    #[error("no repository host client for {0}")]
    UnsupportedHost(String),
    #[error("API response was not OK: {0}")]
    Api(StatusCode),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("clone failed: {0}")]
    Clone(#[from] git2::Error),
    #[error("access token cannot be empty")]
    EmptyAccessToken,
    #[error("clone target directory cannot be empty")]
    EmptyCloneTarget,
    #[error("{0} is not supported by this host")]
    NotSupported(&'static str),
}

/// Capability surface of a repository host. Two variants exist, selected once
/// at startup from the configured URL's host.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Unauthenticated identity check, used as a startup precondition only.
    async fn ping(&self) -> Result<(), HostError>;

    /// Authenticated metadata fetch; runs fresh on every watch tick.
    async fn fetch_repository(&self) -> Result<RepositorySnapshot, HostError>;

    /// Clones the repository's current head into `target`.
    async fn clone_into(&self, target: &Path) -> Result<(), HostError>;

    fn raw_url(&self) -> String;
    fn repo_name(&self) -> &str;
    fn repo_author(&self) -> &str;
    fn access_token(&self) -> &str;
}

/// Builds the host client matching the configured repository URL.
pub fn client_for(settings: &Settings) -> Result<Arc<dyn RepoHost>, HostError> {
    match settings.repository_url.host_str() {
        Some(github::HOST) => Ok(Arc::new(GitHubClient::new(
            &settings.repository_url,
            settings.access_token.clone(),
            settings.http_timeout,
        )?)),
        Some(gitlab::HOST) => Ok(Arc::new(GitLabClient::new(
            &settings.repository_url,
            settings.access_token.clone(),
        )?)),
        other => Err(HostError::UnsupportedHost(
            other.unwrap_or_default().to_string(),
        )),
    }
}

/// Decomposes the repository URL path into (author, repo). Anything other
/// than exactly two segments is rejected at construction.
pub(crate) fn split_author_repo(url: &Url) -> Result<(String, String), HostError> {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [author, repo] => Ok(((*author).to_string(), (*repo).to_string())),
        _ => Err(HostError::InvalidRepositoryUrl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn splits_author_and_repo() {
        let (author, repo) = split_author_repo(&url("https://github.com/acme/widget")).unwrap();
        assert_eq!(author, "acme");
        assert_eq!(repo, "widget");
    }

    #[test]
    fn tolerates_a_trailing_slash() {
        let (author, repo) = split_author_repo(&url("https://github.com/acme/widget/")).unwrap();
        assert_eq!(author, "acme");
        assert_eq!(repo, "widget");
    }

    #[test]
    fn rejects_zero_segments() {
        assert!(matches!(
            split_author_repo(&url("https://github.com/")),
            Err(HostError::InvalidRepositoryUrl)
        ));
    }

    #[test]
    fn rejects_one_segment() {
        assert!(matches!(
            split_author_repo(&url("https://github.com/acme")),
            Err(HostError::InvalidRepositoryUrl)
        ));
    }

    #[test]
    fn rejects_three_segments_for_every_variant() {
        let bad = url("https://github.com/acme/widget/extra");
        assert!(matches!(
            GitHubClient::new(&bad, "t".into(), std::time::Duration::from_secs(2)),
            Err(HostError::InvalidRepositoryUrl)
        ));
        let bad = url("https://gitlab.com/acme/widget/extra");
        assert!(matches!(
            GitLabClient::new(&bad, "t".into()),
            Err(HostError::InvalidRepositoryUrl)
        ));
    }
}
