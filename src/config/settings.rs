// ABOUTME: TOML settings parsing and startup validation

use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the repository host access token.
pub const TOKEN_ENV: &str = "SHIPWATCH_ACCESS_TOKEN";

/// Repository hosts a client variant exists for.
pub const SUPPORTED_HOSTS: &[&str] = &["github.com", "gitlab.com"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no access token provided (SHIPWATCH_ACCESS_TOKEN environment variable)")]
    MissingAccessToken,
    #[error("invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),
    #[error("unsupported repository host {0} (supported: github.com, gitlab.com)")]
    UnsupportedHost(String),
    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
    #[error("{0} must not be empty")]
    EmptyPath(&'static str),
    #[error("failed to determine home directory")]
    NoHomeDir,
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Validated daemon settings. Paths are fully expanded before the core sees
/// them; the access token always comes from the environment, never the file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub repository_url: Url,
    pub clone_dir: PathBuf,
    pub log_dir: PathBuf,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    repository_url: String,
    clone_dir: String,
    log_dir: String,
    observer: ObserverSection,
    http: HttpSection,
}

#[derive(Debug, Deserialize)]
struct ObserverSection {
    interval_secs: u64,
}

#[derive(Debug, Deserialize)]
struct HttpSection {
    timeout_secs: u64,
}

impl Settings {
    /// Loads settings from a TOML file, taking the access token from the
    /// environment. Any validation failure is startup-fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let token = std::env::var(TOKEN_ENV).unwrap_or_default();
        Self::from_toml(&raw, token)
    }

    fn from_toml(raw: &str, access_token: String) -> Result<Self, ConfigError> {
        if access_token.is_empty() {
            return Err(ConfigError::MissingAccessToken);
        }

        let raw: RawSettings = toml::from_str(raw)?;

        let repository_url = Url::parse(&raw.repository_url)
            .map_err(|e| ConfigError::InvalidRepositoryUrl(e.to_string()))?;
        let host = repository_url
            .host_str()
            .ok_or_else(|| ConfigError::InvalidRepositoryUrl("missing host".to_string()))?;
        if !SUPPORTED_HOSTS.contains(&host) {
            return Err(ConfigError::UnsupportedHost(host.to_string()));
        }

        if raw.observer.interval_secs == 0 {
            return Err(ConfigError::NonPositive("observer.interval_secs"));
        }
        if raw.http.timeout_secs == 0 {
            return Err(ConfigError::NonPositive("http.timeout_secs"));
        }

        let clone_dir = expand_path(&raw.clone_dir, "clone_dir")?;
        let log_dir = expand_path(&raw.log_dir, "log_dir")?;

        Ok(Self {
            repository_url,
            clone_dir,
            log_dir,
            poll_interval: Duration::from_secs(raw.observer.interval_secs),
            http_timeout: Duration::from_secs(raw.http.timeout_secs),
            access_token,
        })
    }
}

/// Trims trailing slashes and expands a leading `~` to the home directory.
fn expand_path(path: &str, field: &'static str) -> Result<PathBuf, ConfigError> {
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return Err(ConfigError::EmptyPath(field));
    }

    if let Some(rest) = path.strip_prefix('~') {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            return Ok(home);
        }
        return Ok(home.join(rest));
    }

    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"
repository_url = "https://github.com/acme/widget"
clone_dir      = "/tmp/shipwatch/clone"
log_dir        = "/tmp/shipwatch/logs"

[observer]
interval_secs = 30

[http]
timeout_secs = 2
"#;

    fn token() -> String {
        "ghp_test".to_string()
    }

    #[test]
    fn parses_a_valid_document() {
        let settings = Settings::from_toml(VALID, token()).unwrap();
        assert_eq!(settings.repository_url.host_str(), Some("github.com"));
        assert_eq!(settings.clone_dir, PathBuf::from("/tmp/shipwatch/clone"));
        assert_eq!(settings.log_dir, PathBuf::from("/tmp/shipwatch/logs"));
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
        assert_eq!(settings.http_timeout, Duration::from_secs(2));
        assert_eq!(settings.access_token, "ghp_test");
    }

    #[test]
    fn rejects_missing_access_token() {
        let err = Settings::from_toml(VALID, String::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAccessToken));
    }

    #[test]
    fn rejects_unsupported_host_before_any_network_call() {
        let raw = VALID.replace("github.com", "bitbucket.org");
        let err = Settings::from_toml(&raw, token()).unwrap_err();
        match err {
            ConfigError::UnsupportedHost(host) => assert_eq!(host, "bitbucket.org"),
            other => panic!("expected UnsupportedHost, got {other}"),
        }
    }

    #[test]
    fn rejects_zero_interval() {
        let raw = VALID.replace("interval_secs = 30", "interval_secs = 0");
        let err = Settings::from_toml(&raw, token()).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive("observer.interval_secs")));
    }

    #[test]
    fn rejects_zero_timeout() {
        let raw = VALID.replace("timeout_secs = 2", "timeout_secs = 0");
        let err = Settings::from_toml(&raw, token()).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive("http.timeout_secs")));
    }

    #[test]
    fn rejects_unparseable_repository_url() {
        let raw = VALID.replace("https://github.com/acme/widget", "not a url");
        let err = Settings::from_toml(&raw, token()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRepositoryUrl(_)));
    }

    #[test]
    fn expands_home_shorthand() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~", "clone_dir").unwrap(), home);
        assert_eq!(
            expand_path("~/watch/clone/", "clone_dir").unwrap(),
            home.join("watch/clone")
        );
    }

    #[test]
    fn trims_trailing_slashes() {
        assert_eq!(
            expand_path("/var/lib/shipwatch//", "clone_dir").unwrap(),
            PathBuf::from("/var/lib/shipwatch")
        );
    }

    #[test]
    fn rejects_empty_paths() {
        let raw = VALID.replace("\"/tmp/shipwatch/clone\"", "\"/\"");
        let err = Settings::from_toml(&raw, token()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPath("clone_dir")));
    }
}
