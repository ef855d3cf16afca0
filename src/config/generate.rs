// ABOUTME: Default config document generation for first-time setup

use super::settings::ConfigError;
use std::fs;
use std::path::Path;
use tracing::info;

/// Default settings document written by `--generate`.
pub const DEFAULT_CONFIG: &str = r#"repository_url = "https://github.com/acme/widget"
clone_dir      = "~/.shipwatch/clone"
log_dir        = "~/.shipwatch/logs"

[observer]
interval_secs = 30

[http]
timeout_secs = 2
"#;

/// Writes the default settings document to `path`, creating parent
/// directories as needed.
pub fn generate(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    fs::write(path, DEFAULT_CONFIG).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), "config file generated");
    Ok(())
}
