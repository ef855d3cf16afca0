// ABOUTME: Deploy orchestration: workspace reset, strategy selection, and container replacement

pub mod dockerfile;
pub mod invoker;
pub mod manifest;
pub mod strategy;
pub mod workspace;

pub use dockerfile::DockerfileDeployer;
pub use invoker::DeployInvoker;
pub use manifest::{ContainerManifest, RestartPolicy, MANIFEST_FILE};
pub use strategy::{BuildTool, ContainerDeployer};
pub use workspace::{is_dir_empty, reset_workspace};

use crate::docker::ContainerError;
use crate::host::HostError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    /// Recoverable by design: a future push may add the missing file, so the
    /// caller logs a warning and the watch continues.
    #[error("no Dockerfile at the root of the cloned tree")]
    DockerfileMissing,
    #[error("build tool {0} is not yet supported")]
    UnsupportedBuildTool(BuildTool),
    #[error("no recognizable build signature in the cloned tree")]
    UnknownBuildTool,
    #[error("failed to reset clone workspace: {0}")]
    Workspace(#[from] std::io::Error),
    #[error("clone failed: {0}")]
    Clone(#[from] HostError),
    #[error("invalid container manifest: {0}")]
    Manifest(String),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Parameters of a single deploy attempt, derived once from the repository
/// identity and immutable for the attempt's duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployParams {
    pub container_name: String,
}
