// ABOUTME: Docker integration for container lifecycle and image builds via Bollard

pub mod builder;
pub mod runtime;

pub use builder::ImageBuilder;
pub use runtime::RuntimeClient;

use bollard::Docker;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Docker connection error: {0}")]
    Connection(#[from] bollard::errors::Error),
    #[error("failed to package build context: {0}")]
    BuildContext(#[from] std::io::Error),
    #[error("image build failed: {0}")]
    Build(String),
}

/// Connects to the local Docker daemon and verifies the connection.
/// A failure here is startup-fatal.
pub async fn connect() -> Result<Docker, ContainerError> {
    let docker = Docker::connect_with_local_defaults()?;
    docker.ping().await?;
    info!("connected to Docker daemon");
    Ok(docker)
}
