// ABOUTME: Single-Dockerfile deploy strategy: tear down, rebuild, and replace one container

use super::{ContainerDeployer, ContainerManifest, DeployError, DeployParams};
use crate::docker::{ImageBuilder, RuntimeClient};
use crate::{stdout_sink, ProgressSink};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Rebuild-and-replace for repositories carrying a root-level Dockerfile.
/// The image is tagged with the container name; the replacement container's
/// runtime spec comes from the optional in-repo manifest.
pub struct DockerfileDeployer {
    runtime: RuntimeClient,
    builder: ImageBuilder,
    output: ProgressSink,
}

impl DockerfileDeployer {
    pub fn new(runtime: RuntimeClient, builder: ImageBuilder) -> Self {
        Self {
            runtime,
            builder,
            output: stdout_sink(),
        }
    }

    /// Replaces the build output sink.
    pub fn with_output(mut self, output: ProgressSink) -> Self {
        self.output = output;
        self
    }

    /// Stops (when live) and removes the existing container of the target
    /// name, if any.
    async fn tear_down(&self, container_name: &str) -> Result<(), DeployError> {
        let Some(existing) = self.runtime.find_container(container_name).await? else {
            debug!(container_name, "no existing container to tear down");
            return Ok(());
        };
        let Some(id) = existing.id else {
            return Ok(());
        };

        if RuntimeClient::is_stoppable(existing.state.as_deref()) {
            self.runtime.stop_container(&id).await?;
        }
        self.runtime.remove_container(&id).await?;
        Ok(())
    }
}

#[async_trait]
impl ContainerDeployer for DockerfileDeployer {
    async fn deploy(&self, workspace: &Path, params: &DeployParams) -> Result<(), DeployError> {
        self.tear_down(&params.container_name).await?;

        if !workspace.join("Dockerfile").exists() {
            return Err(DeployError::DockerfileMissing);
        }

        self.builder
            .build(&params.container_name, workspace, Arc::clone(&self.output))
            .await?;

        let manifest = ContainerManifest::load(workspace)?;
        let config = manifest.container_config(&params.container_name);
        let container_id = self
            .runtime
            .create_and_start(&params.container_name, config)
            .await?;

        info!(
            container_name = %params.container_name,
            container_id = %container_id,
            "container replaced"
        );
        Ok(())
    }
}
