// ABOUTME: Container lifecycle operations: find, stop, remove, create, start

use super::ContainerError;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::models::ContainerSummary;
use bollard::Docker;
use tracing::{debug, info, warn};

/// Grace period given to a container before a stop is reported as failed.
const STOP_GRACE_SECS: i64 = 10;

pub struct RuntimeClient {
    docker: Docker,
}

impl RuntimeClient {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Finds a container (in any state) whose name matches `name`.
    pub async fn find_container(
        &self,
        name: &str,
    ) -> Result<Option<ContainerSummary>, ContainerError> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await?;

        // The daemon reports names with a leading slash.
        Ok(containers.into_iter().find(|c| {
            c.names
                .as_ref()
                .is_some_and(|names| names.iter().any(|n| n.trim_start_matches('/') == name))
        }))
    }

    /// Whether a container in `state` must be stopped before removal.
    pub fn is_stoppable(state: Option<&str>) -> bool {
        matches!(state, Some("running" | "paused" | "restarting"))
    }

    pub async fn stop_container(&self, id: &str) -> Result<(), ContainerError> {
        info!(container_id = id, "stopping container");
        let options = StopContainerOptions { t: STOP_GRACE_SECS };
        match self.docker.stop_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => {
                debug!(container_id = id, "container was already stopped");
                Ok(())
            }
            Err(e) => Err(ContainerError::Connection(e)),
        }
    }

    /// Removes a container and its volumes. Never forces: a container that
    /// refuses to stop is a reportable failure, not one to kill silently.
    pub async fn remove_container(&self, id: &str) -> Result<(), ContainerError> {
        info!(container_id = id, "removing container");
        let options = RemoveContainerOptions {
            force: false,
            v: true,
            ..Default::default()
        };
        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                debug!(container_id = id, "container was already removed");
                Ok(())
            }
            Err(e) => Err(ContainerError::Connection(e)),
        }
    }

    /// Creates a container under `name` and starts it, returning the new
    /// container's id.
    pub async fn create_and_start(
        &self,
        name: &str,
        config: Config<String>,
    ) -> Result<String, ContainerError> {
        let options = CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        };

        let created = self.docker.create_container(Some(options), config).await?;
        for warning in &created.warnings {
            warn!(container_name = name, msg = %warning, "container creation warning");
        }

        self.docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await?;

        info!(container_name = name, container_id = %created.id, "container started");
        Ok(created.id)
    }
}
