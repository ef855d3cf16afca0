// ABOUTME: Optional in-repository manifest declaring the replacement container's runtime spec

use super::DeployError;
use bollard::container::Config;
use bollard::models::{
    HostConfig, PortBinding, RestartPolicy as DockerRestartPolicy, RestartPolicyNameEnum,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Manifest file looked up at the cloned tree's root. Absent file means
/// defaults: no ports, no environment, restart unless-stopped.
pub const MANIFEST_FILE: &str = "shipwatch.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerManifest {
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub restart: RestartPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    No,
    Always,
    #[default]
    UnlessStopped,
    OnFailure,
}

impl ContainerManifest {
    /// Loads the manifest from the workspace root, falling back to defaults
    /// when no manifest file exists.
    pub fn load(workspace: &Path) -> Result<Self, DeployError> {
        let path = workspace.join(MANIFEST_FILE);
        if !path.exists() {
            debug!("no container manifest in the cloned tree; using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| DeployError::Manifest(e.to_string()))
    }

    /// Renders the manifest into a container configuration for `image`.
    pub fn container_config(&self, image: &str) -> Config<String> {
        let mut port_bindings = HashMap::new();
        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
        for mapping in &self.ports {
            let key = format!("{}/tcp", mapping.container);
            exposed_ports.insert(key.clone(), HashMap::new());
            port_bindings.insert(
                key,
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some(mapping.host.to_string()),
                }]),
            );
        }

        let env: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        let restart_name = match self.restart {
            RestartPolicy::No => RestartPolicyNameEnum::NO,
            RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
            RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
            RestartPolicy::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
        };

        let host_config = HostConfig {
            port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
            restart_policy: Some(DockerRestartPolicy {
                name: Some(restart_name),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        Config {
            image: Some(image.to_string()),
            env: (!env.is_empty()).then_some(env),
            exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        }
    }
}
