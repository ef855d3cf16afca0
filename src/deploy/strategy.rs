// ABOUTME: Build-tool signature detection and the container deploy strategy seam

use super::{DeployError, DeployParams};
use async_trait::async_trait;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Deployment strategy inferred from the cloned tree's build signature.
/// Only the single-Dockerfile strategy is implemented; the rest are named so
/// their rejection stays a typed outcome rather than a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTool {
    Dockerfile,
    DockerCompose,
    Kubernetes,
    Podman,
    Buildah,
}

/// Filename fragments that select a build tool. First matching top-level
/// entry wins.
const SIGNATURES: &[(BuildTool, &str)] = &[
    (BuildTool::Dockerfile, "Dockerfile"),
    (BuildTool::DockerCompose, "docker-compose"),
];

impl BuildTool {
    /// Scans the workspace's top-level file entries (non-recursive) for a
    /// known build signature.
    pub fn detect(workspace: &Path) -> Result<Option<Self>, io::Error> {
        for entry in fs::read_dir(workspace)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            for (tool, signature) in SIGNATURES {
                if name.contains(signature) {
                    return Ok(Some(*tool));
                }
            }
        }
        Ok(None)
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildTool::Dockerfile => "Dockerfile",
            BuildTool::DockerCompose => "docker-compose",
            BuildTool::Kubernetes => "kubernetes",
            BuildTool::Podman => "podman",
            BuildTool::Buildah => "buildah",
        };
        f.write_str(name)
    }
}

/// A deploy strategy replaces the running container for `params` from the
/// contents of `workspace`.
#[async_trait]
pub trait ContainerDeployer: Send + Sync {
    async fn deploy(&self, workspace: &Path, params: &DeployParams) -> Result<(), DeployError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn detects_a_root_dockerfile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();

        assert_eq!(
            BuildTool::detect(dir.path()).unwrap(),
            Some(BuildTool::Dockerfile)
        );
    }

    #[test]
    fn matches_signature_as_a_fragment() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("docker-compose.prod.yml"), "services:\n").unwrap();

        assert_eq!(
            BuildTool::detect(dir.path()).unwrap(),
            Some(BuildTool::DockerCompose)
        );
    }

    #[test]
    fn scan_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deploy");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("Dockerfile"), "FROM scratch\n").unwrap();

        assert_eq!(BuildTool::detect(dir.path()).unwrap(), None);
    }

    #[test]
    fn unrecognized_trees_yield_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# widget\n").unwrap();

        assert_eq!(BuildTool::detect(dir.path()).unwrap(), None);
    }
}
