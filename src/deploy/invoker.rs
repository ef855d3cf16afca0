// ABOUTME: Deploy invoker subscribing to push events: clean-room reset, re-clone, dispatch

use super::{reset_workspace, BuildTool, ContainerDeployer, DeployError, DeployParams};
use crate::host::RepoHost;
use crate::observer::Subscriber;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Drives one deploy attempt per push event. Exclusively owns the clone
/// workspace for the attempt's duration; every attempt starts from a freshly
/// cloned tree, never an incrementally mutated one.
pub struct DeployInvoker {
    host: Arc<dyn RepoHost>,
    deployer: Arc<dyn ContainerDeployer>,
    clone_dir: PathBuf,
}

impl DeployInvoker {
    pub fn new(
        host: Arc<dyn RepoHost>,
        deployer: Arc<dyn ContainerDeployer>,
        clone_dir: PathBuf,
    ) -> Self {
        Self {
            host,
            deployer,
            clone_dir,
        }
    }

    /// One deploy attempt: clean → clone → detect strategy → deploy.
    /// Every step short-circuits the attempt on failure.
    pub async fn deploy(&self) -> Result<(), DeployError> {
        debug!(repo = %self.host.repo_name(), "deploy attempt triggered");

        reset_workspace(&self.clone_dir)?;
        RepoHost::clone_into(&*self.host, &self.clone_dir).await?;

        let params = DeployParams {
            container_name: self.host.repo_name().to_string(),
        };

        match BuildTool::detect(&self.clone_dir)? {
            Some(BuildTool::Dockerfile) => {
                self.deployer.deploy(&self.clone_dir, &params).await?;
                info!(
                    repo = %self.host.repo_name(),
                    container_name = %params.container_name,
                    "deploy attempt finished"
                );
                Ok(())
            }
            Some(tool) => Err(DeployError::UnsupportedBuildTool(tool)),
            None => Err(DeployError::UnknownBuildTool),
        }
    }
}

#[async_trait]
impl Subscriber for DeployInvoker {
    async fn notify(&self, _token: CancellationToken) -> Result<(), DeployError> {
        self.deploy().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostError, RepositorySnapshot};
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    /// Host double whose clone drops a canned tree into the workspace.
    struct FakeHost {
        files: Vec<(&'static str, &'static str)>,
        clones: Mutex<usize>,
    }

    impl FakeHost {
        fn with_files(files: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                files,
                clones: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl RepoHost for FakeHost {
        async fn ping(&self) -> Result<(), HostError> {
            Ok(())
        }

        async fn fetch_repository(&self) -> Result<RepositorySnapshot, HostError> {
            Err(HostError::NotSupported("fetch in tests"))
        }

        async fn clone_into(&self, target: &Path) -> Result<(), HostError> {
            *self.clones.lock().unwrap() += 1;
            for (name, contents) in &self.files {
                fs::write(target.join(name), contents).map_err(|e| {
                    HostError::Clone(git2::Error::from_str(&e.to_string()))
                })?;
            }
            Ok(())
        }

        fn raw_url(&self) -> String {
            "https://github.com/acme/widget".to_string()
        }

        fn repo_name(&self) -> &str {
            "widget"
        }

        fn repo_author(&self) -> &str {
            "acme"
        }

        fn access_token(&self) -> &str {
            "token"
        }
    }

    /// Strategy double recording the workspaces and params it was handed.
    #[derive(Default)]
    struct RecordingDeployer {
        calls: Mutex<Vec<(PathBuf, DeployParams)>>,
    }

    #[async_trait]
    impl ContainerDeployer for RecordingDeployer {
        async fn deploy(&self, workspace: &Path, params: &DeployParams) -> Result<(), DeployError> {
            self.calls
                .lock()
                .unwrap()
                .push((workspace.to_path_buf(), params.clone()));
            Ok(())
        }
    }

    fn invoker_with(
        files: Vec<(&'static str, &'static str)>,
        clone_dir: PathBuf,
    ) -> (DeployInvoker, Arc<RecordingDeployer>) {
        let deployer = Arc::new(RecordingDeployer::default());
        let invoker = DeployInvoker::new(
            Arc::new(FakeHost::with_files(files)),
            Arc::clone(&deployer) as Arc<dyn ContainerDeployer>,
            clone_dir,
        );
        (invoker, deployer)
    }

    #[tokio::test]
    async fn clean_room_removes_prior_artifacts_before_cloning() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("stale-artifact.bin"), "old").unwrap();

        let (invoker, _) = invoker_with(
            vec![("Dockerfile", "FROM scratch\n")],
            dir.path().to_path_buf(),
        );
        invoker.deploy().await.unwrap();

        // Only the freshly cloned tree survives.
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Dockerfile".to_string()]);
    }

    #[tokio::test]
    async fn container_name_derives_from_the_repo_name() {
        let dir = tempfile::tempdir().unwrap();
        let (invoker, deployer) = invoker_with(
            vec![("Dockerfile", "FROM scratch\n")],
            dir.path().to_path_buf(),
        );

        invoker.deploy().await.unwrap();

        let calls = deployer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.container_name, "widget");
        assert_eq!(calls[0].0, dir.path());
    }

    #[tokio::test]
    async fn compose_trees_are_typed_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let (invoker, deployer) = invoker_with(
            vec![("docker-compose.yml", "services:\n")],
            dir.path().to_path_buf(),
        );

        let err = invoker.deploy().await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::UnsupportedBuildTool(BuildTool::DockerCompose)
        ));
        assert!(deployer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signatureless_trees_are_typed_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let (invoker, _) = invoker_with(vec![("README.md", "# widget\n")], dir.path().to_path_buf());

        let err = invoker.deploy().await.unwrap_err();
        assert!(matches!(err, DeployError::UnknownBuildTool));
    }
}
