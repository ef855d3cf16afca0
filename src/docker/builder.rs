// ABOUTME: Image builds from a workspace directory, streaming daemon output to a sink

use super::ContainerError;
use crate::ProgressSink;
use bollard::image::BuildImageOptions;
use bollard::Docker;
use futures_util::StreamExt;
use std::path::Path;
use tracing::info;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Builds `context` (a directory with a root-level Dockerfile) into an
    /// image tagged `tag`, forwarding the daemon's build output to `output`.
    pub async fn build(
        &self,
        tag: &str,
        context: &Path,
        output: ProgressSink,
    ) -> Result<(), ContainerError> {
        info!(image_tag = tag, context = %context.display(), "building image");

        let context = context.to_path_buf();
        let tarball = tokio::task::spawn_blocking(move || tar_directory(&context))
            .await
            .map_err(|e| ContainerError::Build(e.to_string()))??;

        let options = BuildImageOptions::<String> {
            dockerfile: "Dockerfile".to_string(),
            t: tag.to_string(),
            rm: true,
            ..Default::default()
        };

        let mut stream = self.docker.build_image(options, None, Some(tarball.into()));
        while let Some(update) = stream.next().await {
            let update = update?;
            if let Some(chunk) = update.stream {
                if let Ok(mut sink) = output.lock() {
                    let _ = sink.write_all(chunk.as_bytes());
                }
            }
            if let Some(message) = update.error {
                return Err(ContainerError::Build(message));
            }
        }

        info!(image_tag = tag, "image built");
        Ok(())
    }
}

/// Packages a directory into an in-memory tar archive for use as a build
/// context.
fn tar_directory(dir: &Path) -> Result<Vec<u8>, ContainerError> {
    let mut builder = tar::Builder::new(Vec::new());
    builder.append_dir_all(".", dir)?;
    Ok(builder.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn tar_includes_the_root_dockerfile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src").join("main.rs"), "fn main() {}\n").unwrap();

        let bytes = tar_directory(dir.path()).unwrap();

        let mut archive = tar::Archive::new(bytes.as_slice());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| {
                let entry = e.unwrap();
                let path = entry.path().unwrap();
                path.to_string_lossy().trim_start_matches("./").to_string()
            })
            .collect();

        assert!(names.iter().any(|n| n == "Dockerfile"));
        assert!(names.iter().any(|n| n == "src/main.rs"));
    }
}
