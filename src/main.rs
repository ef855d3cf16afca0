// ABOUTME: Daemon entry point: CLI, logging, wiring, and the watch loop

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shipwatch::config::{self, Settings};
use shipwatch::deploy::{self, DeployError, DeployInvoker, DockerfileDeployer};
use shipwatch::docker::{self, ImageBuilder, RuntimeClient};
use shipwatch::host::{self, HostError};
use shipwatch::observer::{Observer, Subscriber};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "shipwatch", version, about = "Watches a git repository and redeploys its container on every push")]
struct Cli {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate a default config file at the --config path and exit
    #[arg(short, long)]
    generate: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.generate {
        let path = cli
            .config
            .context("cannot generate a config file: no target path specified (--config)")?;
        config::generate(&path)?;
        return Ok(());
    }

    let config_path = cli.config.context("no config file specified (--config)")?;
    let settings = Settings::load(&config_path)?;

    std::fs::create_dir_all(&settings.clone_dir)
        .with_context(|| format!("failed to init directory {}", settings.clone_dir.display()))?;
    std::fs::create_dir_all(&settings.log_dir)
        .with_context(|| format!("failed to init directory {}", settings.log_dir.display()))?;

    setup_logging(&settings, cli.log_format)?;
    run(settings).await
}

async fn run(settings: Settings) -> Result<()> {
    let repo_host = host::client_for(&settings).context("failed to initialise host client")?;
    match repo_host.ping().await {
        Ok(()) => info!(repo_url = %repo_host.raw_url(), "repository host reachable"),
        Err(HostError::NotSupported(op)) => {
            warn!(repo_url = %repo_host.raw_url(), "host does not support {op}; skipping precondition");
        }
        Err(e) => return Err(e).context("failed to ping repository host"),
    }

    let handle = docker::connect()
        .await
        .context("failed to initialise docker client")?;
    let deployer = Arc::new(DockerfileDeployer::new(
        RuntimeClient::new(handle.clone()),
        ImageBuilder::new(handle),
    ));
    let invoker = Arc::new(DeployInvoker::new(
        Arc::clone(&repo_host),
        deployer,
        settings.clone_dir.clone(),
    ));

    // A fresh clone dir means nothing is deployed yet; bootstrap once before
    // watching so the container exists without waiting for the next push.
    let clone_dir_empty = deploy::is_dir_empty(&settings.clone_dir).with_context(|| {
        format!(
            "failed to check whether {} is empty",
            settings.clone_dir.display()
        )
    })?;
    if clone_dir_empty {
        info!("clone dir is empty; running initial deployment");
        if let Err(err) = invoker.deploy().await {
            if matches!(err, DeployError::DockerfileMissing) {
                warn!(error = %err, "initial deployment skipped");
            } else {
                return Err(err).context("initial deployment failed");
            }
        }
    }

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                token.cancel();
            }
        });
    }

    let subscriptions = vec![invoker as Arc<dyn Subscriber>];
    let mut observer = Observer::new(repo_host, settings.poll_interval, subscriptions);
    observer
        .observe(token)
        .await
        .context("watch loop terminated")?;
    Ok(())
}

fn setup_logging(settings: &Settings, format: LogFormat) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let log_file = settings
        .log_dir
        .join(format!("{}.log", chrono::Local::now().format("%Y-%m-%d")));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;
    let file = Arc::new(file);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shipwatch=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(file),
            )
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(file),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    Ok(())
}
