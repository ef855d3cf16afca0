// ABOUTME: Poll loop watching one repository for pushes and fanning out to subscribers

use crate::deploy::DeployError;
use crate::host::{HostError, RepoHost};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A callable unit invoked on every push event. The whole fan-out is a
/// barrier: it completes only once every subscriber has either succeeded or
/// failed.
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn notify(&self, token: CancellationToken) -> Result<(), DeployError>;
}

/// Watches a single repository by polling its metadata on a fixed interval.
///
/// The push watermark is instance state, updated only after a completed
/// fan-out, so a crash mid-notify is retried on the next start instead of
/// silently skipped. A metadata fetch failure terminates the loop and
/// propagates; cancellation is the only clean exit.
pub struct Observer {
    host: Arc<dyn RepoHost>,
    interval: Duration,
    subscriptions: Vec<Arc<dyn Subscriber>>,
    last_pushed: DateTime<Utc>,
}

impl Observer {
    /// The watermark baseline is "now": pushes that predate startup are not
    /// replayed.
    pub fn new(
        host: Arc<dyn RepoHost>,
        interval: Duration,
        subscriptions: Vec<Arc<dyn Subscriber>>,
    ) -> Self {
        Self {
            host,
            interval,
            subscriptions,
            last_pushed: Utc::now(),
        }
    }

    /// Last push timestamp observed and fully fanned out. Non-decreasing.
    pub fn last_pushed(&self) -> DateTime<Utc> {
        self.last_pushed
    }

    /// Runs the watch loop until cancelled (clean exit) or a metadata fetch
    /// fails (propagated).
    pub async fn observe(&mut self, token: CancellationToken) -> Result<(), HostError> {
        info!(
            repo_url = %self.host.raw_url(),
            interval_secs = self.interval.as_secs(),
            subscriptions = self.subscriptions.len(),
            "observing"
        );

        loop {
            if token.is_cancelled() {
                info!("watch cancelled");
                return Ok(());
            }

            let snapshot = self.host.fetch_repository().await?;
            if snapshot.pushed_at > self.last_pushed {
                info!(
                    repo = %self.host.repo_name(),
                    pushed_at = %snapshot.pushed_at,
                    last_pushed = %self.last_pushed,
                    "push detected; notifying"
                );
                self.notify(&token).await;
                self.last_pushed = snapshot.pushed_at;
                debug!(last_pushed = %self.last_pushed, "notification finished");
            }

            // The inter-tick wait honors cancellation promptly.
            tokio::select! {
                () = token.cancelled() => {
                    info!("watch cancelled");
                    return Ok(());
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Invokes every subscription with the same token and waits for all of
    /// them; a subscriber failure never blocks another's completion.
    async fn notify(&self, token: &CancellationToken) {
        let attempts = self.subscriptions.iter().enumerate().map(|(idx, sub)| {
            let sub = Arc::clone(sub);
            let token = token.clone();
            async move { (idx, sub.notify(token).await) }
        });

        for (idx, outcome) in join_all(attempts).await {
            match outcome {
                Ok(()) => debug!(repo = %self.host.repo_name(), idx, "notified"),
                Err(err @ DeployError::DockerfileMissing) => {
                    warn!(repo = %self.host.repo_name(), idx, error = %err, "deploy attempt skipped");
                }
                Err(err) => {
                    error!(repo = %self.host.repo_name(), idx, error = %err, "failed to notify");
                }
            }
        }
    }
}
