// ABOUTME: Library crate for shipwatch exposing the watch/deploy pipeline for testing and external use

use std::io::Write;
use std::sync::{Arc, Mutex};

pub mod config;
pub mod deploy;
pub mod docker;
pub mod git;
pub mod host;
pub mod observer;

/// Shared byte sink for clone and image-build progress output.
pub type ProgressSink = Arc<Mutex<dyn Write + Send>>;

/// Progress sink that forwards to the process's stdout.
pub fn stdout_sink() -> ProgressSink {
    Arc::new(Mutex::new(std::io::stdout()))
}
