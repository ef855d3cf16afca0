// ABOUTME: Git clone plumbing shared by the repository host variants

use crate::ProgressSink;
use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks};
use std::path::Path;

/// Clones `url` into `target`, authenticating with the access token over
/// basic transport auth (`bearer` username, token password) and streaming the
/// remote's sideband progress into `progress`.
///
/// Blocking; callers on the async runtime run this through `spawn_blocking`.
pub fn clone_repository(
    url: &str,
    target: &Path,
    access_token: &str,
    progress: ProgressSink,
) -> Result<(), git2::Error> {
    let token = access_token.to_string();

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, _username, _allowed| {
        Cred::userpass_plaintext("bearer", &token)
    });
    callbacks.sideband_progress(move |data| {
        if let Ok(mut sink) = progress.lock() {
            let _ = sink.write_all(data);
        }
        true
    });

    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(callbacks);

    RepoBuilder::new().fetch_options(fetch).clone(url, target)?;
    Ok(())
}
