//! Locating and opening the server socket.

use std::path::Path;
use std::time::Duration;

use tokio::net::UnixStream;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::ConnectionConfig;
use crate::error::{ClientError, Result};

/// Poll until `path` exists.
///
/// Fails with `EndpointTimeout` once `timeout` has elapsed, or with
/// `Cancelled` as soon as `cancel` holds `true` (or its sender is dropped).
pub async fn wait_for_endpoint(
    path: &Path,
    poll_interval: Duration,
    timeout: Option<Duration>,
    mut cancel: Option<watch::Receiver<bool>>,
) -> Result<()> {
    let start = Instant::now();
    let deadline = timeout.map(|t| start + t);

    loop {
        if is_cancelled(cancel.as_ref()) {
            return Err(ClientError::Cancelled);
        }
        if tokio::fs::try_exists(path).await? {
            return Ok(());
        }

        let mut wake = Instant::now() + poll_interval;
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(ClientError::EndpointTimeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }
            wake = wake.min(deadline);
        }

        debug!(path = %path.display(), "endpoint not present yet");

        match cancel.as_mut() {
            Some(rx) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(wake) => {}
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return Err(ClientError::Cancelled);
                        }
                    }
                }
            }
            None => tokio::time::sleep_until(wake).await,
        }
    }
}

fn is_cancelled(cancel: Option<&watch::Receiver<bool>>) -> bool {
    cancel.is_some_and(|rx| *rx.borrow())
}

/// Wait for the configured socket to appear, then connect to it.
#[instrument(skip_all, fields(path = %config.socket_path.display()))]
pub async fn connect(
    config: &ConnectionConfig,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<UnixStream> {
    info!("waiting for ANN server");
    wait_for_endpoint(
        &config.socket_path,
        config.poll_interval(),
        config.connect_timeout(),
        cancel,
    )
    .await?;

    let stream = UnixStream::connect(&config.socket_path)
        .await
        .map_err(|source| ClientError::Connect {
            path: config.socket_path.clone(),
            source,
        })?;
    info!("connected");
    Ok(stream)
}
