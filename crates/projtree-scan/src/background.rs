//! Running a scan on a blocking worker.

use std::path::Path;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use projtree_core::{Node, ScanConfig, ScanError};

use crate::progress::ScanProgress;
use crate::scanner::{FileScanner, ScanOutcome};

/// Channel buffer size for scan events.
pub const SCAN_CHANNEL_SIZE: usize = 100;

/// Event sent through the channel of a background scan.
#[derive(Debug)]
pub enum ScanEvent {
    /// Progress update.
    Progress(ScanProgress),
    /// The scan finished, was cancelled, or failed. Always the last event.
    Complete(Result<ScanOutcome, ScanError>),
}

/// Consumer side of a background scan.
///
/// Dropping the handle cancels the scan.
#[derive(Debug)]
pub struct ScanHandle {
    rx: mpsc::Receiver<ScanEvent>,
    cancel: CancellationToken,
}

impl ScanHandle {
    /// Next event, or `None` once the worker is gone.
    pub async fn recv(&mut self) -> Option<ScanEvent> {
        self.rx.recv().await
    }

    /// Ask the worker to stop at the next entry boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Skip progress events and wait for the result.
    pub async fn wait(mut self) -> Result<ScanOutcome, ScanError> {
        while let Some(event) = self.rx.recv().await {
            if let ScanEvent::Complete(result) = event {
                return result;
            }
        }
        Err(ScanError::Other {
            message: "Scan worker ended without a result".to_string(),
        })
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        // Nobody is left to receive the result.
        self.cancel.cancel();
    }
}

/// Start `scanner` on a blocking worker of the current tokio runtime.
///
/// Progress published by the scanner is forwarded as [`ScanEvent::Progress`];
/// the final [`ScanEvent::Complete`] follows the last progress event.
pub fn start_scan<C>(scanner: FileScanner, config: ScanConfig, classify: C) -> ScanHandle
where
    C: FnMut(&Path) -> Option<Node> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_SIZE);
    let cancel = scanner.cancellation_token();

    let mut progress_rx = scanner.subscribe();
    let progress_tx = tx.clone();
    let forward = tokio::spawn(async move {
        loop {
            match progress_rx.recv().await {
                Ok(progress) => {
                    if progress_tx.send(ScanEvent::Progress(progress)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "progress receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || scanner.scan(&config, classify))
            .await
            .unwrap_or_else(|e| {
                Err(ScanError::Other {
                    message: format!("Scan task failed: {e}"),
                })
            });
        // The scanner (and its progress sender) is dropped by now, so the
        // forwarder drains and exits.
        let _ = forward.await;
        let _ = tx.send(ScanEvent::Complete(result)).await;
    });

    ScanHandle { rx, cancel }
}
