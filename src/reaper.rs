//! Periodic reaper that sweeps expired session records.
//!
//! Each pass scans the table for records whose `expires` attribute lies
//! strictly before now, projecting only the key to keep transfer small,
//! then deletes the matches sequentially — one awaited deletion at a time,
//! bounding the load put on the backend. A failed scan aborts the pass;
//! the next pass still fires on schedule.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing;

use crate::error::{ErrorKind, StoreError};
use crate::record::ExpiryFilter;
use crate::result::StoreResult;
use crate::traits::KeyValueBackend;

/// Handle to a running reaper task.
///
/// Stopping is cooperative: the cancel signal is observed between passes,
/// never mid-pass. Dropping the handle without stopping aborts the task.
#[derive(Debug)]
pub struct ReaperHandle {
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ReaperHandle {
    /// Signal the task to stop and wait for it to finish.
    pub(crate) async fn stop(mut self) {
        let _ = self.cancel.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn the periodic reaper. `interval_ms` must be positive.
pub(crate) fn spawn(
    backend: Arc<dyn KeyValueBackend>,
    table: String,
    prefix: String,
    interval_ms: i64,
) -> ReaperHandle {
    let (cancel, mut cancelled) = watch::channel(false);
    let period = Duration::from_millis(interval_ms as u64);

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the first pass should run
        // a full interval after startup.
        ticker.tick().await;

        tracing::info!(table = %table, interval_ms, "reaper started");
        loop {
            tokio::select! {
                _ = cancelled.changed() => {
                    if *cancelled.borrow() {
                        tracing::info!(table = %table, "reaper shutting down");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match reap_once(backend.as_ref(), &table, &prefix).await {
                        Ok(removed) => {
                            tracing::info!(table = %table, removed, "reap pass complete");
                        }
                        Err(err) => {
                            tracing::error!(table = %table, error = %err, "reap pass aborted");
                        }
                    }
                }
            }
        }
    });

    ReaperHandle {
        cancel,
        task: Some(task),
    }
}

/// Run a single reap pass, returning the number of records removed.
///
/// Per-record deletion failures are logged and skipped; a scan failure
/// aborts the whole pass before any deletion is attempted.
pub(crate) async fn reap_once(
    backend: &dyn KeyValueBackend,
    table: &str,
    prefix: &str,
) -> StoreResult<u64> {
    let now = Utc::now().timestamp_millis();
    let filter = ExpiryFilter::expires_before(now);

    let items = backend
        .scan(table, &filter, &["id"])
        .await
        .map_err(|err| {
            StoreError::with_source(ErrorKind::Scan, "expired-session scan failed", err)
        })?;

    let mut removed = 0u64;
    for item in items {
        let Some(id) = item.id else {
            tracing::warn!(table = %table, "scan item missing id attribute, skipping");
            continue;
        };
        // Recover the caller-facing sid, then delete through the same
        // prefixed-key path destroy uses.
        let sid = id.strip_prefix(prefix).unwrap_or(id.as_str());
        let key = format!("{prefix}{sid}");
        match backend.delete_item(table, &key).await {
            Ok(()) => removed += 1,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "failed to delete expired session");
            }
        }
    }
    Ok(removed)
}
