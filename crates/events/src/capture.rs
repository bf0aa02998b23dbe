//! Change-capture reader.
//!
//! [`ChangeCapture`] tails the record store's change log and publishes one
//! [`EventEnvelope`] per observed insert. It starts from the latest
//! sequence number — historical inserts are not replayed — and fetches
//! small batches (1 by default) to bound the blast radius of a poisoned
//! record.

use std::sync::Arc;
use std::time::Duration;

use storymill_core::PipelineError;
use storymill_db::RecordStore;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::event::EventEnvelope;
use crate::translate::translate;

/// Consecutive change-log read failures tolerated before the reader gives
/// up. Crossing this budget is fatal: the reader halts and surfaces the
/// error instead of silently skipping past backlog.
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Tails the stories change log and publishes domain events.
pub struct ChangeCapture {
    store: Arc<dyn RecordStore>,
    bus: Arc<EventBus>,
    poll_interval: Duration,
    batch_size: i64,
}

impl ChangeCapture {
    pub fn new(
        store: Arc<dyn RecordStore>,
        bus: Arc<EventBus>,
        poll_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            bus,
            poll_interval,
            batch_size,
        }
    }

    /// Run the capture loop until cancelled or a fatal failure.
    ///
    /// Returns `Ok(())` on cancellation. A [`PipelineError::Fatal`] return
    /// means forward progress is impossible and the operator must
    /// intervene; the caller should treat it as a reason to shut down.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), PipelineError> {
        // Start at the latest position: no replay of historical inserts.
        let mut cursor = self.store.latest_change_seq().await.map_err(|e| {
            PipelineError::Fatal(format!("cannot establish change-log cursor: {e}"))
        })?;

        tracing::info!(cursor, "Change capture started");

        let mut consecutive_failures = 0u32;
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Change capture cancelled");
                    return Ok(());
                }
                _ = interval.tick() => {
                    match self.store.changes_after(cursor, self.batch_size).await {
                        Ok(changes) => {
                            consecutive_failures = 0;
                            for change in changes {
                                cursor = change.seq;
                                self.forward(&change);
                            }
                        }
                        Err(e) => {
                            consecutive_failures += 1;
                            tracing::error!(
                                error = %e,
                                consecutive_failures,
                                "Change-log read failed"
                            );
                            if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                                return Err(PipelineError::Fatal(format!(
                                    "change-log reader stalled after \
                                     {consecutive_failures} consecutive failures: {e}"
                                )));
                            }
                        }
                    }
                }
            }
        }
    }

    /// Translate one change record and publish the resulting event, if any.
    ///
    /// A malformed record is logged and dropped; the cursor has already
    /// advanced, so one bad row never blocks the tail.
    fn forward(&self, change: &storymill_db::models::change::ChangeRecord) {
        match translate(change) {
            Ok(Some(event)) => {
                tracing::info!(seq = change.seq, story_id = %event.id, "Story insert captured");
                self.bus.publish(EventEnvelope::story_generated(&event));
            }
            Ok(None) => {
                tracing::debug!(seq = change.seq, op = %change.op, "Non-insert change suppressed");
            }
            Err(e) => {
                tracing::warn!(seq = change.seq, error = %e, "Dropped malformed change record");
            }
        }
    }
}
