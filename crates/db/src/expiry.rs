//! TTL expiry sweeper.
//!
//! [`ExpirySweeper`] runs as a background task and periodically deletes
//! stories past their `expires_at`. This is the store's own retention
//! mechanism — no other component deletes stories. Deletions land in the
//! change log as `REMOVE` records, which the capture reader suppresses.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::store::RecordStore;

/// Background service that deletes expired stories on an interval.
pub struct ExpirySweeper {
    store: Arc<dyn RecordStore>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn RecordStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run the sweep loop.
    ///
    /// A failed sweep is logged and retried on the next tick; expiry is
    /// advisory, so a late deletion is harmless. The loop exits when the
    /// provided [`CancellationToken`] is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Expiry sweeper cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.store.delete_expired(chrono::Utc::now()).await {
                        Ok(0) => {}
                        Ok(count) => {
                            tracing::info!(count, "Swept expired stories");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Expiry sweep failed");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRecordStore;
    use crate::models::story::Story;

    #[tokio::test]
    async fn sweeper_deletes_expired_on_first_tick() {
        let store = Arc::new(MemoryRecordStore::new());
        let expired = Story::new(
            "Old".to_string(),
            "Story".to_string(),
            vec![],
            "a scene".to_string(),
            chrono::Utc::now() - chrono::Duration::hours(1),
        );
        store.insert_story(&expired).await.unwrap();

        let sweeper = ExpirySweeper::new(store.clone(), Duration::from_secs(3600));
        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { sweeper.run(cancel).await })
        };

        // The first interval tick fires immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(store.get_story(&expired.id).await.unwrap().is_none());
    }
}
