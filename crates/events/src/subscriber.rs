//! Per-subscriber delivery loop.
//!
//! Each [`Subscription`] owns one handler and one broadcast receiver and
//! runs as its own task, so a failing or slow subscriber never blocks or
//! affects the others. Delivery is at-least-once: a retryable handler
//! failure is redelivered with exponential backoff before the event is
//! given up on, and handlers must tolerate duplicates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use storymill_core::{BackoffPolicy, PipelineError};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::EventPattern;
use crate::event::{EventEnvelope, StoryGenerated};

/// Delivery attempts per event, including the first.
const MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// A consumer of [`StoryGenerated`] events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Process one event. Must be idempotent: the same event may be
    /// delivered more than once.
    async fn handle(&self, event: &StoryGenerated) -> Result<(), PipelineError>;
}

/// One subscriber registration: a pattern, a handler, and a redelivery
/// policy.
pub struct Subscription {
    pattern: EventPattern,
    handler: Arc<dyn EventHandler>,
    backoff: BackoffPolicy,
}

impl Subscription {
    /// Create a subscription with the standard redelivery backoff
    /// (1 s, 2 s between attempts).
    pub fn new(pattern: EventPattern, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            pattern,
            handler,
            backoff: BackoffPolicy {
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(4),
                multiplier: 2.0,
                max_elapsed: Duration::from_secs(60),
            },
        }
    }

    /// Override the redelivery backoff (tests use millisecond delays).
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run the delivery loop.
    ///
    /// Exits when cancelled or when the bus is dropped. Envelopes that do
    /// not match the pattern are skipped without touching the handler.
    pub async fn run(self, mut receiver: broadcast::Receiver<EventEnvelope>, cancel: CancellationToken) {
        let name = self.handler.name();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(subscriber = name, "Subscription cancelled");
                    return;
                }
                received = receiver.recv() => match received {
                    Ok(envelope) => {
                        if !self.pattern.matches(&envelope) {
                            continue;
                        }
                        let event: StoryGenerated =
                            match serde_json::from_value(envelope.detail.clone()) {
                                Ok(event) => event,
                                Err(e) => {
                                    tracing::warn!(
                                        subscriber = name,
                                        error = %e,
                                        "Dropped envelope with malformed detail"
                                    );
                                    continue;
                                }
                            };
                        self.deliver(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(subscriber = name, skipped = n, "Subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(subscriber = name, "Event bus closed, subscription shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Invoke the handler, redelivering on retryable failure.
    ///
    /// Non-retryable failures drop the event immediately: redelivering the
    /// same malformed input would reproduce the same failure.
    async fn deliver(&self, event: &StoryGenerated) {
        let name = self.handler.name();
        let mut delay = self.backoff.initial_delay;

        for attempt in 1..=MAX_DELIVERY_ATTEMPTS {
            match self.handler.handle(event).await {
                Ok(()) => {
                    tracing::info!(subscriber = name, story_id = %event.id, attempt, "Event handled");
                    return;
                }
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(
                        subscriber = name,
                        story_id = %event.id,
                        error = %e,
                        "Non-retryable failure, event dropped"
                    );
                    return;
                }
                Err(e) if attempt < MAX_DELIVERY_ATTEMPTS => {
                    tracing::warn!(
                        subscriber = name,
                        story_id = %event.id,
                        attempt,
                        error = %e,
                        "Delivery failed, redelivering"
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.backoff.next_delay(delay);
                }
                Err(e) => {
                    tracing::error!(
                        subscriber = name,
                        story_id = %event.id,
                        attempts = MAX_DELIVERY_ATTEMPTS,
                        error = %e,
                        "Delivery attempts exhausted, event dropped"
                    );
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
