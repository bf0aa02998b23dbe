//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`EventEnvelope`]s. It is
//! shared via `Arc<EventBus>` across the worker daemon. Routing works the
//! way a bus rule does: every subscriber receives every envelope and the
//! subscriber's [`EventPattern`] decides whether its handler runs, so
//! delivery to the N subscribers is independent and unordered.

use tokio::sync::broadcast;

use crate::event::{EventEnvelope, EVENT_SOURCE, STORY_GENERATED};

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// EventPattern
// ---------------------------------------------------------------------------

/// Source/detail-type pattern a subscriber registers against.
///
/// A `None` field matches anything, mirroring an event-bus rule that omits
/// that key.
#[derive(Debug, Clone, Default)]
pub struct EventPattern {
    pub source: Option<String>,
    pub detail_type: Option<String>,
}

impl EventPattern {
    /// The pattern every pipeline subscriber uses:
    /// `source = "ai.stories"`, `detailType = "StoryGenerated"`.
    pub fn story_generated() -> Self {
        Self {
            source: Some(EVENT_SOURCE.to_string()),
            detail_type: Some(STORY_GENERATED.to_string()),
        }
    }

    /// Whether an envelope matches this pattern.
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        let source_ok = self
            .source
            .as_ref()
            .map_or(true, |s| *s == envelope.source);
        let detail_ok = self
            .detail_type
            .as_ref()
            .map_or(true, |d| *d == envelope.detail_type);
        source_ok && detail_ok
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`EventEnvelope`].
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an envelope to all current subscribers.
    ///
    /// If there are no active subscribers the envelope is silently dropped.
    pub fn publish(&self, envelope: EventEnvelope) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(envelope);
    }

    /// Subscribe to all envelopes published on this bus. Pattern filtering
    /// happens in the subscriber's own delivery loop.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::StoryGenerated;

    fn sample_envelope() -> EventEnvelope {
        EventEnvelope::story_generated(&StoryGenerated {
            id: "s-1".to_string(),
            title: "Title".to_string(),
            description: "Body".to_string(),
            scene: "a quiet forest".to_string(),
        })
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(sample_envelope());

        let received = rx.recv().await.expect("should receive the envelope");
        assert_eq!(received.detail_type, "StoryGenerated");
        assert_eq!(received.detail["id"], "s-1");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_envelope() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let mut rx3 = bus.subscribe();

        bus.publish(sample_envelope());

        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            let envelope = rx.recv().await.expect("each subscriber receives");
            assert_eq!(envelope.source, "ai.stories");
        }
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(sample_envelope());
    }

    #[test]
    fn pattern_matches_source_and_detail_type() {
        let pattern = EventPattern::story_generated();
        assert!(pattern.matches(&sample_envelope()));
    }

    #[test]
    fn pattern_rejects_other_source() {
        let pattern = EventPattern {
            source: Some("other.system".to_string()),
            detail_type: None,
        };
        assert!(!pattern.matches(&sample_envelope()));
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let pattern = EventPattern::default();
        assert!(pattern.matches(&sample_envelope()));
    }
}
