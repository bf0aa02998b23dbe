//! Event infrastructure for the storymill pipeline.
//!
//! This crate carries the path from a raw change-log row to a delivered
//! domain event:
//!
//! - [`StoryGenerated`] / [`EventEnvelope`] — the canonical domain event
//!   and its routing envelope.
//! - [`translate`] — pure, schema-validated mapping from a change record
//!   to the domain event (insert-only).
//! - [`EventBus`] — pattern-matched publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ChangeCapture`] — tails the record store's change log and publishes
//!   one event per observed insert.
//! - [`Subscription`] — per-subscriber delivery loop with at-least-once
//!   redelivery and failure isolation.

pub mod bus;
pub mod capture;
pub mod event;
pub mod subscriber;
pub mod translate;

pub use bus::{EventBus, EventPattern};
pub use capture::ChangeCapture;
pub use event::{EventEnvelope, StoryGenerated, EVENT_SOURCE, STORY_GENERATED};
pub use subscriber::{EventHandler, Subscription};
pub use translate::translate;
