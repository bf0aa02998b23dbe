//! Generation capability clients.
//!
//! Each capability is a trait so the pipeline can be tested against fakes:
//!
//! - [`TextGenerator`] — prompt-to-text completion
//!   ([`OpenAiCompletions`] over HTTP).
//! - [`ImageGenerator`] — prompt-to-image ([`OpenAiImages`] over HTTP).
//! - [`SpeechSynthesizer`] — text-to-speech ([`PollySynthesizer`] via the
//!   AWS SDK).
//! - [`replicate`] — alternate asynchronous image backend driven by a
//!   bounded-retry status poller.
//!
//! Provider refusals (HTTP 429) map to
//! [`PipelineError::QuotaExceeded`](storymill_core::PipelineError) and
//! everything else network-shaped to `UpstreamUnavailable`, so the
//! subscriber runner's redelivery handles backoff uniformly.

pub mod completion;
pub mod image;
pub mod replicate;
pub mod speech;

pub use completion::{OpenAiCompletions, TextGenerator};
pub use image::{ImageGenerator, OpenAiImages};
pub use replicate::{PollOutcome, ReplicateClient};
pub use speech::{PollySynthesizer, SpeechSynthesizer};
