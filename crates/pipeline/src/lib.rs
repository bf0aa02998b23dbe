//! Pipeline components: the content generator that seeds a story, the two
//! enrichment workers that attach derived artifacts to it, and the
//! notification dispatcher that announces it.
//!
//! Every component receives its collaborators (record store, secret store,
//! object store, generation capabilities, notification channel) as
//! explicitly constructed trait objects — there are no process-wide client
//! singletons, and tests substitute fakes through the same constructors.

pub mod audio_worker;
pub mod generator;
pub mod image_worker;
pub mod notify;
pub mod prompt;

pub use audio_worker::AudioWorker;
pub use generator::StoryGenerator;
pub use image_worker::ImageWorker;
pub use notify::{EmailChannel, NotificationChannel, StoryNotifier, WebhookChannel};
