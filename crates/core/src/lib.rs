//! Shared types, error taxonomy, configuration, and retry policy for the
//! storymill pipeline.
//!
//! Every other crate in the workspace depends on this one. It deliberately
//! contains no I/O: storage, networking, and scheduling live in the crates
//! that own those concerns.

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::Config;
pub use error::PipelineError;
pub use retry::BackoffPolicy;
