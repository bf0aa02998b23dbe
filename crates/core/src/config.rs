//! Runtime configuration loaded from environment variables.
//!
//! The binary calls `dotenvy::dotenv()` before [`Config::from_env`], so a
//! local `.env` file works in development while deployed environments rely
//! on real environment variables.

use std::time::Duration;

/// Advisory retention for generated stories. Records past this age are
/// eligible for deletion by the expiry sweeper.
pub const STORY_RETENTION: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Validity of presigned artifact URLs, matching the record retention.
pub const SIGNED_URL_TTL_SECS: u64 = 172_800;

/// Name of the secret holding the generation-provider API key. The secret
/// value is a JSON map keyed by this same name.
pub const OPENAI_SECRET_NAME: &str = "open-api-key";

/// Name of the secret holding the prediction-API key (alternate image
/// backend).
pub const REPLICATE_SECRET_NAME: &str = "replicate-api-key";

/// A required environment variable was missing or unparsable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

/// Selectable image-generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageBackend {
    /// Synchronous generation endpoint.
    OpenAi,
    /// Queued prediction API, awaited via the bounded poller.
    Replicate,
}

impl std::str::FromStr for ImageBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "openai" => Ok(ImageBackend::OpenAi),
            "replicate" => Ok(ImageBackend::Replicate),
            other => Err(format!("unknown image backend {other}")),
        }
    }
}

/// Runtime configuration for the worker daemon.
///
/// | Variable                   | Required | Default                   |
/// |----------------------------|----------|---------------------------|
/// | `DATABASE_URL`             | yes      | —                         |
/// | `STORIES_BUCKET`           | yes      | —                         |
/// | `FRONTEND_URL`             | no       | `http://localhost:3000`   |
/// | `OPENAI_API_URL`           | no       | `https://api.openai.com`  |
/// | `IMAGE_BACKEND`            | no       | `openai`                  |
/// | `REPLICATE_API_URL`        | no       | `https://api.replicate.com` |
/// | `GENERATE_INTERVAL_SECS`   | no       | `86400`                   |
/// | `CHANGE_POLL_INTERVAL_MS`  | no       | `500`                     |
/// | `CHANGE_BATCH_SIZE`        | no       | `1`                       |
/// | `EXPIRY_SWEEP_INTERVAL_SECS` | no     | `3600`                    |
/// | `NOTIFY_WEBHOOK_URL`       | no       | —                         |
/// | `NOTIFY_EMAIL_TO`          | no       | —                         |
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Bucket holding generated audio and image artifacts.
    pub stories_bucket: String,
    /// Base URL used to build story deep links in notifications.
    pub frontend_url: String,
    /// Base URL of the OpenAI-compatible text/image API.
    pub openai_api_url: String,
    /// Which image backend to use: `openai` (synchronous) or `replicate`
    /// (queued prediction, polled).
    pub image_backend: ImageBackend,
    /// Base URL of the prediction API used by the `replicate` backend.
    pub replicate_api_url: String,
    /// How often the generator trigger fires.
    pub generate_interval: Duration,
    /// How often the change-capture reader polls the change log.
    pub change_poll_interval: Duration,
    /// Change-log rows fetched per poll. Kept at 1 by default to bound the
    /// retry blast radius of a poisoned batch.
    pub change_batch_size: i64,
    /// How often expired stories are swept.
    pub expiry_sweep_interval: Duration,
    /// Webhook endpoint for story notifications, if configured.
    pub notify_webhook_url: Option<String>,
    /// Email recipient for story notifications, if configured.
    pub notify_email_to: Option<String>,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            stories_bucket: require("STORIES_BUCKET")?,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            image_backend: parse_or("IMAGE_BACKEND", ImageBackend::OpenAi)?,
            replicate_api_url: std::env::var("REPLICATE_API_URL")
                .unwrap_or_else(|_| "https://api.replicate.com".to_string()),
            generate_interval: Duration::from_secs(parse_or(
                "GENERATE_INTERVAL_SECS",
                86_400,
            )?),
            change_poll_interval: Duration::from_millis(parse_or(
                "CHANGE_POLL_INTERVAL_MS",
                500,
            )?),
            change_batch_size: parse_or("CHANGE_BATCH_SIZE", 1)?,
            expiry_sweep_interval: Duration::from_secs(parse_or(
                "EXPIRY_SWEEP_INTERVAL_SECS",
                3_600,
            )?),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
            notify_email_to: std::env::var("NOTIFY_EMAIL_TO").ok(),
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingVar(var))
}

fn parse_or<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value: raw }),
        Err(_) => Ok(default),
    }
}
