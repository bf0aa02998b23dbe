//! Notification dispatcher.
//!
//! [`StoryNotifier`] consumes the same [`StoryGenerated`] event as the
//! enrichment workers, renders a human-readable message with a deep link
//! to the story, and hands it to a [`NotificationChannel`]. No state is
//! mutated; a channel failure is isolated from the workers by the
//! subscriber runner.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use storymill_core::PipelineError;
use storymill_events::{EventHandler, StoryGenerated};

/// HTTP request timeout for a single webhook delivery attempt.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@storymill.local";

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

// ---------------------------------------------------------------------------
// NotificationChannel
// ---------------------------------------------------------------------------

/// Anything that can carry a plain-text notification to a human.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), PipelineError>;
}

// ---------------------------------------------------------------------------
// WebhookChannel
// ---------------------------------------------------------------------------

/// Posts notifications as JSON to an external URL.
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, url }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, message: &str) -> Result<(), PipelineError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        if !response.status().is_success() {
            return Err(PipelineError::UpstreamUnavailable(format!(
                "notification webhook returned HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmailChannel
// ---------------------------------------------------------------------------

/// Sends notifications as plain-text email via SMTP.
pub struct EmailChannel {
    smtp_host: String,
    smtp_port: u16,
    from_address: String,
    to_address: String,
    smtp_user: Option<String>,
    smtp_password: Option<String>,
}

impl EmailChannel {
    /// Build a channel from `SMTP_*` environment variables for the given
    /// recipient. Returns `None` if `SMTP_HOST` is not set, signalling that
    /// email delivery is not configured.
    pub fn from_env(to_address: String) -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            to_address,
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    async fn send(&self, message: &str) -> Result<(), PipelineError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(PipelineError::upstream)?,
            )
            .to(self.to_address.parse().map_err(PipelineError::upstream)?)
            .subject("[storymill] New story")
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())
            .map_err(PipelineError::upstream)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)
                .map_err(PipelineError::upstream)?
                .port(self.smtp_port);

        if let (Some(user), Some(pass)) = (&self.smtp_user, &self.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await.map_err(PipelineError::upstream)?;

        tracing::info!(to = %self.to_address, "Notification email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StoryNotifier
// ---------------------------------------------------------------------------

/// Renders and dispatches the "new story" notification.
pub struct StoryNotifier {
    channel: Arc<dyn NotificationChannel>,
    frontend_url: String,
}

impl StoryNotifier {
    pub fn new(channel: Arc<dyn NotificationChannel>, frontend_url: String) -> Self {
        Self {
            channel,
            frontend_url,
        }
    }

    /// The fixed human-readable message, with a deep link to the story.
    fn render(&self, event: &StoryGenerated) -> String {
        format!(
            "New story created: \"{}\" {}/story?id={}",
            event.title, self.frontend_url, event.id
        )
    }
}

#[async_trait]
impl EventHandler for StoryNotifier {
    fn name(&self) -> &'static str {
        "story-notifier"
    }

    async fn handle(&self, event: &StoryGenerated) -> Result<(), PipelineError> {
        let message = self.render(event);
        self.channel.send(&message).await?;
        tracing::info!(story_id = %event.id, "Story notification sent");
        Ok(())
    }
}
