//! Storymill worker daemon.
//!
//! Wires the whole pipeline together: change capture feeding the event
//! bus, three independent subscribers (image worker, audio worker,
//! notifier), the TTL expiry sweeper, and the interval trigger that
//! invokes the story generator. All clients are constructed here and
//! passed down explicitly; nothing holds process-wide singletons.

use std::sync::Arc;

use async_trait::async_trait;
use storymill_cloud::{ObjectStore, S3ObjectStore, SecretStore, SecretsManagerStore};
use storymill_core::config::{ImageBackend, REPLICATE_SECRET_NAME};
use storymill_core::{Config, PipelineError};
use storymill_db::{ExpirySweeper, PgRecordStore, RecordStore};
use storymill_events::{ChangeCapture, EventBus, EventHandler, EventPattern, Subscription};
use storymill_genai::{
    ImageGenerator, OpenAiCompletions, OpenAiImages, PollySynthesizer, ReplicateClient,
    SpeechSynthesizer, TextGenerator,
};
use storymill_pipeline::{
    AudioWorker, EmailChannel, ImageWorker, NotificationChannel, StoryGenerator, StoryNotifier,
    WebhookChannel,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Fallback channel when neither webhook nor email is configured:
/// notifications land in the operator log.
struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, message: &str) -> Result<(), PipelineError> {
        tracing::info!(message, "Story notification");
        Ok(())
    }
}

/// Pick the configured notification channel.
fn notification_channel(config: &Config) -> Arc<dyn NotificationChannel> {
    if let Some(url) = &config.notify_webhook_url {
        return Arc::new(WebhookChannel::new(url.clone()));
    }
    if let Some(to) = &config.notify_email_to {
        if let Some(channel) = EmailChannel::from_env(to.clone()) {
            return Arc::new(channel);
        }
        tracing::warn!("NOTIFY_EMAIL_TO set but SMTP_HOST missing, logging notifications");
    }
    Arc::new(LogChannel)
}

/// The scheduled generator trigger.
///
/// Fires on a fixed interval (the first tick is skipped so start-up does
/// not create a story). A failed invocation is logged and left to the next
/// tick — the generator itself never retries.
async fn generation_schedule(generator: StoryGenerator, config: Config, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(config.generate_interval);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Generation schedule cancelled");
                return;
            }
            _ = interval.tick() => {
                match generator.run().await {
                    Ok(story) => {
                        tracing::info!(story_id = %story.id, "Scheduled story generation succeeded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Scheduled story generation failed");
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = storymill_db::create_pool(&config.database_url).await?;
    sqlx::migrate!("../db/migrations").run(&pool).await?;
    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));

    let aws_config = aws_config::load_from_env().await;
    let objects: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(
        aws_sdk_s3::Client::new(&aws_config),
        config.stories_bucket.clone(),
    ));
    let secrets: Arc<dyn SecretStore> = Arc::new(SecretsManagerStore::new(
        aws_sdk_secretsmanager::Client::new(&aws_config),
    ));
    let text: Arc<dyn TextGenerator> =
        Arc::new(OpenAiCompletions::new(config.openai_api_url.clone()));
    let (images, image_secret): (Arc<dyn ImageGenerator>, &str) = match config.image_backend {
        ImageBackend::OpenAi => (
            Arc::new(OpenAiImages::new(config.openai_api_url.clone())),
            storymill_core::config::OPENAI_SECRET_NAME,
        ),
        ImageBackend::Replicate => (
            Arc::new(ReplicateClient::new(config.replicate_api_url.clone())),
            REPLICATE_SECRET_NAME,
        ),
    };
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(PollySynthesizer::new(
        aws_sdk_polly::Client::new(&aws_config),
    ));

    let bus = Arc::new(EventBus::default());
    let cancel = CancellationToken::new();

    // One subscription task per target; failures in one never block the
    // others.
    let handlers: Vec<Arc<dyn EventHandler>> = vec![
        Arc::new(
            ImageWorker::new(secrets.clone(), images, objects.clone(), store.clone())
                .with_secret_name(image_secret),
        ),
        Arc::new(AudioWorker::new(speech, objects.clone(), store.clone())),
        Arc::new(StoryNotifier::new(
            notification_channel(&config),
            config.frontend_url.clone(),
        )),
    ];
    for handler in handlers {
        let subscription = Subscription::new(EventPattern::story_generated(), handler);
        let receiver = bus.subscribe();
        let sub_cancel = cancel.clone();
        tokio::spawn(async move { subscription.run(receiver, sub_cancel).await });
    }

    // Store-owned TTL expiry.
    let sweeper = ExpirySweeper::new(store.clone(), config.expiry_sweep_interval);
    let sweeper_cancel = cancel.clone();
    tokio::spawn(async move { sweeper.run(sweeper_cancel).await });

    // Scheduled generator trigger.
    let generator = StoryGenerator::new(store.clone(), secrets, text);
    let schedule_cancel = cancel.clone();
    let schedule_config = config.clone();
    tokio::spawn(async move {
        generation_schedule(generator, schedule_config, schedule_cancel).await
    });

    // Change capture runs in the foreground; a fatal reader error stops
    // the daemon instead of silently skipping backlog.
    let capture = ChangeCapture::new(
        store,
        bus,
        config.change_poll_interval,
        config.change_batch_size,
    );

    tracing::info!("Storymill worker started");

    tokio::select! {
        result = capture.run(cancel.clone()) => {
            cancel.cancel();
            if let Err(e) = result {
                tracing::error!(error = %e, "Change capture halted");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            cancel.cancel();
        }
    }

    Ok(())
}
