//! Speech-synthesis capability.

use async_trait::async_trait;
use aws_sdk_polly::types::{OutputFormat, VoiceId};
use storymill_core::PipelineError;

/// Given text, return synthesized speech as MP3 bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        sample_rate: u32,
    ) -> Result<Vec<u8>, PipelineError>;
}

/// Amazon Polly implementation.
///
/// Credentials come from the ambient AWS configuration; unlike the
/// OpenAI-backed capabilities there is no per-call API key.
pub struct PollySynthesizer {
    client: aws_sdk_polly::Client,
}

impl PollySynthesizer {
    pub fn new(client: aws_sdk_polly::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpeechSynthesizer for PollySynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        sample_rate: u32,
    ) -> Result<Vec<u8>, PipelineError> {
        let output = self
            .client
            .synthesize_speech()
            .output_format(OutputFormat::Mp3)
            .text(text)
            .voice_id(VoiceId::from(voice))
            .sample_rate(sample_rate.to_string())
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        let bytes = output
            .audio_stream
            .collect()
            .await
            .map_err(PipelineError::upstream)?
            .into_bytes();

        Ok(bytes.to_vec())
    }
}
