//! Alternate asynchronous image backend (Replicate-style prediction API).
//!
//! The provider queues a prediction and exposes a status URL. Awaiting
//! completion is an explicit bounded-retry state machine: each poll yields
//! `Pending`, `Succeeded`, or `Failed`, delays grow exponentially, and an
//! elapsed-time budget converts an endless `Pending` into
//! [`PollOutcome::TimedOut`]. There is no unbounded loop anywhere on this
//! path.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use storymill_core::{BackoffPolicy, PipelineError};

use crate::completion::check_status;
use crate::image::ImageGenerator;

/// Stable-diffusion model version submitted with each prediction.
const MODEL_VERSION: &str = "db21e45d3f7023abc2a46ee38a23973f6dce16bb082a930b0c49861f96d1e5bf";

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// State of a prediction as reported by one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionStatus {
    /// Still queued or running.
    Pending,
    /// Finished; carries the output image URL.
    Succeeded(String),
    /// The provider gave up on the prediction.
    Failed(String),
}

/// Final result of awaiting a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded(String),
    Failed(String),
    /// The elapsed-time budget ran out while the prediction was pending.
    TimedOut,
}

/// Response shape of the prediction-creation endpoint.
#[derive(Debug, Deserialize)]
struct CreatePredictionResponse {
    urls: PredictionUrls,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

impl PredictionStatus {
    /// Parse one status-poll response body.
    pub fn from_response(body: &serde_json::Value) -> Result<Self, PipelineError> {
        let status = body
            .get("status")
            .and_then(|s| s.as_str())
            .ok_or_else(|| {
                PipelineError::UpstreamUnavailable("prediction response missing status".into())
            })?;

        match status {
            "starting" | "processing" => Ok(PredictionStatus::Pending),
            "succeeded" => {
                let output = body
                    .get("output")
                    .and_then(|o| o.as_array())
                    .and_then(|a| a.first())
                    .and_then(|u| u.as_str())
                    .ok_or_else(|| {
                        PipelineError::UpstreamUnavailable(
                            "succeeded prediction has no output".into(),
                        )
                    })?;
                Ok(PredictionStatus::Succeeded(output.to_string()))
            }
            "failed" | "canceled" => {
                let reason = body
                    .get("error")
                    .and_then(|e| e.as_str())
                    .unwrap_or(status);
                Ok(PredictionStatus::Failed(reason.to_string()))
            }
            other => Err(PipelineError::UpstreamUnavailable(format!(
                "unexpected prediction status \"{other}\""
            ))),
        }
    }
}

/// Drive status polls until the prediction settles or the budget runs out.
///
/// Generic over the fetch so tests can script status sequences without a
/// server. A fetch error propagates immediately — the redelivery mechanism,
/// not this loop, owns retries of transport failures.
pub async fn poll_until_settled<F, Fut>(
    mut fetch: F,
    policy: &BackoffPolicy,
) -> Result<PollOutcome, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PredictionStatus, PipelineError>>,
{
    let start = tokio::time::Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match fetch().await? {
            PredictionStatus::Succeeded(url) => return Ok(PollOutcome::Succeeded(url)),
            PredictionStatus::Failed(reason) => return Ok(PollOutcome::Failed(reason)),
            PredictionStatus::Pending => {}
        }

        if policy.is_exhausted(start.elapsed()) {
            tracing::warn!(attempt, "Prediction still pending at elapsed budget, giving up");
            return Ok(PollOutcome::TimedOut);
        }

        tracing::debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Prediction pending, polling again"
        );
        tokio::time::sleep(delay).await;
        delay = policy.next_delay(delay);
    }
}

/// HTTP client for the prediction API.
///
/// Also implements [`ImageGenerator`], so the image worker can run against
/// this backend instead of the synchronous one; the queue-then-poll dance
/// stays hidden behind the same capability trait.
pub struct ReplicateClient {
    client: reqwest::Client,
    api_url: String,
    poll_policy: BackoffPolicy,
}

impl ReplicateClient {
    /// * `api_url` - Base URL, e.g. `https://api.replicate.com`.
    pub fn new(api_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            api_url,
            poll_policy: BackoffPolicy {
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(8),
                multiplier: 2.0,
                max_elapsed: Duration::from_secs(120),
            },
        }
    }

    /// Override the status-poll backoff and elapsed budget.
    pub fn with_poll_policy(mut self, policy: BackoffPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Queue a prediction and return its status URL.
    pub async fn start_prediction(
        &self,
        api_key: &str,
        prompt: &str,
        dimensions: &str,
    ) -> Result<String, PipelineError> {
        let body = serde_json::json!({
            "version": MODEL_VERSION,
            "input": {
                "prompt": prompt,
                "image_dimensions": dimensions,
                "num_outputs": 1,
                "num_inference_steps": 50,
                "guidance_scale": 7.5,
                "scheduler": "DPMSolverMultistep",
            },
        });

        let response = self
            .client
            .post(format!("{}/v1/predictions", self.api_url))
            .header("Authorization", format!("Token {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        let parsed: CreatePredictionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(PipelineError::upstream)?;

        Ok(parsed.urls.get)
    }

    /// Poll a prediction's status URL until it settles or the policy's
    /// elapsed budget runs out.
    pub async fn await_prediction(
        &self,
        api_key: &str,
        status_url: &str,
        policy: &BackoffPolicy,
    ) -> Result<PollOutcome, PipelineError> {
        // The fetch closure owns its captures so each poll yields a fully
        // owned future; `reqwest::Client` clones share the same pool.
        let client = self.client.clone();
        let api_key = api_key.to_string();
        let status_url = status_url.to_string();

        poll_until_settled(
            move || {
                let client = client.clone();
                let api_key = api_key.clone();
                let status_url = status_url.clone();
                async move {
                    let response = client
                        .get(&status_url)
                        .header("Authorization", format!("Token {api_key}"))
                        .send()
                        .await
                        .map_err(PipelineError::upstream)?;

                    let body: serde_json::Value = check_status(response)
                        .await?
                        .json()
                        .await
                        .map_err(PipelineError::upstream)?;

                    PredictionStatus::from_response(&body)
                }
            },
            policy,
        )
        .await
    }
}

#[async_trait]
impl ImageGenerator for ReplicateClient {
    /// Queue a prediction and await it through the bounded poller. A
    /// `Failed` or `TimedOut` outcome surfaces as a retryable error so the
    /// event is redelivered rather than left without an artifact.
    async fn generate_image(
        &self,
        api_key: &str,
        prompt: &str,
        size: &str,
    ) -> Result<String, PipelineError> {
        let status_url = self.start_prediction(api_key, prompt, size).await?;

        match self
            .await_prediction(api_key, &status_url, &self.poll_policy)
            .await?
        {
            PollOutcome::Succeeded(url) => Ok(url),
            PollOutcome::Failed(reason) => Err(PipelineError::UpstreamUnavailable(format!(
                "prediction failed: {reason}"
            ))),
            PollOutcome::TimedOut => Err(PipelineError::UpstreamUnavailable(
                "prediction timed out".to_string(),
            )),
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(PipelineError::upstream)?;

        Ok(bytes.to_vec())
    }
}
