//! Image-generation capability.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use storymill_core::PipelineError;

use crate::completion::check_status;

/// HTTP request timeout for generation and download calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Given a text prompt, return a URL to a generated image, plus the means
/// to download it.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return the provider-hosted URL.
    async fn generate_image(
        &self,
        api_key: &str,
        prompt: &str,
        size: &str,
    ) -> Result<String, PipelineError>;

    /// Download the generated image bytes from a provider URL.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, PipelineError>;
}

/// Response shape of the `/v1/images/generations` endpoint.
#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    url: String,
}

/// HTTP client for an OpenAI-compatible image-generation endpoint.
pub struct OpenAiImages {
    client: reqwest::Client,
    api_url: String,
}

impl OpenAiImages {
    /// * `api_url` - Base URL, e.g. `https://api.openai.com`.
    pub fn new(api_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, api_url }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImages {
    async fn generate_image(
        &self,
        api_key: &str,
        prompt: &str,
        size: &str,
    ) -> Result<String, PipelineError> {
        let body = serde_json::json!({
            "prompt": prompt,
            "n": 1,
            "size": size,
        });

        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.api_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        let parsed: ImagesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(PipelineError::upstream)?;

        // An empty image list is a hard failure: proceeding would leave the
        // story with a missing artifact behind a "successful" invocation.
        let entry = parsed.data.into_iter().next().ok_or_else(|| {
            PipelineError::UpstreamUnavailable("provider returned no images".to_string())
        })?;

        Ok(entry.url)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_response_parses() {
        let raw = r#"{"created":1,"data":[{"url":"https://img.example/1.png"}]}"#;
        let parsed: ImagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data[0].url, "https://img.example/1.png");
    }

    #[test]
    fn empty_data_parses_to_empty_vec() {
        let parsed: ImagesResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(parsed.data.is_empty());
    }
}
