//! Text-completion capability.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use storymill_core::PipelineError;

/// Completion model used for story generation.
const COMPLETION_MODEL: &str = "text-davinci-003";

/// HTTP request timeout for a single completion call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Given a text prompt, return generated text.
///
/// The API key is passed per call: credentials are fetched from the secret
/// store at invocation time, not baked into the client.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, PipelineError>;
}

/// Response shape of the `/v1/completions` endpoint.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// HTTP client for an OpenAI-compatible completion endpoint.
pub struct OpenAiCompletions {
    client: reqwest::Client,
    api_url: String,
}

impl OpenAiCompletions {
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
impl TextGenerator for OpenAiCompletions {
    async fn complete(
        &self,
        api_key: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, PipelineError> {
        let body = serde_json::json!({
            "model": COMPLETION_MODEL,
            "prompt": prompt,
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(format!("{}/v1/completions", self.api_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        let parsed: CompletionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(PipelineError::upstream)?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            PipelineError::UpstreamUnavailable("completion returned no choices".to_string())
        })?;

        Ok(choice.text)
    }
}

/// Map a non-success response to the pipeline error taxonomy:
/// 429 is a quota refusal, anything else upstream-unavailable.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, PipelineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());

    if status.as_u16() == 429 {
        Err(PipelineError::QuotaExceeded(format!(
            "provider refused ({status}): {body}"
        )))
    } else {
        Err(PipelineError::UpstreamUnavailable(format!(
            "provider error ({status}): {body}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_response_parses() {
        let raw = r#"{"choices":[{"text":"The Title\nA story."}],"model":"text-davinci-003"}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].text, "The Title\nA story.");
    }

    #[test]
    fn empty_choices_parse_to_empty_vec() {
        let parsed: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
