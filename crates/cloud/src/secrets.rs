//! Credential lookup.

use async_trait::async_trait;
use storymill_core::PipelineError;

/// Narrow secret-store interface: name in, secret value out.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String, PipelineError>;
}

/// AWS Secrets Manager implementation.
///
/// Secrets are stored as JSON maps keyed by the secret's own name
/// (`{"open-api-key": "sk-..."}`); the value for that key is returned. A
/// missing secret, a non-string payload, or a missing key all fail hard —
/// a credential is never allowed to be silently absent.
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, name: &str) -> Result<String, PipelineError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        let raw = output.secret_string().ok_or_else(|| {
            PipelineError::UpstreamUnavailable(format!("secret {name} has no string value"))
        })?;

        let parsed: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            PipelineError::UpstreamUnavailable(format!("secret {name} is not valid JSON: {e}"))
        })?;

        parsed
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::UpstreamUnavailable(format!("secret {name} missing key \"{name}\""))
            })
    }
}
