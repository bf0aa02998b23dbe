//! Pipeline-wide error taxonomy.
//!
//! Every component maps its failures into [`PipelineError`] so the
//! subscriber runner can decide uniformly between redelivery and drop.
//! Workers and the generator never catch-and-swallow: errors propagate with
//! `?` and surface to whatever invoked the component.

/// Failure taxonomy for all pipeline components.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A collaborator (secret store, record store, object store, generation
    /// provider, network) failed or was unreachable. Retryable: redelivery
    /// of the triggering event is expected to succeed eventually.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Malformed input: a broken change record, empty reference data, an
    /// unparsable completion. Not retryable — redelivering the same input
    /// reproduces the same failure, so the input is dropped and logged.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A generation provider refused the request for rate or quota reasons.
    /// Retryable; the backoff between attempts belongs to the redelivery
    /// mechanism, not the component.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Forward progress is impossible (e.g. the change-log reader keeps
    /// failing). The component must stop and alert rather than skip.
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl PipelineError {
    /// Whether redelivering the triggering event may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::UpstreamUnavailable(_) | PipelineError::QuotaExceeded(_)
        )
    }

    /// Wrap any displayable upstream failure.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        PipelineError::UpstreamUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_and_quota_are_retryable() {
        assert!(PipelineError::UpstreamUnavailable("s3 down".into()).is_retryable());
        assert!(PipelineError::QuotaExceeded("429".into()).is_retryable());
    }

    #[test]
    fn invalid_input_and_fatal_are_not_retryable() {
        assert!(!PipelineError::InvalidInput("missing title".into()).is_retryable());
        assert!(!PipelineError::Fatal("reader stuck".into()).is_retryable());
    }

    #[test]
    fn display_includes_detail() {
        let err = PipelineError::upstream("connection refused");
        assert_eq!(err.to_string(), "Upstream unavailable: connection refused");
    }
}
