//! Natural-language insight generation via a remote language model.

mod client;
mod prompt;
mod types;

use std::time::Duration;

use thiserror::Error;

pub use client::InsightClient;
pub use prompt::{build_prompt, SYSTEM_ROLE};

/// Why an insight could not be produced. None of these affect analytics.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("OPENAI_API_KEY not set")]
    NotConfigured,

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("service returned no text")]
    EmptyResponse,

    #[error("failed to encode summary: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl InsightError {
    /// Worth retrying: connection trouble, rate limiting, server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            InsightError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            InsightError::Service { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Text shown in place of an insight when generation fails.
pub fn unavailable_message(err: &InsightError) -> String {
    format!("Insight unavailable: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let rate_limited = InsightError::Service { status: 429, body: String::new() };
        let server = InsightError::Service { status: 503, body: String::new() };
        let bad_request = InsightError::Service { status: 400, body: String::new() };

        assert!(rate_limited.is_transient());
        assert!(server.is_transient());
        assert!(!bad_request.is_transient());
        assert!(!InsightError::NotConfigured.is_transient());
        assert!(!InsightError::EmptyResponse.is_transient());
    }

    #[test]
    fn test_unavailable_message() {
        assert_eq!(
            unavailable_message(&InsightError::NotConfigured),
            "Insight unavailable: OPENAI_API_KEY not set"
        );
    }
}
