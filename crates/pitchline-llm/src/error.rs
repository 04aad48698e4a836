//! Provider error types for pitchline-llm.
//!
//! All provider operations return [`Result<T>`] which uses
//! [`ProviderError`] as the error type. Call failures are mapped uniformly
//! regardless of provider: there is a variant per failure class, not per
//! provider.

use thiserror::Error;

/// Errors that can occur when interacting with an AI provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The HTTP request to the provider failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Authentication with the provider was rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The provider returned a rate-limit response (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The requested model does not exist on the provider.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The provider has no credentials configured. Treated as
    /// "unavailable" by the router, not as a call failure.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// The provider returned a response body that could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request exceeded the per-call deadline.
    #[error("timeout")]
    Timeout,

    /// An HTTP-level error from reqwest.
    #[error("http error: {0}")]
    Http(reqwest::Error),

    /// A JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Every configured provider was attempted and failed. The only case
    /// where the router surfaces failure to its caller.
    #[error("all providers failed: {}", attempts.join("; "))]
    AllProvidersExhausted {
        /// One "provider: error" summary per failed attempt.
        attempts: Vec<String>,
    },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(err)
        }
    }
}

impl ProviderError {
    /// Map a non-success HTTP status and body to the uniform error
    /// taxonomy shared by every provider adapter.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String, model: &str) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::AuthFailed(body),
            404 => ProviderError::ModelNotFound(format!("model '{model}': {body}")),
            429 => ProviderError::RateLimited(body),
            _ => ProviderError::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }
}

/// A convenience type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_request_failed() {
        let err = ProviderError::RequestFailed("connection reset".into());
        assert_eq!(err.to_string(), "request failed: connection reset");
    }

    #[test]
    fn display_not_configured() {
        let err = ProviderError::NotConfigured("set ANTHROPIC_API_KEY env var".into());
        assert_eq!(
            err.to_string(),
            "provider not configured: set ANTHROPIC_API_KEY env var"
        );
    }

    #[test]
    fn display_timeout() {
        assert_eq!(ProviderError::Timeout.to_string(), "timeout");
    }

    #[test]
    fn display_all_providers_exhausted() {
        let err = ProviderError::AllProvidersExhausted {
            attempts: vec!["claude: timeout".into(), "openai: HTTP 500".into()],
        };
        assert_eq!(
            err.to_string(),
            "all providers failed: claude: timeout; openai: HTTP 500"
        );
    }

    #[test]
    fn from_status_auth() {
        let err =
            ProviderError::from_status(reqwest::StatusCode::UNAUTHORIZED, "bad key".into(), "m");
        assert!(matches!(err, ProviderError::AuthFailed(_)));
    }

    #[test]
    fn from_status_model_not_found() {
        let err =
            ProviderError::from_status(reqwest::StatusCode::NOT_FOUND, "no model".into(), "gpt-x");
        assert!(err.to_string().contains("gpt-x"));
    }

    #[test]
    fn from_status_rate_limited() {
        let err = ProviderError::from_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "slow down".into(),
            "m",
        );
        assert!(matches!(err, ProviderError::RateLimited(_)));
    }

    #[test]
    fn from_status_server_error() {
        let err = ProviderError::from_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "boom".into(),
            "m",
        );
        assert!(err.to_string().starts_with("request failed: HTTP 500"));
    }

    #[test]
    fn json_error_from_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ProviderError = serde_err.into();
        assert!(err.to_string().starts_with("json error:"));
    }
}
