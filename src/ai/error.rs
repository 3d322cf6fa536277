//! Errors from the generation service.

use thiserror::Error;

/// Generation service errors.
#[derive(Error, Debug)]
pub enum AiError {
    /// No API key in the preference file or the environment.
    #[error(
        "Gemini API key not found. Run `qkpr config` or set QUICK_PR_GEMINI_API_KEY or GEMINI_API_KEY"
    )]
    ApiKeyNotFound,

    /// There is no diff to describe.
    #[error("No staged diff to generate from")]
    EmptyDiff,

    /// The service answered with a non-success status.
    #[error("Gemini API request failed: {0}")]
    ApiRequestFailed(String),

    /// The reply could not be understood.
    #[error("Invalid response format from Gemini API: {0}")]
    InvalidResponseFormat(String),

    /// The configured endpoint is not a usable base URL.
    #[error("Invalid Gemini endpoint: {0}")]
    InvalidEndpoint(String),

    /// Network connectivity error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The request did not complete in time.
    #[error("Request to Gemini API timed out")]
    Timeout,
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(e.to_string())
        }
    }
}
