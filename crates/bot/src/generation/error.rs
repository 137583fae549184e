//! Error types for the content generation client.

use thiserror::Error;

/// Errors that can occur when requesting generated text.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No API key configured.
    #[error("AI not configured. Ask admin to set HF_API_KEY.")]
    NotConfigured,

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The inference API returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The API key was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl GenerationError {
    /// Text shown to the user in place of generated content.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured => self.to_string(),
            other => format!("AI error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        assert_eq!(
            GenerationError::NotConfigured.user_message(),
            "AI not configured. Ask admin to set HF_API_KEY."
        );
        assert_eq!(
            GenerationError::Timeout.user_message(),
            "AI error: request timed out"
        );
        assert_eq!(
            GenerationError::Api {
                status: 503,
                message: "Model is loading".to_string()
            }
            .user_message(),
            "AI error: API error (503): Model is loading"
        );
    }
}
