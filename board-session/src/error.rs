//! Error types for backend and session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by the backend through the session proxy.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// No valid session: missing, expired or revoked token.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The backend answered with a non-success status.
    #[error("Backend error: {status} - {message}")]
    Response {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation timeout
    #[error("Backend request timed out")]
    Timeout,

    /// The backend answered with a body that could not be decoded.
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// The status code a page should answer with when this error reaches it.
    /// Backend statuses outside 4xx and 5xx become 502.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::Response { status, .. } if (400..600).contains(status) => *status,
            Self::Response { .. } => 502,
            Self::Connection(_) => 502,
            Self::Timeout => 504,
            Self::InvalidResponse(_) | Self::InvalidUrl(_) | Self::Config(_) => 500,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

impl From<url::ParseError> for SessionError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(SessionError::Unauthenticated("x".into()).status_code(), 401);
        assert_eq!(
            SessionError::Response {
                status: 403,
                message: "forbidden".into()
            }
            .status_code(),
            403
        );
        assert_eq!(SessionError::Connection("refused".into()).status_code(), 502);
        for status in [101, 302, 304] {
            let err = SessionError::Response {
                status,
                message: String::new(),
            };
            assert_eq!(err.status_code(), 502);
        }
        assert_eq!(SessionError::Timeout.status_code(), 504);
        assert_eq!(SessionError::InvalidResponse("x".into()).status_code(), 500);
    }

    #[test]
    fn test_is_unauthenticated() {
        assert!(SessionError::Unauthenticated("x".into()).is_unauthenticated());
        assert!(!SessionError::Timeout.is_unauthenticated());
    }
}
