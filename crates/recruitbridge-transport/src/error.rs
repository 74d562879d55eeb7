//! Error types for delivery operations.

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Delivery error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the caller's credentials. The linked
    /// account must be re-connected before further sends.
    #[error("Authorization expired: reconnect the linked account")]
    AuthExpired,

    /// The endpoint answered with a non-success status.
    #[error("Endpoint returned HTTP {status}: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, or the canonical status reason when empty.
        reason: String,
    },

    /// The endpoint answered 2xx but reported failure in the payload.
    #[error("Send rejected: {0}")]
    Rejected(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl Error {
    /// Whether this error means credentials must be refreshed rather
    /// than the send retried.
    #[must_use]
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn auth_expired_message_points_at_reconnect() {
        let error = Error::AuthExpired;
        assert!(error.to_string().contains("reconnect"));
        assert!(error.is_auth_expired());
    }

    #[test]
    fn status_error_carries_code_and_reason() {
        let error = Error::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert!(error.to_string().contains("503"));
        assert!(!error.is_auth_expired());
    }
}
