//! Error types for the token acquisition flow.

use std::time::Duration;

use thiserror::Error;

/// Errors that can end (or interrupt) a token acquisition run.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The browser could not be started
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// A browser driver call failed
    #[error("Browser error: {0}")]
    Browser(String),

    /// A bounded wait ran out
    #[error("Timed out after {}s waiting for {what}", .timeout.as_secs())]
    Timeout { what: String, timeout: Duration },

    /// Mailbox connection, login or fetch failed
    #[error("Mail error: {0}")]
    Mail(String),

    /// The verification email arrived but carried no code
    #[error("No verification code found in mail")]
    MissingVerificationCode,

    /// Client storage held no token once the flow finished
    #[error("No API token in local storage (page: {url})")]
    TokenMissing { url: String },

    /// A token was in storage but the landing page never confirmed the session
    #[error("Landing page never appeared; refusing unconfirmed token (page: {url})")]
    LandingUnconfirmed { url: String },

    /// Cookie cache or snapshot I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cookie cache contents could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A step panicked
    #[error("Login step panicked: {0}")]
    Panicked(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = AuthError::Timeout {
            what: "network idle".to_string(),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "Timed out after 60s waiting for network idle");
    }

    #[test]
    fn test_token_missing_display() {
        let err = AuthError::TokenMissing {
            url: "https://app.zenhub.com/login".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No API token in local storage (page: https://app.zenhub.com/login)"
        );
    }
}
