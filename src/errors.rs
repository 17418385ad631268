//! Error types for the airtel-money-rs library.
//!
//! Every failure surfaces to the caller as a distinct variant of [`AirtelError`].
//! Transport problems, authorization problems and provider-reported business
//! failures are kept apart so callers can react to each differently.

use thiserror::Error;

/// Main error type for Airtel Money operations.
#[derive(Error, Debug)]
pub enum AirtelError {
    /// Network-level failure (connection, timeout, TLS, body read)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status or a body that is not the expected JSON
    #[error("Unexpected response (HTTP {status}): {body}")]
    UnexpectedResponse {
        /// HTTP status code returned by the provider
        status: u16,
        /// Raw response body, as received
        body: String,
    },

    /// Token exchange failed, or a token was required but none is held
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// The provider reported `status.success == false`
    #[error("Payment failed ({code}): {message}")]
    Payment {
        /// Provider status code
        code: String,
        /// Provider status message, verbatim
        message: String,
    },

    /// Malformed or incomplete IPN payload
    #[error("Reconcile failed: {0}")]
    Reconcile(String),

    /// Provider public key is missing or malformed
    #[error("Invalid public key: {0}")]
    Key(String),

    /// The PIN could not be encrypted
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error building an endpoint URL
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Phone number cannot be resolved to a subscriber number
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AirtelError {
    /// Returns `true` for failures of the transport layer rather than the provider's business logic.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AirtelError::Transport(_) | AirtelError::UnexpectedResponse { .. }
        )
    }

    /// Returns the provider message carried by a [`AirtelError::Payment`], if any.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            AirtelError::Payment { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Result type alias for Airtel Money operations.
pub type Result<T> = std::result::Result<T, AirtelError>;

impl From<rsa::Error> for AirtelError {
    fn from(err: rsa::Error) -> Self {
        AirtelError::Encryption(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AirtelError::Payment {
            code: "DP00800001001".to_string(),
            message: "Insufficient funds".to_string(),
        };
        assert_eq!(err.to_string(), "Payment failed (DP00800001001): Insufficient funds");
        assert_eq!(err.provider_message(), Some("Insufficient funds"));
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: AirtelError = json_err.into();
        assert!(matches!(err, AirtelError::Json(_)));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_classification() {
        let err = AirtelError::UnexpectedResponse {
            status: 502,
            body: "<html>bad gateway</html>".to_string(),
        };
        assert!(err.is_transport());
        assert!(!AirtelError::Auth("not authorized".to_string()).is_transport());
        assert_eq!(err.provider_message(), None);
    }
}
