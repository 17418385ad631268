//! # airtel-money-rs
//!
//! An async Rust client for the Airtel Money mobile-money API (Airtel Africa Open API).
//!
//! The client authenticates with OAuth2 client credentials, sends USSD push
//! payment prompts, disburses funds, queries transaction status, issues
//! refunds, and validates Instant Payment Notification (IPN) payloads.
//!
//! ## Features
//!
//! - **Collections**: USSD push prompts with automatic reference generation
//! - **Disbursements**: merchant-to-subscriber transfers with RSA-encrypted PINs
//! - **Status & refunds**: for both payments and disbursements
//! - **IPN reconciliation**: validation gate for already-parsed callbacks
//! - **Typed errors**: transport, authorization and provider failures are distinct
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use airtel_money_rs::{create, Environment, PaymentRequest, TransactionKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create(
//!     "client-id",
//!     "client-secret",
//!     "KE",
//!     "KES",
//!     Environment::Sandbox,
//!     None,
//!     None,
//! )?;
//! client.authorize().await?;
//!
//! let prompt = client
//!     .prompt(PaymentRequest::new("+254712345678", 100.0))
//!     .await?;
//! let id = &prompt.transaction().unwrap().id;
//!
//! let status = client.status(id, TransactionKind::Payment).await?;
//! println!("state: {:?}", status.state());
//! # Ok(())
//! # }
//! ```
//!
//! ## Tokens
//!
//! The token returned by [`AirtelClient::authorize`] expires after a
//! provider-defined period. The client does not track expiry; call
//! `authorize` again when a request fails with an authorization error.
//!
//! ## Retries
//!
//! Every operation is at-most-once. Nothing is retried internally.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod encryption;
pub mod errors;
pub mod ipn;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use client::AirtelClient;
pub use config::{AirtelConfig, Environment};
pub use encryption::{EncryptedPin, PinEncryptor};
pub use errors::{AirtelError, Result};
pub use types::{
    DisbursementRequest, IpnPayload, IpnTransaction, PaymentRequest, ResponseStatus,
    Transaction, TransactionKind, TransactionResponse, TransactionState,
};

/// Builds a client from positional credentials and market defaults.
///
/// Equivalent to [`AirtelConfig::new`] with the country, currency and
/// environment set, plus the disbursement PIN and public key when given,
/// followed by [`AirtelClient::new`].
pub fn create(
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
    country: impl Into<String>,
    currency: impl Into<String>,
    environment: Environment,
    pin: Option<String>,
    public_key: Option<String>,
) -> Result<AirtelClient> {
    let mut config = AirtelConfig::new(client_id, client_secret)
        .with_country(country)
        .with_currency(currency)
        .with_environment(environment);
    if let Some(pin) = pin {
        config = config.with_pin(pin);
    }
    if let Some(public_key) = public_key {
        config = config.with_public_key(public_key);
    }
    AirtelClient::new(config)
}
