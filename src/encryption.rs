//! PIN encryption for disbursements.
//!
//! Airtel requires the disbursement PIN to be encrypted with the merchant's
//! RSA public key (PKCS#1 v1.5 padding) and sent as base64. The key is
//! distributed as bare base64 DER; PEM is accepted too.

use crate::errors::{AirtelError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use std::fmt;

/// Base64 ciphertext of a PIN, ready for the `pin` field of a disbursement.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedPin(String);

impl EncryptedPin {
    /// The base64 ciphertext.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the base64 ciphertext.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for EncryptedPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptedPin(<redacted>)")
    }
}

/// Encrypts PINs against a parsed provider public key.
///
/// # Examples
///
/// ```no_run
/// use airtel_money_rs::encryption::PinEncryptor;
///
/// # fn example() -> airtel_money_rs::Result<()> {
/// let key = std::env::var("AIRTEL_PUBLIC_KEY").unwrap_or_default();
/// let encryptor = PinEncryptor::new(&key)?;
/// let pin = encryptor.encrypt_pin("1234")?;
/// println!("{}", pin.as_str());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PinEncryptor {
    key: RsaPublicKey,
}

impl PinEncryptor {
    /// Parses the provider public key.
    pub fn new(public_key: &str) -> Result<Self> {
        Ok(Self {
            key: parse_public_key(public_key)?,
        })
    }

    /// Encrypts a PIN. Padding is randomized, so repeated calls yield different ciphertexts.
    pub fn encrypt_pin(&self, pin: &str) -> Result<EncryptedPin> {
        if pin.is_empty() || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(AirtelError::Encryption("invalid PIN".to_string()));
        }

        let mut rng = rand::thread_rng();
        let ciphertext = self.key.encrypt(&mut rng, Pkcs1v15Encrypt, pin.as_bytes())?;
        Ok(EncryptedPin(BASE64.encode(ciphertext)))
    }

    /// Parses `public_key` and encrypts `pin` in one step.
    pub fn encrypt(pin: &str, public_key: &str) -> Result<EncryptedPin> {
        Self::new(public_key)?.encrypt_pin(pin)
    }
}

/// Parses an RSA public key given as PEM (SPKI or PKCS#1) or as bare base64 DER.
fn parse_public_key(public_key: &str) -> Result<RsaPublicKey> {
    let trimmed = public_key.trim();
    if trimmed.is_empty() {
        return Err(AirtelError::Key("public key is empty".to_string()));
    }

    if trimmed.starts_with("-----BEGIN") {
        return RsaPublicKey::from_public_key_pem(trimmed)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(trimmed))
            .map_err(|e| AirtelError::Key(format!("malformed PEM: {}", e)));
    }

    let compact: String = trimmed.split_whitespace().collect();
    let der = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| AirtelError::Key(format!("not base64: {}", e)))?;

    RsaPublicKey::from_public_key_der(&der)
        .or_else(|_| RsaPublicKey::from_pkcs1_der(&der))
        .map_err(|e| AirtelError::Key(format!("malformed DER: {}", e)))
}
