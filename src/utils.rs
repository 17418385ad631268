//! Utility functions shared by the client operations.
//!
//! Phone normalization, reference generation and amount validation.

use crate::errors::{AirtelError, Result};
use rand::Rng;

/// Number of digits in an Airtel subscriber number (MSISDN without country prefix).
pub const SUBSCRIBER_NUMBER_LEN: usize = 9;

/// Length of generated merchant references.
pub const REFERENCE_LEN: usize = 6;

/// Reduces a phone number to the subscriber number the provider expects.
///
/// Non-digit characters are ignored and the last nine digits are kept, so
/// international, national and bare formats all resolve to the same value.
///
/// # Examples
///
/// ```
/// use airtel_money_rs::utils::normalize_msisdn;
///
/// assert_eq!(normalize_msisdn("+254712345678").unwrap(), "712345678");
/// assert_eq!(normalize_msisdn("0712 345 678").unwrap(), "712345678");
/// assert!(normalize_msisdn("12345").is_err());
/// ```
pub fn normalize_msisdn(phone: &str) -> Result<String> {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < SUBSCRIBER_NUMBER_LEN {
        return Err(AirtelError::InvalidPhone(format!(
            "'{}' has fewer than {} digits",
            phone, SUBSCRIBER_NUMBER_LEN
        )));
    }

    Ok(digits[digits.len() - SUBSCRIBER_NUMBER_LEN..].iter().collect())
}

/// Generates a random 6-character uppercase hexadecimal reference.
///
/// # Examples
///
/// ```
/// use airtel_money_rs::utils::generate_reference;
///
/// let reference = generate_reference();
/// assert_eq!(reference.len(), 6);
/// assert!(reference.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
/// ```
pub fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    let value: u32 = rng.gen_range(0..=0x00FF_FFFF);
    format!("{:06X}", value)
}

/// Returns the caller's reference, or a fresh one when absent or blank.
pub fn reference_or_generate(reference: Option<&str>) -> String {
    match reference.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => generate_reference(),
    }
}

/// Checks that an amount is a positive, finite number.
pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AirtelError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_msisdn() {
        assert_eq!(normalize_msisdn("+254712345678").unwrap(), "712345678");
        assert_eq!(normalize_msisdn("254712345678").unwrap(), "712345678");
        assert_eq!(normalize_msisdn("0712345678").unwrap(), "712345678");
        assert_eq!(normalize_msisdn("712345678").unwrap(), "712345678");
        assert_eq!(normalize_msisdn("+256-700-123-456").unwrap(), "700123456");
    }

    #[test]
    fn test_normalize_msisdn_too_short() {
        let err = normalize_msisdn("+2547").unwrap_err();
        assert!(matches!(err, AirtelError::InvalidPhone(_)));
        assert!(normalize_msisdn("").is_err());
    }

    #[test]
    fn test_generate_reference() {
        for _ in 0..100 {
            let reference = generate_reference();
            assert_eq!(reference.len(), REFERENCE_LEN);
            assert!(reference
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
    }

    #[test]
    fn test_generated_references_differ() {
        let references: std::collections::HashSet<String> =
            (0..20).map(|_| generate_reference()).collect();
        // 20 draws out of 16M values; a collision here means the RNG is broken.
        assert!(references.len() >= 19);
    }

    #[test]
    fn test_reference_or_generate() {
        assert_eq!(reference_or_generate(Some("INV-9")), "INV-9");
        assert_eq!(reference_or_generate(Some("   ")).len(), REFERENCE_LEN);
        assert_eq!(reference_or_generate(None).len(), REFERENCE_LEN);
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(10.5).unwrap(), 10.5);
        assert!(matches!(validate_amount(0.0), Err(AirtelError::InvalidAmount(_))));
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }
}
