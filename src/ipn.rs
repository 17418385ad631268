//! Validation of inbound Instant Payment Notifications.
//!
//! The payload is parsed by the caller (usually from the body of its own
//! callback endpoint); this module only decides whether it describes a
//! transaction and hands it to an optional handler.

use crate::errors::{AirtelError, Result};
use crate::types::IpnPayload;
use tracing::{debug, warn};

/// Message of the error returned when the payload has no transaction object.
pub const NO_TRANSACTION_DATA: &str = "no transaction data";

/// Fallback message when the transaction id is empty and the payload carries no message.
pub const MISSING_TRANSACTION_ID: &str = "missing transaction id";

/// Validates an IPN payload and returns it unchanged.
///
/// # Examples
///
/// ```
/// use airtel_money_rs::ipn::reconcile;
/// use airtel_money_rs::types::{IpnPayload, IpnTransaction};
///
/// let payload = IpnPayload {
///     transaction: Some(IpnTransaction {
///         id: "TX42".to_string(),
///         status: "TS".to_string(),
///         ..Default::default()
///     }),
/// };
///
/// assert_eq!(reconcile(payload.clone()).unwrap(), payload);
/// assert!(reconcile(IpnPayload::default()).is_err());
/// ```
pub fn reconcile(payload: IpnPayload) -> Result<IpnPayload> {
    reconcile_with(payload, |_| {})
}

/// Validates an IPN payload, runs `handler` on it, and returns it unchanged.
///
/// The handler only runs for valid payloads.
pub fn reconcile_with<F>(payload: IpnPayload, handler: F) -> Result<IpnPayload>
where
    F: FnOnce(&IpnPayload),
{
    let transaction = match payload.transaction.as_ref() {
        Some(transaction) => transaction,
        None => {
            warn!("IPN payload without transaction data");
            return Err(AirtelError::Reconcile(NO_TRANSACTION_DATA.to_string()));
        }
    };

    if transaction.id.trim().is_empty() {
        let message = transaction
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| MISSING_TRANSACTION_ID.to_string());
        warn!(reason = %message, "IPN payload without transaction id");
        return Err(AirtelError::Reconcile(message));
    }

    debug!(
        transaction_id = %transaction.id,
        status = %transaction.status,
        "IPN payload accepted"
    );

    handler(&payload);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IpnTransaction;
    use serde_json::json;
    use std::cell::Cell;

    fn valid_payload() -> IpnPayload {
        serde_json::from_value(json!({
            "transaction": {
                "id": "BBZMiscxy",
                "message": "Paid KES 5,000 to TECHNOLOGIES LIMITED",
                "status_code": "TS",
                "airtel_money_id": "MP210603.1234.L06941"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_transaction() {
        let err = reconcile(IpnPayload { transaction: None }).unwrap_err();
        assert!(matches!(&err, AirtelError::Reconcile(m) if m == NO_TRANSACTION_DATA));

        let parsed: IpnPayload = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(reconcile(parsed), Err(AirtelError::Reconcile(m)) if m == "no transaction data"));
    }

    #[test]
    fn test_empty_id_uses_payload_message() {
        let payload = IpnPayload {
            transaction: Some(IpnTransaction {
                id: String::new(),
                message: Some("X".to_string()),
                ..Default::default()
            }),
        };
        let err = reconcile(payload).unwrap_err();
        assert!(matches!(err, AirtelError::Reconcile(m) if m == "X"));
    }

    #[test]
    fn test_empty_id_without_message() {
        let payload = IpnPayload {
            transaction: Some(IpnTransaction::default()),
        };
        let err = reconcile(payload).unwrap_err();
        assert!(matches!(err, AirtelError::Reconcile(m) if m == MISSING_TRANSACTION_ID));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let payload = valid_payload();
        let first = reconcile(payload.clone()).unwrap();
        let second = reconcile(payload.clone()).unwrap();
        assert_eq!(first, payload);
        assert_eq!(first, second);
    }

    #[test]
    fn test_handler_runs_once_for_valid_payload() {
        let calls = Cell::new(0);
        let result = reconcile_with(valid_payload(), |p| {
            assert_eq!(p.transaction.as_ref().unwrap().id, "BBZMiscxy");
            calls.set(calls.get() + 1);
        })
        .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(result, valid_payload());
    }

    #[test]
    fn test_handler_skipped_for_invalid_payload() {
        let calls = Cell::new(0);
        let result = reconcile_with(IpnPayload::default(), |_| calls.set(calls.get() + 1));
        assert!(result.is_err());
        assert_eq!(calls.get(), 0);
    }
}
