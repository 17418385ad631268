//! Core type definitions for the Airtel Money API.
//!
//! This module contains the request builders callers hand to
//! [`AirtelClient`](crate::client::AirtelClient), the JSON bodies sent on the
//! wire, the response envelope every transaction endpoint returns, and the
//! inbound IPN payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Grant type used for the token exchange.
pub const GRANT_TYPE: &str = "client_credentials";

/// Which family of endpoints a transaction id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionKind {
    /// Collection initiated with a USSD prompt
    #[default]
    Payment,
    /// Merchant-to-subscriber transfer
    Disbursement,
}

impl TransactionKind {
    /// Path of the status endpoint; the transaction id is appended as a path segment.
    pub fn status_path(&self) -> &'static str {
        match self {
            TransactionKind::Payment => "standard/v1/payments/",
            TransactionKind::Disbursement => "standard/v1/disbursements/",
        }
    }

    /// Path of the refund endpoint.
    pub fn refund_path(&self) -> &'static str {
        match self {
            TransactionKind::Payment => "standard/v1/payments/refund",
            TransactionKind::Disbursement => "standard/v1/disbursements/refund",
        }
    }
}

/// Parameters of a USSD push payment.
///
/// # Examples
///
/// ```
/// use airtel_money_rs::types::PaymentRequest;
///
/// let request = PaymentRequest::new("+254712345678", 100.0)
///     .with_reference("ORDER42")
///     .with_currency("KES");
///
/// assert_eq!(request.reference.as_deref(), Some("ORDER42"));
/// assert!(request.country.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Subscriber phone number, in any format ending with the subscriber number
    pub phone: String,

    /// Amount to collect; must be positive
    pub amount: f64,

    /// Merchant reference; a random one is generated when absent
    pub reference: Option<String>,

    /// Overrides the configured country
    pub country: Option<String>,

    /// Overrides the configured currency
    pub currency: Option<String>,
}

impl PaymentRequest {
    /// Creates a payment request using the client's default country and currency.
    pub fn new(phone: impl Into<String>, amount: f64) -> Self {
        Self {
            phone: phone.into(),
            amount,
            reference: None,
            country: None,
            currency: None,
        }
    }

    /// Sets the merchant reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the country code.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Sets the currency code.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// Parameters of a disbursement to a subscriber.
///
/// The PIN is plaintext here and is encrypted before it leaves the client.
#[derive(Clone, PartialEq)]
pub struct DisbursementRequest {
    /// Payee phone number
    pub phone: String,

    /// Amount to send; must be positive
    pub amount: f64,

    /// Merchant reference; a random one is generated when absent
    pub reference: Option<String>,

    /// Plaintext PIN; falls back to the configured PIN when absent
    pub pin: Option<String>,
}

impl DisbursementRequest {
    /// Creates a disbursement request that uses the configured PIN.
    pub fn new(phone: impl Into<String>, amount: f64) -> Self {
        Self {
            phone: phone.into(),
            amount,
            reference: None,
            pin: None,
        }
    }

    /// Sets the merchant reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the PIN for this disbursement.
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }
}

impl std::fmt::Debug for DisbursementRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisbursementRequest")
            .field("phone", &self.phone)
            .field("amount", &self.amount)
            .field("reference", &self.reference)
            .field("pin", &self.pin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Body of the `auth/oauth2/token` request.
#[derive(Serialize, Clone)]
pub struct TokenRequest<'a> {
    /// OAuth2 client identifier
    pub client_id: &'a str,

    /// OAuth2 client secret
    pub client_secret: &'a str,

    /// Always `client_credentials`
    pub grant_type: &'static str,
}

/// Response of the token exchange.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    /// Bearer token
    #[serde(default)]
    pub access_token: String,

    /// Lifetime in seconds, as reported by the provider
    #[serde(default, deserialize_with = "lenient_u64")]
    pub expires_in: Option<u64>,

    /// Usually "bearer"
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Subscriber block of a payment body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subscriber {
    /// Country code
    pub country: String,

    /// Currency code
    pub currency: String,

    /// Subscriber number without country prefix
    pub msisdn: String,
}

/// Transaction block of a payment body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaymentTransaction {
    /// Amount to collect
    pub amount: f64,

    /// Country code
    pub country: String,

    /// Currency code
    pub currency: String,

    /// Merchant-side transaction id
    pub id: String,
}

/// Body of `merchant/v1/payments/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaymentBody {
    /// Merchant reference
    pub reference: String,

    /// Paying subscriber
    pub subscriber: Subscriber,

    /// Amount and id
    pub transaction: PaymentTransaction,
}

/// Payee block of a disbursement body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Payee {
    /// Subscriber number without country prefix
    pub msisdn: String,
}

/// Transaction block of a disbursement body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisbursementTransaction {
    /// Amount to send
    pub amount: f64,

    /// Merchant-side transaction id
    pub id: String,
}

/// Body of `standard/v1/disbursements/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisbursementBody {
    /// Receiving subscriber
    pub payee: Payee,

    /// Merchant reference
    pub reference: String,

    /// Encrypted PIN, base64
    pub pin: String,

    /// Amount and id
    pub transaction: DisbursementTransaction,
}

/// Transaction block of a refund body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RefundTransaction {
    /// Airtel-side transaction id to reverse
    pub airtel_money_id: String,
}

/// Body of the refund endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RefundBody {
    /// Transaction to reverse
    pub transaction: RefundTransaction,
}

/// Status object embedded in every transaction response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResponseStatus {
    /// Provider status code; sent as a string or a number depending on the endpoint
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: String,

    /// Human readable message
    #[serde(default)]
    pub message: String,

    /// Whether the provider accepted the request
    pub success: bool,

    /// Provider result code (e.g., "ESB000010")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,

    /// Provider response code (e.g., "DP00800001006")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
}

/// Transaction sub-object of a response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Transaction {
    /// Transaction id
    #[serde(default)]
    pub id: String,

    /// Provider state code (TS, TF, TA, TIP, TE) or free-form status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Airtel Money reference of the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airtel_money_id: Option<String>,

    /// Message attached to the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Reference id echoed back on disbursements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

/// `data` wrapper around the transaction sub-object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TransactionData {
    /// Transaction details, if the provider returned any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
}

/// Response envelope of the payment, disbursement, status and refund endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionResponse {
    /// Provider status object
    pub status: ResponseStatus,

    /// Response data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TransactionData>,
}

impl TransactionResponse {
    /// The transaction sub-object, if present.
    pub fn transaction(&self) -> Option<&Transaction> {
        self.data.as_ref().and_then(|d| d.transaction.as_ref())
    }

    /// Typed view of the transaction status.
    pub fn state(&self) -> Option<TransactionState> {
        self.transaction()
            .and_then(|t| t.status.as_deref())
            .map(TransactionState::from_code)
    }
}

/// Transaction state as reported by Airtel status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    /// TS
    Success,
    /// TF
    Failed,
    /// TA; needs a follow-up status query
    Ambiguous,
    /// TIP
    InProgress,
    /// TE
    Expired,
    /// Anything the provider may add later
    Unknown(String),
}

impl TransactionState {
    /// Maps a provider status code.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "TS" | "SUCCESS" => TransactionState::Success,
            "TF" | "FAILED" => TransactionState::Failed,
            "TA" | "AMBIGUOUS" => TransactionState::Ambiguous,
            "TIP" | "IN PROGRESS" | "PENDING" => TransactionState::InProgress,
            "TE" | "EXPIRED" => TransactionState::Expired,
            _ => TransactionState::Unknown(code.to_string()),
        }
    }

    /// Returns `true` once the transaction will not change state anymore.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            TransactionState::Success | TransactionState::Failed | TransactionState::Expired
        )
    }
}

/// Transaction sub-object of an IPN callback.
///
/// Callbacks name some fields two ways (`id`/`transaction_id`,
/// `reference`/`transaction_reference`, `status`/`status_code`); either or
/// both spellings are accepted, and the short one wins when both are non-empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(from = "RawIpnTransaction")]
pub struct IpnTransaction {
    /// Transaction id
    pub id: String,

    /// Merchant reference
    pub reference: String,

    /// Final status code
    pub status: String,

    /// Amount, kept as the provider formatted it
    pub amount: String,

    /// Currency code
    pub currency: String,

    /// Payment channel
    pub channel: String,

    /// Free text narrative
    pub narrative: String,

    /// Subscriber number
    pub msisdn: String,

    /// Airtel Money reference
    pub airtel_money_id: String,

    /// Provider message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawIpnTransaction {
    id: String,
    transaction_id: String,
    reference: String,
    transaction_reference: String,
    status: String,
    status_code: String,
    #[serde(deserialize_with = "string_or_number")]
    amount: String,
    currency: String,
    channel: String,
    narrative: String,
    msisdn: String,
    airtel_money_id: String,
    message: Option<String>,
}

impl From<RawIpnTransaction> for IpnTransaction {
    fn from(raw: RawIpnTransaction) -> Self {
        fn either(short: String, long: String) -> String {
            if short.is_empty() {
                long
            } else {
                short
            }
        }

        Self {
            id: either(raw.id, raw.transaction_id),
            reference: either(raw.reference, raw.transaction_reference),
            status: either(raw.status, raw.status_code),
            amount: raw.amount,
            currency: raw.currency,
            channel: raw.channel,
            narrative: raw.narrative,
            msisdn: raw.msisdn,
            airtel_money_id: raw.airtel_money_id,
            message: raw.message,
        }
    }
}

impl IpnTransaction {
    /// Typed view of the notified status.
    pub fn state(&self) -> TransactionState {
        TransactionState::from_code(&self.status)
    }
}

/// Instant Payment Notification, already parsed by the caller.
///
/// # Examples
///
/// ```
/// use airtel_money_rs::types::IpnPayload;
///
/// let payload: IpnPayload = serde_json::from_str(
///     r#"{"transaction": {"id": "BBZMiscxy", "message": "Paid KES 100", "status_code": "TS", "airtel_money_id": "MP210603.1234.L06941"}}"#,
/// ).unwrap();
///
/// assert_eq!(payload.transaction.unwrap().status, "TS");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct IpnPayload {
    /// Transaction details; absent on malformed callbacks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<IpnTransaction>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_u64()),
        Value::String(s) => Ok(s.trim().parse().ok()),
        _ => Ok(None),
    }
}
