//! Client for the Airtel Money REST API.
//!
//! [`AirtelClient`] holds the credentials and the current bearer token, and
//! exposes one async method per provider operation. Each method performs at
//! most one HTTP request, checks the `status` object embedded in the
//! response, and returns either the parsed response or a typed error.

use crate::config::AirtelConfig;
use crate::encryption::PinEncryptor;
use crate::errors::{AirtelError, Result};
use crate::ipn;
use crate::types::{
    DisbursementBody, DisbursementRequest, DisbursementTransaction, IpnPayload, Payee,
    PaymentBody, PaymentRequest, PaymentTransaction, RefundBody, RefundTransaction, Subscriber,
    TokenRequest, TokenResponse, TransactionKind, TransactionResponse, GRANT_TYPE,
};
use crate::utils::{normalize_msisdn, reference_or_generate, validate_amount};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Token exchange endpoint.
pub const TOKEN_PATH: &str = "auth/oauth2/token";
/// Subscriber lookup endpoint; the subscriber number is appended.
pub const USERS_PATH: &str = "standard/v1/users/";
/// USSD push payment endpoint.
pub const PAYMENTS_PATH: &str = "merchant/v1/payments/";
/// Disbursement endpoint.
pub const DISBURSEMENTS_PATH: &str = "standard/v1/disbursements/";

/// Header carrying the country code.
pub const COUNTRY_HEADER: &str = "X-Country";
/// Header carrying the currency code.
pub const CURRENCY_HEADER: &str = "X-Currency";

/// Async client for the Airtel Money API.
///
/// The client is `Send + Sync`; share it with `Arc` to issue calls
/// concurrently. The bearer token is replaced as a whole under a write lock,
/// so concurrent readers see either the previous or the new token.
pub struct AirtelClient {
    config: AirtelConfig,
    http: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl AirtelClient {
    /// Creates a client, building an HTTP client with the configured timeout.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use airtel_money_rs::client::AirtelClient;
    /// use airtel_money_rs::config::{AirtelConfig, Environment};
    /// use airtel_money_rs::types::PaymentRequest;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = AirtelConfig::new("client-id", "client-secret")
    ///     .with_environment(Environment::Sandbox);
    /// let client = AirtelClient::new(config)?;
    ///
    /// let response = client
    ///     .authorize()
    ///     .await?
    ///     .prompt(PaymentRequest::new("+254712345678", 100.0))
    ///     .await?;
    ///
    /// println!("status: {}", response.status.message);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: AirtelConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Self::with_client(config, http)
    }

    /// Creates a client on top of a caller-provided HTTP client.
    pub fn with_client(config: AirtelConfig, http: Client) -> Result<Self> {
        let mut base = config.resolved_base_url().trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        if base_url.cannot_be_a_base() {
            return Err(AirtelError::Config(format!("'{}' cannot be a base URL", base)));
        }

        let token = config.token.clone().filter(|t| !t.is_empty());

        Ok(Self {
            config,
            http,
            base_url,
            token: RwLock::new(token),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &AirtelConfig {
        &self.config
    }

    /// The host all requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// A copy of the current bearer token.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Returns `true` once a token is held.
    pub async fn is_authorized(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Replaces the bearer token, e.g. with one obtained by another client instance.
    ///
    /// An empty token clears the one held.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into()).filter(|t| !t.is_empty());
    }

    /// Exchanges the client credentials for a bearer token.
    ///
    /// On failure the previously held token, if any, is kept.
    pub async fn authorize(&self) -> Result<&Self> {
        let url = self.endpoint(TOKEN_PATH)?;
        let body = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            grant_type: GRANT_TYPE,
        };

        debug!(environment = %self.config.environment, "requesting access token");

        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "*/*")
            .json(&body);
        let (status, text) = self.send(request, TOKEN_PATH).await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "token exchange rejected");
            return Err(AirtelError::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|_| AirtelError::UnexpectedResponse {
                status: status.as_u16(),
                body: text.clone(),
            })?;

        if token.access_token.is_empty() {
            return Err(AirtelError::Auth(
                "token endpoint returned no access_token".to_string(),
            ));
        }

        *self.token.write().await = Some(token.access_token);
        info!(expires_in = ?token.expires_in, "authorized with Airtel Money");

        Ok(self)
    }

    /// Sends a USSD push prompt asking the subscriber to approve a payment.
    ///
    /// Completion is asynchronous; follow up with [`status`](Self::status)
    /// or an IPN handled by [`reconcile`](Self::reconcile).
    pub async fn prompt(&self, request: PaymentRequest) -> Result<TransactionResponse> {
        let amount = validate_amount(request.amount)?;
        let msisdn = normalize_msisdn(&request.phone)?;
        let reference = reference_or_generate(request.reference.as_deref());
        let country = request
            .country
            .unwrap_or_else(|| self.config.country.clone());
        let currency = request
            .currency
            .unwrap_or_else(|| self.config.currency.clone());

        let body = PaymentBody {
            reference: reference.clone(),
            subscriber: Subscriber {
                country: country.clone(),
                currency: currency.clone(),
                msisdn,
            },
            transaction: PaymentTransaction {
                amount,
                country: country.clone(),
                currency: currency.clone(),
                id: reference.clone(),
            },
        };

        info!(%reference, amount, %country, %currency, "initiating payment prompt");

        let request = self
            .authorized(Method::POST, self.endpoint(PAYMENTS_PATH)?, &country, &currency)
            .await?
            .json(&body);
        let response = self.transaction(request, PAYMENTS_PATH).await?;

        info!(%reference, state = ?response.state(), "payment prompt accepted");
        Ok(response)
    }

    /// Fetches the current state of a payment or disbursement.
    pub async fn status(
        &self,
        transaction_id: &str,
        kind: TransactionKind,
    ) -> Result<TransactionResponse> {
        let transaction_id = required("transaction_id", transaction_id)?;
        let path = kind.status_path();
        let url = self.endpoint_with_segment(path, transaction_id)?;

        debug!(%transaction_id, ?kind, "querying transaction status");

        let request = self.default_authorized(Method::GET, url).await?;
        let response = self.transaction(request, path).await?;

        debug!(%transaction_id, state = ?response.state(), "transaction status received");
        Ok(response)
    }

    /// Requests reversal of a payment or disbursement.
    pub async fn refund(
        &self,
        transaction_id: &str,
        kind: TransactionKind,
    ) -> Result<TransactionResponse> {
        let transaction_id = required("transaction_id", transaction_id)?;
        let path = kind.refund_path();
        let body = RefundBody {
            transaction: RefundTransaction {
                airtel_money_id: transaction_id.to_string(),
            },
        };

        info!(%transaction_id, ?kind, "requesting refund");

        let request = self
            .default_authorized(Method::POST, self.endpoint(path)?)
            .await?
            .json(&body);
        let response = self.transaction(request, path).await?;

        info!(%transaction_id, state = ?response.state(), "refund accepted");
        Ok(response)
    }

    /// Sends funds to a subscriber.
    ///
    /// The PIN (from the request, or the configured default) is encrypted with
    /// the configured public key before it is put on the wire.
    pub async fn disburse(&self, request: DisbursementRequest) -> Result<TransactionResponse> {
        let amount = validate_amount(request.amount)?;
        let msisdn = normalize_msisdn(&request.phone)?;
        let reference = reference_or_generate(request.reference.as_deref());

        let pin = request
            .pin
            .as_deref()
            .or(self.config.pin.as_deref())
            .ok_or_else(|| AirtelError::Config("no PIN supplied for disbursement".to_string()))?;
        let public_key = self
            .config
            .public_key
            .as_deref()
            .ok_or_else(|| AirtelError::Key("no public key configured".to_string()))?;
        let encrypted = PinEncryptor::encrypt(pin, public_key)?;

        let body = DisbursementBody {
            payee: Payee { msisdn },
            reference: reference.clone(),
            pin: encrypted.into_inner(),
            transaction: DisbursementTransaction {
                amount,
                id: reference.clone(),
            },
        };

        info!(%reference, amount, "initiating disbursement");

        let request = self
            .default_authorized(Method::POST, self.endpoint(DISBURSEMENTS_PATH)?)
            .await?
            .json(&body);
        let response = self.transaction(request, DISBURSEMENTS_PATH).await?;

        info!(%reference, state = ?response.state(), "disbursement accepted");
        Ok(response)
    }

    /// Looks up a subscriber. The provider payload is returned verbatim.
    pub async fn user(&self, phone: &str) -> Result<Value> {
        let msisdn = normalize_msisdn(phone)?;
        let url = self.endpoint_with_segment(USERS_PATH, &msisdn)?;

        debug!(%msisdn, "looking up subscriber");

        let request = self.default_authorized(Method::GET, url).await?;
        let (status, text) = self.send(request, USERS_PATH).await?;

        if !status.is_success() {
            return Err(unexpected(status, text));
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(_) => Err(unexpected(status, text)),
        }
    }

    /// Validates an IPN payload and returns it unchanged.
    ///
    /// See [`ipn::reconcile`].
    pub fn reconcile(&self, payload: IpnPayload) -> Result<IpnPayload> {
        ipn::reconcile(payload)
    }

    /// Validates an IPN payload, hands it to `handler`, and returns it unchanged.
    ///
    /// See [`ipn::reconcile_with`].
    pub fn reconcile_with<F>(&self, payload: IpnPayload, handler: F) -> Result<IpnPayload>
    where
        F: FnOnce(&IpnPayload),
    {
        ipn::reconcile_with(payload, handler)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn endpoint_with_segment(&self, path: &str, segment: &str) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| AirtelError::Config(format!("cannot append to '{}'", path)))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn default_authorized(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        self.authorized(method, url, &self.config.country, &self.config.currency)
            .await
    }

    /// Builds a request carrying the bearer token and market headers.
    async fn authorized(
        &self,
        method: Method,
        url: Url,
        country: &str,
        currency: &str,
    ) -> Result<RequestBuilder> {
        let token = self
            .token()
            .await
            .ok_or_else(|| AirtelError::Auth("not authorized".to_string()))?;

        Ok(self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "*/*")
            .bearer_auth(token)
            .header(COUNTRY_HEADER, country)
            .header(CURRENCY_HEADER, currency))
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<(StatusCode, String)> {
        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "request to Airtel Money failed");
            AirtelError::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        debug!(path, status = status.as_u16(), "response received");

        Ok((status, text))
    }

    /// Sends a request to an endpoint answering with a status envelope.
    async fn transaction(&self, request: RequestBuilder, path: &str) -> Result<TransactionResponse> {
        let (status, text) = self.send(request, path).await?;
        parse_transaction(status, text)
    }
}

impl fmt::Debug for AirtelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtelClient")
            .field("config", &self.config)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Maps a raw response onto the status-envelope contract.
///
/// A parseable envelope with `success == false` is a provider failure even on
/// a non-2xx status; anything else that is not a 2xx envelope is a transport
/// failure.
fn parse_transaction(status: StatusCode, text: String) -> Result<TransactionResponse> {
    let parsed = match serde_json::from_str::<TransactionResponse>(&text) {
        Ok(parsed) => parsed,
        Err(_) => return Err(unexpected(status, text)),
    };

    if !parsed.status.success {
        warn!(
            code = %parsed.status.code,
            message = %parsed.status.message,
            "provider reported failure"
        );
        return Err(AirtelError::Payment {
            code: parsed.status.code,
            message: parsed.status.message,
        });
    }

    if !status.is_success() {
        return Err(unexpected(status, text));
    }

    Ok(parsed)
}

fn unexpected(status: StatusCode, body: String) -> AirtelError {
    AirtelError::UnexpectedResponse {
        status: status.as_u16(),
        body,
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AirtelError::MissingField(field.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use serde_json::json;

    fn client(config: AirtelConfig) -> AirtelClient {
        AirtelClient::new(config).unwrap()
    }

    #[test]
    fn test_environment_routing() {
        let live = client(AirtelConfig::new("id", "secret"));
        assert_eq!(live.base_url().as_str(), "https://openapi.airtel.africa/");

        let sandbox =
            client(AirtelConfig::new("id", "secret").with_environment(Environment::Sandbox));
        assert_eq!(sandbox.base_url().as_str(), "https://openapiuat.airtel.africa/");
        assert_eq!(
            sandbox.endpoint(PAYMENTS_PATH).unwrap().as_str(),
            "https://openapiuat.airtel.africa/merchant/v1/payments/"
        );
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = client(AirtelConfig::new("id", "secret").with_base_url("http://localhost:8080/api"));
        assert_eq!(
            client.endpoint(TOKEN_PATH).unwrap().as_str(),
            "http://localhost:8080/api/auth/oauth2/token"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = AirtelClient::new(AirtelConfig::new("id", "secret").with_base_url("not a url"));
        assert!(matches!(result, Err(AirtelError::UrlParse(_))));
    }

    #[test]
    fn test_endpoint_with_segment_encodes_id() {
        let client = client(AirtelConfig::new("id", "secret"));
        let url = client
            .endpoint_with_segment(TransactionKind::Payment.status_path(), "AB/12?x")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://openapi.airtel.africa/standard/v1/payments/AB%2F12%3Fx"
        );

        let url = client.endpoint_with_segment(USERS_PATH, "712345678").unwrap();
        assert_eq!(
            url.as_str(),
            "https://openapi.airtel.africa/standard/v1/users/712345678"
        );
    }

    #[tokio::test]
    async fn test_initial_token_and_set_token() {
        let client = client(AirtelConfig::new("id", "secret"));
        assert!(!client.is_authorized().await);

        client.set_token("abc").await;
        assert_eq!(client.token().await.as_deref(), Some("abc"));

        let seeded = AirtelClient::new(AirtelConfig::new("id", "secret").with_token("seed")).unwrap();
        assert!(seeded.is_authorized().await);

        let empty = AirtelClient::new(AirtelConfig::new("id", "secret").with_token("")).unwrap();
        assert!(!empty.is_authorized().await);

        seeded.set_token("").await;
        assert!(!seeded.is_authorized().await);
        assert_eq!(seeded.token().await, None);
    }

    #[tokio::test]
    async fn test_calls_without_token_fail_with_auth_error() {
        let client = client(AirtelConfig::new("id", "secret"));

        let err = client
            .prompt(PaymentRequest::new("+254712345678", 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AirtelError::Auth(_)));

        let err = client.status("TX1", TransactionKind::Payment).await.unwrap_err();
        assert!(matches!(err, AirtelError::Auth(_)));
    }

    #[tokio::test]
    async fn test_input_validation_precedes_network() {
        let client = client(AirtelConfig::new("id", "secret").with_token("tok"));

        let err = client
            .prompt(PaymentRequest::new("+254712345678", 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AirtelError::InvalidAmount(_)));

        let err = client
            .prompt(PaymentRequest::new("123", 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AirtelError::InvalidPhone(_)));

        let err = client.refund("  ", TransactionKind::Payment).await.unwrap_err();
        assert!(matches!(err, AirtelError::MissingField(_)));
    }

    #[tokio::test]
    async fn test_disburse_requires_pin_and_key() {
        let client = client(AirtelConfig::new("id", "secret").with_token("tok"));

        let err = client
            .disburse(DisbursementRequest::new("0712345678", 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AirtelError::Config(_)));

        let err = client
            .disburse(DisbursementRequest::new("0712345678", 10.0).with_pin("1234"))
            .await
            .unwrap_err();
        assert!(matches!(err, AirtelError::Key(_)));
    }

    #[test]
    fn test_parse_transaction_success() {
        let body = json!({
            "data": {"transaction": {"id": "TX1", "status": "Success."}},
            "status": {"code": "200", "message": "SUCCESS", "success": true}
        })
        .to_string();

        let parsed = parse_transaction(StatusCode::OK, body).unwrap();
        assert_eq!(parsed.transaction().unwrap().id, "TX1");
    }

    #[test]
    fn test_parse_transaction_provider_failure() {
        let body = json!({
            "status": {"code": "400", "message": "Invalid MSISDN", "success": false}
        })
        .to_string();

        let err = parse_transaction(StatusCode::OK, body.clone()).unwrap_err();
        assert_eq!(err.provider_message(), Some("Invalid MSISDN"));

        // Non-2xx with an envelope is still a provider failure.
        let err = parse_transaction(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(matches!(err, AirtelError::Payment { code, .. } if code == "400"));
    }

    #[test]
    fn test_parse_transaction_transport_failures() {
        let err = parse_transaction(StatusCode::BAD_GATEWAY, "<html>".to_string()).unwrap_err();
        assert!(matches!(err, AirtelError::UnexpectedResponse { status: 502, .. }));

        let err = parse_transaction(StatusCode::OK, "not json".to_string()).unwrap_err();
        assert!(err.is_transport());
    }
}
