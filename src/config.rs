//! Client configuration.
//!
//! [`AirtelConfig`] carries the provider credentials and defaults used by
//! [`AirtelClient`](crate::client::AirtelClient). It is built once and is not
//! modified after the client is constructed.

use crate::errors::{AirtelError, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Production host of the Airtel Africa Open API.
pub const LIVE_BASE_URL: &str = "https://openapi.airtel.africa/";

/// Sandbox (UAT) host of the Airtel Africa Open API.
pub const SANDBOX_BASE_URL: &str = "https://openapiuat.airtel.africa/";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider environment, selecting one of the two fixed hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Production
    #[default]
    Live,
    /// UAT sandbox
    Sandbox,
}

impl Environment {
    /// Base URL of this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Live => LIVE_BASE_URL,
            Environment::Sandbox => SANDBOX_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = AirtelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "production" | "prod" => Ok(Environment::Live),
            "sandbox" | "uat" | "test" => Ok(Environment::Sandbox),
            other => Err(AirtelError::Config(format!("unknown environment '{}'", other))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Live => f.write_str("live"),
            Environment::Sandbox => f.write_str("sandbox"),
        }
    }
}

/// Credentials and defaults for an Airtel Money client.
#[derive(Clone)]
pub struct AirtelConfig {
    /// OAuth2 client identifier
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// Default ISO country code sent in `X-Country` (e.g., "KE")
    pub country: String,

    /// Default ISO currency code sent in `X-Currency` (e.g., "KES")
    pub currency: String,

    /// Provider environment
    pub environment: Environment,

    /// Default disbursement PIN, used when a request carries none
    pub pin: Option<String>,

    /// Provider RSA public key for PIN encryption
    pub public_key: Option<String>,

    /// Bearer token to start with, skipping the first `authorize`
    pub token: Option<String>,

    /// Overrides the environment host (e.g., a local mock server)
    pub base_url: Option<String>,

    /// Per-request timeout handed to the HTTP client
    pub timeout: Duration,
}

impl AirtelConfig {
    /// Creates a configuration with Kenyan defaults (`KE`/`KES`) on the live environment.
    ///
    /// # Examples
    ///
    /// ```
    /// use airtel_money_rs::config::{AirtelConfig, Environment};
    ///
    /// let config = AirtelConfig::new("client-id", "client-secret")
    ///     .with_country("UG")
    ///     .with_currency("UGX")
    ///     .with_environment(Environment::Sandbox);
    ///
    /// assert_eq!(config.resolved_base_url(), "https://openapiuat.airtel.africa/");
    /// ```
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            country: "KE".to_string(),
            currency: "KES".to_string(),
            environment: Environment::Live,
            pin: None,
            public_key: None,
            token: None,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Loads the configuration from `AIRTEL_*` environment variables.
    ///
    /// `AIRTEL_CLIENT_ID` and `AIRTEL_CLIENT_SECRET` are required. Optional:
    /// `AIRTEL_COUNTRY`, `AIRTEL_CURRENCY`, `AIRTEL_ENV`, `AIRTEL_PIN`,
    /// `AIRTEL_PUBLIC_KEY`, `AIRTEL_BASE_URL`, `AIRTEL_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let client_id = required_var("AIRTEL_CLIENT_ID")?;
        let client_secret = required_var("AIRTEL_CLIENT_SECRET")?;

        let mut config = Self::new(client_id, client_secret);

        if let Some(country) = optional_var("AIRTEL_COUNTRY") {
            config.country = country;
        }
        if let Some(currency) = optional_var("AIRTEL_CURRENCY") {
            config.currency = currency;
        }
        if let Some(env) = optional_var("AIRTEL_ENV") {
            config.environment = env.parse()?;
        }
        config.pin = optional_var("AIRTEL_PIN");
        config.public_key = optional_var("AIRTEL_PUBLIC_KEY");
        config.base_url = optional_var("AIRTEL_BASE_URL");

        if let Some(secs) = optional_var("AIRTEL_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                AirtelError::Config(format!("AIRTEL_TIMEOUT_SECS is not a number: '{}'", secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sets the default country code.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Sets the default currency code.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Sets the provider environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the default disbursement PIN.
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    /// Sets the provider public key used for PIN encryption.
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Sets an initial bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Overrides the host for all requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The host requests are sent to: the override if set, otherwise the environment's host.
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

// Secrets stay out of logs.
impl fmt::Debug for AirtelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtelConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("country", &self.country)
            .field("currency", &self.currency)
            .field("environment", &self.environment)
            .field("pin", &self.pin.as_ref().map(|_| "<redacted>"))
            .field("public_key", &self.public_key.is_some())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name)
        .ok_or_else(|| AirtelError::Config(format!("{} environment variable is required", name)))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AirtelConfig::new("id", "secret");
        assert_eq!(config.country, "KE");
        assert_eq!(config.currency, "KES");
        assert_eq!(config.environment, Environment::Live);
        assert_eq!(config.resolved_base_url(), LIVE_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.pin.is_none());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = AirtelConfig::new("id", "secret")
            .with_country("UG")
            .with_currency("UGX")
            .with_environment(Environment::Sandbox)
            .with_pin("1234")
            .with_token("tok");

        assert_eq!(config.country, "UG");
        assert_eq!(config.currency, "UGX");
        assert_eq!(config.resolved_base_url(), SANDBOX_BASE_URL);
        assert_eq!(config.pin.as_deref(), Some("1234"));
        assert_eq!(config.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_base_url_override() {
        let config = AirtelConfig::new("id", "secret")
            .with_environment(Environment::Sandbox)
            .with_base_url("http://127.0.0.1:9999/");
        assert_eq!(config.resolved_base_url(), "http://127.0.0.1:9999/");
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("live".parse::<Environment>().unwrap(), Environment::Live);
        assert_eq!("Sandbox".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert!("staging".parse::<Environment>().is_err());
        assert_eq!(Environment::Sandbox.to_string(), "sandbox");
        assert_eq!(Environment::default(), Environment::Live);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AirtelConfig::new("id", "super-secret")
            .with_pin("9876")
            .with_token("bearer-xyz");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("9876"));
        assert!(!debug.contains("bearer-xyz"));
        assert!(debug.contains("id"));
    }

    #[test]
    fn test_from_env_missing_credentials() {
        std::env::remove_var("AIRTEL_CLIENT_ID");
        std::env::remove_var("AIRTEL_CLIENT_SECRET");

        let config = AirtelConfig::from_env();
        assert!(matches!(config, Err(AirtelError::Config(_))));
    }
}
