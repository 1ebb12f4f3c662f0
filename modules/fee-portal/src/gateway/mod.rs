pub mod error;
pub mod flutterwave;
pub mod paystack;
pub mod types;

pub use error::GatewayError;
pub use flutterwave::FlutterwaveClient;
pub use paystack::PaystackClient;
pub use types::{
    Checkout, GatewayTransactionStatus, InitializeRequest, VerifiedTransaction, VerifyTarget,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const PAYSTACK_DEFAULT_BASE_URL: &str = "https://api.paystack.co";
pub const FLUTTERWAVE_DEFAULT_BASE_URL: &str = "https://api.flutterwave.com/v3";

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Supported hosted-checkout providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayProvider {
    Paystack,
    Flutterwave,
}

impl FromStr for GatewayProvider {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paystack" => Ok(GatewayProvider::Paystack),
            "flutterwave" | "flw" => Ok(GatewayProvider::Flutterwave),
            other => Err(GatewayError::ConfigError(format!(
                "Invalid PAYMENT_GATEWAY: {other}. Must be 'paystack' or 'flutterwave'"
            ))),
        }
    }
}

impl fmt::Display for GatewayProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayProvider::Paystack => f.write_str("paystack"),
            GatewayProvider::Flutterwave => f.write_str("flutterwave"),
        }
    }
}

/// Configuration for the payment gateway client
#[derive(Clone)]
pub struct GatewayConfig {
    pub provider: GatewayProvider,
    pub secret_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("provider", &self.provider)
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GatewayConfig {
    pub fn new(
        provider: GatewayProvider,
        secret_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            secret_key: secret_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: GATEWAY_TIMEOUT,
        }
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider: GatewayProvider = lookup("PAYMENT_GATEWAY")
            .unwrap_or_else(|| "paystack".to_string())
            .parse()?;

        let (key_var, url_var, default_url) = match provider {
            GatewayProvider::Paystack => (
                "PAYSTACK_SECRET_KEY",
                "PAYSTACK_BASE_URL",
                PAYSTACK_DEFAULT_BASE_URL,
            ),
            GatewayProvider::Flutterwave => {
                ("FLW_SECRET_KEY", "FLW_BASE_URL", FLUTTERWAVE_DEFAULT_BASE_URL)
            }
        };

        let secret_key = lookup(key_var)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GatewayError::ConfigError(format!("Missing {key_var}")))?;
        let base_url = lookup(url_var).unwrap_or_else(|| default_url.to_string());

        Ok(Self::new(provider, secret_key, base_url))
    }
}

/// Hosted-checkout gateway: start a transaction, then confirm its outcome
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> GatewayProvider;

    async fn initialize(&self, request: &InitializeRequest) -> Result<Checkout, GatewayError>;

    async fn verify(&self, target: &VerifyTarget) -> Result<VerifiedTransaction, GatewayError>;
}

/// Build the configured gateway client
pub fn build_gateway(config: GatewayConfig) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
    Ok(match config.provider {
        GatewayProvider::Paystack => Arc::new(PaystackClient::new(config)?),
        GatewayProvider::Flutterwave => Arc::new(FlutterwaveClient::new(config)?),
    })
}

/// Error body shape shared by both providers
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
}

/// Authenticated JSON transport shared by the provider clients
#[derive(Clone)]
pub(crate) struct HttpTransport {
    config: Arc<GatewayConfig>,
    http_client: Client,
}

impl HttpTransport {
    pub(crate) fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        Ok(HttpTransport {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Make a GET request to the provider API
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.secret_key);

        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        Self::handle_response(response).await
    }

    /// Make a POST request to the provider API
    pub(crate) async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        Self::handle_response(response).await
    }

    /// Convert an HTTP response into the expected type or a classified error
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str::<T>(&body)
                .map_err(|e| GatewayError::ParseError(e.to_string()));
        }

        let message = serde_json::from_str::<ProviderErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        match message {
            Some(message) if status.is_client_error() => Err(GatewayError::Rejected { message }),
            _ => Err(GatewayError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }),
        }
    }
}

/// Identifiers end up in URL paths; only allow what providers actually issue.
pub(crate) fn ensure_path_safe(value: &str) -> Result<&str, GatewayError> {
    let valid = !value.is_empty()
        && value.len() <= 100
        && !value.chars().all(|c| c == '.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(value)
    } else {
        Err(GatewayError::InvalidRequest(format!(
            "identifier contains unsupported characters: {value:?}"
        )))
    }
}

/// Checks shared by both providers before an initialize call
pub(crate) fn check_initialize_request(request: &InitializeRequest) -> Result<(), GatewayError> {
    if request.amount <= rust_decimal::Decimal::ZERO {
        return Err(GatewayError::InvalidRequest(format!(
            "amount must be positive, got {}",
            request.amount
        )));
    }
    if !crate::validation::is_valid_email(&request.email) {
        return Err(GatewayError::InvalidRequest(format!(
            "invalid customer email: {}",
            request.email
        )));
    }
    ensure_path_safe(&request.reference)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_paystack() {
        let config =
            GatewayConfig::from_lookup(lookup(&[("PAYSTACK_SECRET_KEY", "sk_test_1")])).unwrap();
        assert_eq!(config.provider, GatewayProvider::Paystack);
        assert_eq!(config.base_url, PAYSTACK_DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn flutterwave_uses_its_own_keys() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("PAYMENT_GATEWAY", "Flutterwave"),
            ("FLW_SECRET_KEY", "FLWSECK_TEST-1"),
            ("FLW_BASE_URL", "http://localhost:9999/v3/"),
        ]))
        .unwrap();
        assert_eq!(config.provider, GatewayProvider::Flutterwave);
        assert_eq!(config.base_url, "http://localhost:9999/v3");
    }

    #[test]
    fn missing_secret_is_a_config_error() {
        let err =
            GatewayConfig::from_lookup(lookup(&[("PAYMENT_GATEWAY", "flutterwave")])).unwrap_err();
        assert!(matches!(err, GatewayError::ConfigError(m) if m.contains("FLW_SECRET_KEY")));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!("stripe".parse::<GatewayProvider>().is_err());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = GatewayConfig::new(GatewayProvider::Paystack, "sk_live_secret", "https://x");
        assert!(!format!("{config:?}").contains("sk_live_secret"));
    }

    #[test]
    fn path_safety() {
        assert!(ensure_path_safe("3f2b8c1e-0d7a-4c52-9d4e-2a1b3c4d5e6f").is_ok());
        assert!(ensure_path_safe("288200108").is_ok());
        assert!(ensure_path_safe("../admin").is_err());
        assert!(ensure_path_safe("a/b").is_err());
        assert!(ensure_path_safe("").is_err());
        assert!(ensure_path_safe("..").is_err());
    }
}
