use std::env;
use std::str::FromStr;

use crate::gateway::GatewayConfig;

/// Where payment records live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Postgres,
    InMemory,
}

impl FromStr for StoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Ok(StoreType::Postgres),
            "inmemory" => Ok(StoreType::InMemory),
            other => Err(format!(
                "Invalid STORE_TYPE: {other}. Must be 'postgres' or 'inmemory'"
            )),
        }
    }
}

/// School identity shown on pages, receipts and emails
#[derive(Debug, Clone, PartialEq)]
pub struct Branding {
    pub school_name: String,
    pub contact_email: Option<String>,
    /// Copied on every payment confirmation
    pub accounts_email: Option<String>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            school_name: "Sunshine Academy".to_string(),
            contact_email: None,
            accounts_email: None,
        }
    }
}

/// Outbound mail relay settings
#[derive(Clone, PartialEq)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_type: StoreType,
    pub database_url: Option<String>,
    pub public_base_url: String,
    pub currency: String,
    pub gateway: GatewayConfig,
    pub branding: Branding,
    pub mail: Option<MailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_type: StoreType = non_empty("STORE_TYPE")
            .unwrap_or_else(|| "postgres".to_string())
            .parse()?;

        let database_url = non_empty("DATABASE_URL");
        if store_type == StoreType::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set when STORE_TYPE=postgres".to_string());
        }

        let host = non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port: u16 = non_empty("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .map_err(|_| "PORT must be a valid u16".to_string())?;

        let public_base_url = non_empty("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://127.0.0.1:{port}"))
            .trim_end_matches('/')
            .to_string();

        let currency = non_empty("PAYMENT_CURRENCY")
            .unwrap_or_else(|| "NGN".to_string())
            .to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(format!(
                "PAYMENT_CURRENCY must be a 3-letter code (ISO 4217), got: {currency}"
            ));
        }

        let gateway = GatewayConfig::from_lookup(&lookup).map_err(|e| e.to_string())?;

        let defaults = Branding::default();
        let branding = Branding {
            school_name: non_empty("SCHOOL_NAME").unwrap_or(defaults.school_name),
            contact_email: non_empty("SCHOOL_CONTACT_EMAIL"),
            accounts_email: non_empty("SCHOOL_ACCOUNTS_EMAIL"),
        };

        let mail = match (non_empty("MAIL_API_URL"), non_empty("MAIL_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(MailConfig {
                api_url,
                api_key,
                from: non_empty("MAIL_FROM")
                    .or_else(|| branding.accounts_email.clone())
                    .ok_or_else(|| "MAIL_FROM must be set when MAIL_API_URL is set".to_string())?,
            }),
            (None, None) => None,
            _ => return Err("MAIL_API_URL and MAIL_API_KEY must be set together".to_string()),
        };

        Ok(Config {
            host,
            port,
            store_type,
            database_url,
            public_base_url,
            currency,
            gateway,
            branding,
            mail,
        })
    }

    /// Where the gateway sends the parent after checkout
    pub fn callback_url(&self) -> String {
        format!("{}/verify/", self.public_base_url)
    }
}
