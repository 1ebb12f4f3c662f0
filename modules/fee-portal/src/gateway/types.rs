use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Request to start a hosted-checkout transaction
#[derive(Debug, Clone, PartialEq)]
pub struct InitializeRequest {
    pub email: String,
    /// Major currency units (e.g. Naira, not kobo)
    pub amount: Decimal,
    pub reference: String,
    pub callback_url: String,
    pub currency: String,
    pub description: Option<String>,
}

/// Where to send the parent to pay
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    pub authorization_url: String,
    pub reference: String,
}

/// Which transaction to verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyTarget {
    /// Provider-assigned transaction id
    TransactionId(String),
    /// Our own payment reference
    Reference(String),
}

/// Provider transaction status normalised across gateways
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayTransactionStatus {
    Success,
    Failed,
    Pending,
}

/// Result of a verify call
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
    pub status: GatewayTransactionStatus,
    /// Major currency units
    pub amount: Decimal,
    pub currency: Option<String>,
    pub payer_email: Option<String>,
    /// Provider's description of the outcome, when it gives one
    pub message: Option<String>,
}

/// Deserialize a decimal from a JSON number or string without going through
/// a binary float.
pub(crate) fn decimal_from_json<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let text = match &value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a number, got {other}"
            )))
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(serde::de::Error::custom)
}

/// Deserialize an id that providers send either as a number or a string
pub(crate) fn optional_id_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Deserialize)]
    struct Amounted {
        #[serde(deserialize_with = "decimal_from_json")]
        amount: Decimal,
        #[serde(default, deserialize_with = "optional_id_from_json")]
        id: Option<String>,
    }

    #[test]
    fn decimal_from_number_and_string() {
        let a: Amounted = serde_json::from_str(r#"{"amount": 5000}"#).unwrap();
        assert_eq!(a.amount, dec!(5000));
        let a: Amounted = serde_json::from_str(r#"{"amount": 0.1}"#).unwrap();
        assert_eq!(a.amount, dec!(0.1));
        let a: Amounted = serde_json::from_str(r#"{"amount": "12.50"}"#).unwrap();
        assert_eq!(a.amount, dec!(12.50));
        assert!(serde_json::from_str::<Amounted>(r#"{"amount": true}"#).is_err());
    }

    #[test]
    fn ids_accept_numbers_or_strings() {
        let a: Amounted = serde_json::from_str(r#"{"amount": 1, "id": 288200108}"#).unwrap();
        assert_eq!(a.id.as_deref(), Some("288200108"));
        let a: Amounted = serde_json::from_str(r#"{"amount": 1, "id": "abc"}"#).unwrap();
        assert_eq!(a.id.as_deref(), Some("abc"));
        let a: Amounted = serde_json::from_str(r#"{"amount": 1}"#).unwrap();
        assert!(a.id.is_none());
    }
}
