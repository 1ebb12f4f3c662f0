use thiserror::Error;

/// Message shown to parents when the gateway could not be reached or
/// answered with something we could not understand.
pub const GENERIC_GATEWAY_MESSAGE: &str =
    "We could not complete your request with the payment provider. Please try again.";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid gateway request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("API error (status {status_code}): {message}")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Payment provider rejected the request: {message}")]
    Rejected { message: String },
}

impl GatewayError {
    /// Provider-reported business failure (as opposed to a communication failure)
    pub fn is_provider_rejection(&self) -> bool {
        matches!(self, GatewayError::Rejected { .. })
    }

    /// Text safe to show to the parent: the provider's own message for
    /// business failures, a generic message for everything else.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Rejected { message } => message.clone(),
            _ => GENERIC_GATEWAY_MESSAGE.to_string(),
        }
    }
}
