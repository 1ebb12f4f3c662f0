pub mod payment_service;

pub use payment_service::{InitializedPayment, PaymentService, VerifiedPayment};
