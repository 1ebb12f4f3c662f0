pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notifications;
pub mod receipt;
pub mod repos;
pub mod routes;
pub mod services;
pub mod validation;
pub mod views;

pub use routes::{portal_router, AppState};
