use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};
use std::sync::Arc;

use super::AppState;
use crate::views;

pub async fn index() -> Redirect {
    Redirect::to("/pay/")
}

pub async fn about(State(state): State<Arc<AppState>>) -> Html<String> {
    views::about(&state.branding)
}

pub async fn contact(State(state): State<Arc<AppState>>) -> Html<String> {
    views::contact(&state.branding)
}

pub async fn not_found(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        views::not_found(&state.branding, "The page you requested does not exist."),
    )
}
