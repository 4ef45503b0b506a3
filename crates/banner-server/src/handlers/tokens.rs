//! Token handlers

use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    token: String,
}

pub async fn user_token(State(state): State<AppState>) -> Result<Json<TokenResponse>, StatusCode> {
    issue(&state, false)
}

pub async fn admin_token(State(state): State<AppState>) -> Result<Json<TokenResponse>, StatusCode> {
    issue(&state, true)
}

fn issue(state: &AppState, admin: bool) -> Result<Json<TokenResponse>, StatusCode> {
    let token = state.tokens.issue(admin).map_err(|e| {
        error!("Failed to issue token: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(TokenResponse { token }))
}
