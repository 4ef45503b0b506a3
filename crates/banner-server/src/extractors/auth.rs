//! Auth extractor for protected routes

use crate::handlers::ApiError;
use crate::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated caller
#[derive(Clone, Copy, Debug)]
pub struct Caller {
    pub is_admin: bool,
}

impl Caller {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?;

        match state.tokens.verify(token) {
            Ok(is_admin) => Ok(Caller { is_admin }),
            Err(e) => Err(ApiError::Unauthorized(format!("Invalid token: {}", e))),
        }
    }
}
