//! Token service
//!
//! Issues and verifies HS256 JWTs. A token carries a single `admin` claim
//! that decides which routes the bearer may reach.

use crate::config::AuthConfig;
use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub struct TokenService {
    jwt_secret: String,
    user_ttl: Duration,
    admin_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            user_ttl: Duration::seconds(config.user_token_ttl_secs),
            admin_ttl: Duration::seconds(config.admin_token_ttl_secs),
        }
    }

    pub fn issue(&self, admin: bool) -> Result<String> {
        let now = Utc::now();
        let ttl = if admin { self.admin_ttl } else { self.user_ttl };
        let claims = Claims {
            admin,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Returns the `admin` claim of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<bool> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims.admin)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default)]
    admin: bool,
    exp: i64,
    iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("secret");

        let user = tokens.issue(false).unwrap();
        let admin = tokens.issue(true).unwrap();

        assert!(!tokens.verify(&user).unwrap());
        assert!(tokens.verify(&admin).unwrap());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = service("one").issue(true).unwrap();
        assert!(service("two").verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new(&AuthConfig {
            jwt_secret: "secret".to_string(),
            user_token_ttl_secs: -3_600,
            admin_token_ttl_secs: 600,
        });

        let token = tokens.issue(false).unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(service("secret").verify("not-a-jwt").is_err());
    }
}
