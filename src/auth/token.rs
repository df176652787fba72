use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::models::PublicUser;
use crate::error::{AppError, TokenError};

/// Subject identity carried by a session token. Self-contained: nothing is
/// persisted server-side, the token expires on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies signed session tokens with a fixed expiry window.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: String,
    expiry: Duration,
}

impl TokenIssuer {
    /// An empty secret is a startup invariant violation, not a per-request
    /// condition; construction fails before any token is issued.
    pub fn new(secret: &str, expiry_days: i64) -> Result<Self, AppError> {
        if secret.trim().is_empty() {
            return Err(AppError::Token(TokenError::MissingSecret));
        }
        Ok(Self {
            secret: secret.to_string(),
            expiry: Duration::days(expiry_days),
        })
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn issue(&self, user: &PublicUser) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(TokenError::from)?;

        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; the default 60s leeway would let expired tokens
        // through.
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;

        Ok(data.claims)
    }
}
