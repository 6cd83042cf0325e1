use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by the admin session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for a session lasting `ttl_minutes`. Fails when the expiry
    /// cannot be represented.
    pub fn new(username: &str, ttl_minutes: i64) -> Result<Self, String> {
        let now = Utc::now();
        let exp = TimeDelta::try_minutes(ttl_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| format!("Session lifetime of {ttl_minutes} minutes is out of range"))?;
        Ok(Self {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

// No leeway: a session is dead the second it expires.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);
    validation
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to sign session token: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation())
        .map(|data| data.claims)
        .map_err(|e| format!("Rejected session token: {e}"))
}
