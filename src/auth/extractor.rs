use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "admin_session";

/// A validated admin session. Extracting it is the gate in front of every
/// admin view: the rejection is produced before the handler runs, so no
/// record query is issued for an unauthenticated request.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn from_token(token: &str, state: &SharedState) -> Result<Self, AppError> {
        let claims = jwt::decode_token(token, &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        // Tokens minted for a previous admin account are not honoured.
        if claims.sub != state.config.admin_username {
            return Err(AppError::Unauthorized("Unknown session user".to_string()));
        }

        Ok(Session {
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            username: claims.sub,
        })
    }
}

impl FromRequestParts<SharedState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        // Try Bearer token from Authorization header first
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Session::from_token(token, state);
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            return Session::from_token(cookie.value(), state);
        }

        Err(AppError::Unauthorized(
            "Missing session".to_string(),
        ))
    }
}
