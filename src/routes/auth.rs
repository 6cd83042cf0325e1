use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::{self, extractor::Session, extractor::SESSION_COOKIE};
use crate::config::Config;
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub issued_at: String,
    pub expires_at: String,
}

pub(crate) fn session_cookie(token: &str, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(config.session_ttl_minutes))
        .build()
}

pub(crate) fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let token = auth::authenticate(&state, &req.username, &req.password)?;
    let jar = jar.add(session_cookie(&token, &state.config));
    Ok((
        jar,
        Json(LoginResponse {
            access_token: token,
            expires_in: state.config.session_ttl_minutes * 60,
        }),
    ))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.add(clear_session_cookie()),
        Json(serde_json::json!({ "message": "Logged out" })),
    )
}

pub async fn session(session: Session) -> Json<SessionResponse> {
    Json(SessionResponse {
        username: session.username,
        issued_at: session.issued_at.to_rfc3339(),
        expires_at: session.expires_at.to_rfc3339(),
    })
}
