pub mod extractor;
pub mod jwt;
pub mod password;

use crate::error::AppError;
use crate::state::SharedState;

/// Check the single admin account's credentials, applying the login rate
/// limit. Returns a signed session token.
pub fn authenticate(state: &SharedState, username: &str, password: &str) -> Result<String, AppError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    if let Err(retry_after) = state.login_limiter.check(username) {
        return Err(AppError::RateLimited(format!(
            "Too many failed login attempts. Try again in {retry_after} seconds."
        )));
    }

    let password_ok = password::verify(password, &state.config.admin_password_hash)
        .map_err(AppError::Internal)?;
    if username != state.config.admin_username || !password_ok {
        state.login_limiter.record_failure(username);
        tracing::warn!(username, "Failed admin login");
        return Err(AppError::Unauthorized("Invalid username or password".to_string()));
    }

    state.login_limiter.reset(username);
    tracing::info!(username, "Admin logged in");

    let claims =
        jwt::Claims::new(username, state.config.session_ttl_minutes).map_err(AppError::Internal)?;
    jwt::encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)
}
