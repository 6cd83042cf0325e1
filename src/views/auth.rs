use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::auth::extractor::SESSION_COOKIE;
use crate::auth::{self, jwt};
use crate::error::AppError;
use crate::routes::auth::{clear_session_cookie, session_cookie};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    error: Option<String>,
    next: String,
    username: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Only same-site admin paths are accepted as a post-login destination.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with("/admin/") && !path.starts_with("//") => path.to_string(),
        _ => "/admin/dashboard".to_string(),
    }
}

pub async fn root() -> Redirect {
    Redirect::to("/admin/dashboard")
}

pub async fn login_page(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(q): Query<LoginQuery>,
) -> Response {
    let next = safe_next(q.next.as_deref());

    // If already logged in, skip the form
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if jwt::decode_token(cookie.value(), &state.config.jwt_secret).is_ok() {
            return Redirect::to(&next).into_response();
        }
    }

    let template = LoginTemplate {
        error: None,
        next,
        username: String::new(),
    };
    Html(template.render().unwrap_or_default()).into_response()
}

pub async fn login_submit(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref());

    match auth::authenticate(&state, &form.username, &form.password) {
        Ok(token) => {
            let jar = jar.add(session_cookie(&token, &state.config));
            (jar, Redirect::to(&next)).into_response()
        }
        Err(err) => {
            let status = match &err {
                AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
                AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                _ => return err.into_response(),
            };
            let message = match err {
                AppError::RateLimited(msg) | AppError::BadRequest(msg) | AppError::Unauthorized(msg) => msg,
                _ => String::new(),
            };
            let template = LoginTemplate {
                error: Some(message),
                next,
                username: form.username,
            };
            (status, Html(template.render().unwrap_or_default())).into_response()
        }
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.add(clear_session_cookie()), Redirect::to("/admin/login"))
}
