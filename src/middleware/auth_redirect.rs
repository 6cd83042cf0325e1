use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

pub const LOGIN_PATH: &str = "/admin/login";

/// Turn 401 responses from admin views into a redirect to the login page.
/// HTMX requests get an `HX-Redirect` header instead, since a plain redirect
/// would be followed inside the partial swap.
pub async fn redirect_unauthorized(req: Request, next: Next) -> Response {
    let is_htmx = req.headers().contains_key("hx-request");
    let response = next.run(req).await;
    if response.status() != StatusCode::UNAUTHORIZED {
        return response;
    }

    if is_htmx {
        let mut response = StatusCode::NO_CONTENT.into_response();
        response
            .headers_mut()
            .insert("hx-redirect", HeaderValue::from_static(LOGIN_PATH));
        response
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    }
}
