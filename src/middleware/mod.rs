use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use crate::models::ErrorResponse;
use crate::session;

/// Gate for the admin routes: the session cookie set by the auth handler
/// must be present. Token presence is the whole check - there is no
/// server-side session table to revoke against, so a token stays good
/// until its cookie expires.
pub async fn require_admin(
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let authenticated = jar
        .get(session::COOKIE_NAME)
        .map(|cookie| !cookie.value().is_empty())
        .unwrap_or(false);

    if !authenticated {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("unauthorized", "Not authenticated")),
        ));
    }

    Ok(next.run(request).await)
}
