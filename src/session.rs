use axum_extra::extract::cookie::{Cookie, SameSite};
use rand::Rng;

pub const COOKIE_NAME: &str = "admin_token";

const TOKEN_LEN: usize = 32;
const MAX_AGE_HOURS: i64 = 24;

/// Generate an opaque session token. Possession of any non-empty token is
/// what the admin middleware checks; there is no server-side session table,
/// so a token stays valid until its cookie expires.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// The admin session cookie: HttpOnly, SameSite=Strict, 24 hour expiry.
/// `secure` is driven by config so local development over plain HTTP works.
pub fn auth_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(MAX_AGE_HOURS))
        .path("/")
        .build()
}

/// Cookie handle used to clear the session on logout. The path must match
/// the one set at login for the browser to drop it.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(COOKIE_NAME);
    cookie.set_path("/");
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_alphanumeric_and_fixed_length() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_are_not_repeated() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn auth_cookie_attributes() {
        let cookie = auth_cookie("sometoken".to_string(), true);
        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.value(), "sometoken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(MAX_AGE_HOURS)));
    }

    #[test]
    fn insecure_cookie_for_local_development() {
        let cookie = auth_cookie("sometoken".to_string(), false);
        assert_eq!(cookie.secure(), Some(false));
    }
}
