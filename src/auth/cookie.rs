//! Session cookie management: the signed token travels in an HttpOnly cookie
//! whose lifetime matches the token's own expiry.

use actix_web::cookie::{time::Duration, Cookie, SameSite};

pub const COOKIE_NAME: &str = "token";

pub fn session_cookie(
    token: String,
    max_age: chrono::Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build(COOKIE_NAME, token)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(max_age.num_seconds()))
        .finish()
}

/// Expired empty-value cookie; setting it clears any session the client holds.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.make_removal();
    cookie
}
