//! Token cookies

use axum::http::{header, HeaderMap, HeaderValue};

pub const ACCESS_COOKIE_NAME: &str = "accessToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Read a cookie value from the `Cookie` request headers
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Build a `Set-Cookie` value carrying a token
pub fn token_cookie(name: &str, token: &str, max_age_secs: Option<u64>, secure: bool) -> HeaderValue {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Strict", name, token);
    if let Some(max_age) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    to_header_value(cookie)
}

/// Build a `Set-Cookie` value that clears a token cookie
pub fn clear_cookie(name: &str) -> HeaderValue {
    to_header_value(format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", name))
}

// JWTs and cookie names are plain ASCII, so this never falls back
fn to_header_value(cookie: String) -> HeaderValue {
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}
