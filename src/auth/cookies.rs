use axum::http::{header, HeaderMap};

pub const TOKEN_COOKIE: &str = "token";

fn attributes(secure: bool) -> &'static str {
    if secure {
        "HttpOnly; SameSite=Strict; Path=/; Secure"
    } else {
        "HttpOnly; SameSite=Strict; Path=/"
    }
}

/// `Set-Cookie` value issuing the session token.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    format!(
        "{}={}; {}; Max-Age={}",
        TOKEN_COOKIE,
        token,
        attributes(secure),
        max_age_secs
    )
}

/// `Set-Cookie` value expiring the session token. Attributes must match the issuing cookie.
pub fn cleared_cookie(secure: bool) -> String {
    format!(
        "{}=; {}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        TOKEN_COOKIE,
        attributes(secure)
    )
}

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name && !v.is_empty()).then(|| v.to_string())
        })
}
