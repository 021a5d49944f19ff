use axum::http::{header, HeaderMap, HeaderValue};

use crate::session::SESSION_COOKIE;

#[derive(Debug, Clone, Copy, Default)]
pub struct CookieOptions {
    pub secure: bool,
}

/// Session token from the session cookie, or from `Authorization: Bearer` for
/// API clients.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = get_cookie(headers, SESSION_COOKIE) {
        return Some(token);
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for raw in headers.get_all(header::COOKIE) {
        let Ok(raw) = raw.to_str() else {
            continue;
        };
        for part in raw.split(';') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            if key == name && !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

pub fn build_cookie(
    name: &str,
    value: &str,
    max_age_secs: Option<i64>,
    options: CookieOptions,
) -> Option<HeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

pub fn clear_cookie(name: &str, options: CookieOptions) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{name}=; Path=/; HttpOnly; SameSite=Lax; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0"
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

pub fn session_cookie(token: &str, options: CookieOptions) -> Option<HeaderValue> {
    build_cookie(SESSION_COOKIE, token, None, options)
}

pub fn clear_session_cookie(options: CookieOptions) -> Option<HeaderValue> {
    clear_cookie(SESSION_COOKIE, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cookie_skips_malformed_parts() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("flag; theme=dark; bunko_session=abc123"),
        );
        assert_eq!(get_cookie(&headers, "bunko_session").as_deref(), Some("abc123"));
        assert_eq!(get_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_extract_token_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(extract_token(&headers).as_deref(), Some("tok"));

        headers.insert(header::COOKIE, HeaderValue::from_static("bunko_session=cookie-tok"));
        assert_eq!(extract_token(&headers).as_deref(), Some("cookie-tok"));
    }

    #[test]
    fn test_secure_flag() {
        let cookie = build_cookie("a", "b", Some(60), CookieOptions { secure: true }).unwrap();
        let text = cookie.to_str().unwrap();
        assert!(text.contains("Max-Age=60"));
        assert!(text.ends_with("; Secure"));
    }
}
