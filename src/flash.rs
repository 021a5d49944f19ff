//! Toast notifications carried across a redirect in a short-lived cookie.

use axum::http::{header, HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::cookies::{self, CookieOptions};

pub const FLASH_COOKIE: &str = "bunko_toast";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == ToastVariant::Destructive
    }
}

pub fn encode(toast: &Toast) -> Option<String> {
    serde_json::to_vec(toast)
        .ok()
        .map(|bytes| URL_SAFE_NO_PAD.encode(bytes))
}

pub fn decode(raw: &str) -> Option<Toast> {
    let bytes = URL_SAFE_NO_PAD.decode(raw.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Reads the pending toast, if any.
pub fn peek(headers: &HeaderMap) -> Option<Toast> {
    cookies::get_cookie(headers, FLASH_COOKIE).and_then(|raw| decode(&raw))
}

pub fn set_cookie(toast: &Toast, options: CookieOptions) -> Option<HeaderValue> {
    let value = encode(toast)?;
    cookies::build_cookie(FLASH_COOKIE, &value, Some(60), options)
}

pub fn clear_cookie(options: CookieOptions) -> Option<HeaderValue> {
    cookies::clear_cookie(FLASH_COOKIE, options)
}

/// Appends a `Set-Cookie` that consumes the toast when one was present.
pub fn consume(request_headers: &HeaderMap, response_headers: &mut HeaderMap, options: CookieOptions) {
    if cookies::get_cookie(request_headers, FLASH_COOKIE).is_some() {
        if let Some(cookie) = clear_cookie(options) {
            response_headers.append(header::SET_COOKIE, cookie);
        }
    }
}
