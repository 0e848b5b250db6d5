//! Extraction of the caller's session token from request headers.

use axum::http::{header, HeaderMap};

/// Resolves the session token presented by the current request.
pub trait TokenSource: Send + Sync {
    fn current_token(&self, headers: &HeaderMap) -> Option<String>;
}

/// Reads the session cookie, falling back to `Authorization: Bearer` when allowed.
#[derive(Debug, Clone)]
pub struct HeaderTokenSource {
    cookie_name: String,
    allow_bearer: bool,
}

impl HeaderTokenSource {
    pub fn new(cookie_name: impl Into<String>, allow_bearer: bool) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            allow_bearer,
        }
    }

    fn from_cookies(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn from_bearer(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl TokenSource for HeaderTokenSource {
    fn current_token(&self, headers: &HeaderMap) -> Option<String> {
        self.from_cookies(headers).or_else(|| {
            if self.allow_bearer {
                self.from_bearer(headers)
            } else {
                None
            }
        })
    }
}
