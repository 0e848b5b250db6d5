//! Same-origin enforcement for mutating requests.
//!
//! # Responsibilities
//! - Compute the application's base origin once
//! - Compare `Origin` (else `Referer`) against it
//!
//! # Design Decisions
//! - Origins compare on scheme, host and port; default ports are normalised
//! - An unparseable or opaque origin never matches
//! - Both headers absent passes. Some same-origin form posts omit both, so this
//!   branch stays permissive and is flagged for security review
//! - Safe methods (GET, HEAD, OPTIONS, TRACE) are not checked by the middleware

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use url::{Origin, Url};

use crate::error::AccessError;
use crate::http::server::AppState;

/// Configuration error for the base origin.
#[derive(Debug, thiserror::Error)]
pub enum OriginConfigError {
    #[error("invalid base url: {0}")]
    Parse(#[from] url::ParseError),

    #[error("base url has no tuple origin (need http or https with a host): {0}")]
    Opaque(String),
}

/// Validates declared request origins against the configured base origin.
#[derive(Debug, Clone)]
pub struct SameOriginEnforcer {
    base: Origin,
    serialized: String,
}

impl SameOriginEnforcer {
    pub fn new(base_url: &str) -> Result<Self, OriginConfigError> {
        let base = Url::parse(base_url)?.origin();
        if !base.is_tuple() {
            return Err(OriginConfigError::Opaque(base_url.to_string()));
        }
        let serialized = base.ascii_serialization();
        Ok(Self { base, serialized })
    }

    /// Base origin, e.g. `https://app.example.com`.
    pub fn base_origin(&self) -> &str {
        &self.serialized
    }

    fn matches(&self, value: &str) -> bool {
        Url::parse(value)
            .map(|url| url.origin() == self.base)
            .unwrap_or(false)
    }

    /// Decide on the given header values.
    pub fn check(&self, origin: Option<&str>, referer: Option<&str>) -> Result<(), AccessError> {
        match (origin, referer) {
            (Some(origin), _) if self.matches(origin) => Ok(()),
            (Some(origin), _) => {
                tracing::warn!(origin = %origin, expected = %self.serialized, "Origin mismatch");
                Err(AccessError::InvalidOrigin)
            }
            (None, Some(referer)) if self.matches(referer) => Ok(()),
            (None, Some(referer)) => {
                tracing::warn!(referer = %referer, expected = %self.serialized, "Referer origin mismatch");
                Err(AccessError::InvalidOrigin)
            }
            (None, None) => {
                tracing::debug!("No Origin or Referer; origin unverifiable, allowing");
                Ok(())
            }
        }
    }

    /// Decide on a request's headers. A non-UTF-8 header counts as present and invalid.
    pub fn check_headers(&self, headers: &HeaderMap) -> Result<(), AccessError> {
        let origin = headers.get(header::ORIGIN).map(|v| v.to_str().unwrap_or(""));
        let referer = headers.get(header::REFERER).map(|v| v.to_str().unwrap_or(""));
        self.check(origin, referer)
    }
}

/// Middleware rejecting cross-origin mutating requests.
pub async fn same_origin_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method().is_safe() {
        return next.run(request).await;
    }
    match state.origin.check_headers(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn enforcer() -> SameOriginEnforcer {
        SameOriginEnforcer::new("https://app.example.com").unwrap()
    }

    #[test]
    fn matching_origin_passes() {
        assert!(enforcer().check(Some("https://app.example.com"), None).is_ok());
    }

    #[test]
    fn foreign_origin_rejected() {
        let err = enforcer().check(Some("https://evil.example.com"), None).unwrap_err();
        assert_eq!(err.code(), "INVALID_ORIGIN");
        assert_eq!(err.status().as_u16(), 403);
    }

    #[test]
    fn origin_takes_precedence_over_referer() {
        let e = enforcer();
        assert!(e.check(Some("https://evil.example.com"), Some("https://app.example.com/page")).is_err());
        assert!(e.check(Some("https://app.example.com"), Some("https://evil.example.com/x")).is_ok());
    }

    #[test]
    fn referer_fallback() {
        let e = enforcer();
        assert!(e.check(None, Some("https://app.example.com/page")).is_ok());
        assert!(e.check(None, Some("https://evil.example.com/page")).is_err());
    }

    #[test]
    fn both_absent_is_permissive() {
        assert!(enforcer().check(None, None).is_ok());
    }

    #[test]
    fn scheme_and_port_matter() {
        let e = enforcer();
        assert!(e.check(Some("http://app.example.com"), None).is_err());
        assert!(e.check(Some("https://app.example.com:8443"), None).is_err());
        assert!(e.check(Some("https://app.example.com:443"), None).is_ok());
        assert!(e.check(Some("HTTPS://APP.EXAMPLE.COM"), None).is_ok());
    }

    #[test]
    fn garbage_and_null_never_match() {
        let e = enforcer();
        assert!(e.check(Some("null"), None).is_err());
        assert!(e.check(Some(""), None).is_err());
        assert!(e.check(None, Some("not a url")).is_err());
    }

    #[test]
    fn base_origin_is_normalised() {
        let e = SameOriginEnforcer::new("https://App.Example.com:443/some/path?q=1").unwrap();
        assert_eq!(e.base_origin(), "https://app.example.com");
        let local = SameOriginEnforcer::new("http://localhost:3000").unwrap();
        assert_eq!(local.base_origin(), "http://localhost:3000");
    }

    #[test]
    fn rejects_opaque_base() {
        assert!(SameOriginEnforcer::new("data:text/plain,hi").is_err());
        assert!(SameOriginEnforcer::new("not a url").is_err());
    }

    #[test]
    fn header_map_variant() {
        let e = enforcer();
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_static("https://app.example.com/account"));
        assert!(e.check_headers(&headers).is_ok());
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://evil.example.com"));
        assert!(e.check_headers(&headers).is_err());
    }
}
