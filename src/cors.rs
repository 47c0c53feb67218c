//! Cross-origin policy for the browser frontends.
//!
//! Only a handful of known frontends may read our responses. Requests from
//! anywhere else are still served, they just don't get the allow-origin header,
//! so the browser hides the response from the calling page.
use axum::{
    extract::{Request, State},
    http::{
        HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, trace};

pub const PRODUCTION_ORIGIN: &str = "https://jenet.ai";
pub const STAGING_ORIGIN: &str = "https://dev.jenet.ai";
pub const DEFAULT_DEV_ORIGIN: &str = "http://localhost:3000";

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// The fixed set of origins trusted to read responses cross-origin.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Arc<HashSet<String>>,
}

impl OriginPolicy {
    /// Production and staging plus the given local development origin.
    pub fn new(dev_origin: impl Into<String>) -> Self {
        Self::from_origins([
            PRODUCTION_ORIGIN.to_string(),
            STAGING_ORIGIN.to_string(),
            dev_origin.into(),
        ])
    }

    pub fn from_origins(origins: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: Arc::new(origins.into_iter().collect()),
        }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed.contains(origin)
    }
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DEV_ORIGIN)
    }
}

/// Applies [`OriginPolicy`] to every request and answers pre-flights directly.
pub async fn cors_middleware(
    State(policy): State<OriginPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let allow_origin = req
        .headers()
        .get(ORIGIN)
        .filter(|value| value.to_str().is_ok_and(|origin| policy.is_allowed(origin)))
        .cloned();

    if allow_origin.is_none() {
        trace!(origin = ?req.headers().get(ORIGIN), "Origin not allowed, omitting allow-origin");
    }

    let mut response = if req.method() == Method::OPTIONS {
        debug!(path = %req.uri().path(), "Answering pre-flight request");
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    if let Some(origin) = allow_origin {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://jenet.ai", true)]
    #[case("https://dev.jenet.ai", true)]
    #[case("http://localhost:3000", true)]
    #[case("http://localhost:3001", false)]
    #[case("https://jenet.ai/", false)]
    #[case("https://evil.example", false)]
    #[case("", false)]
    fn test_default_policy(#[case] origin: &str, #[case] allowed: bool) {
        assert_eq!(OriginPolicy::default().is_allowed(origin), allowed);
    }

    #[test]
    fn test_custom_dev_origin_replaces_localhost() {
        let policy = OriginPolicy::new("http://127.0.0.1:5173");
        assert!(policy.is_allowed("http://127.0.0.1:5173"));
        assert!(!policy.is_allowed(DEFAULT_DEV_ORIGIN));
        assert!(policy.is_allowed(PRODUCTION_ORIGIN));
    }
}
