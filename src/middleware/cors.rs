// CORS middleware with wildcard-port origin patterns.
// The default allowlist is `http://localhost:*, https://localhost:*`, so a
// plain allowlist header comparison is not enough; origins are matched
// against patterns whose port may be `*`.

use axum::{
    body::Body,
    http::{
        header::{self, HeaderValue},
        Method, Request, Response, StatusCode,
    },
    middleware::Next,
};
use tracing::debug;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";
const MAX_AGE_SECONDS: &str = "300";

/// True when `origin` matches one of the configured patterns. A pattern
/// ending in `:*` matches any port on that scheme+host (including none).
pub fn origin_matches(origin: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if let Some(prefix) = pattern.strip_suffix(":*") {
            origin == prefix
                || origin
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix(':'))
                    .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
        } else {
            origin == pattern
        }
    })
}

pub async fn cors_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response<Body>, StatusCode> {
    let config = crate::app_config::config();

    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let allowed_origin = origin.as_ref().and_then(|origin| {
        if origin_matches(origin, &config.cors_allowed_origins) {
            Some(origin.clone())
        } else {
            debug!("CORS: origin not allowed: {}", origin);
            None
        }
    });

    // Preflight requests are answered here instead of hitting a route
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());

        if let Some(allowed) = allowed_origin {
            apply_cors_headers(&mut response, &allowed);
            response.headers_mut().insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            response.headers_mut().insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
            response.headers_mut().insert(
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static(MAX_AGE_SECONDS),
            );
        }

        *response.status_mut() = StatusCode::OK;
        return Ok(response);
    }

    let mut response = next.run(request).await;

    if let Some(allowed) = allowed_origin {
        apply_cors_headers(&mut response, &allowed);
    }

    Ok(response)
}

fn apply_cors_headers(response: &mut Response<Body>, origin: &str) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wildcard_port_patterns() {
        let allowed = patterns(&["http://localhost:*", "https://localhost:*"]);

        assert!(origin_matches("http://localhost:3000", &allowed));
        assert!(origin_matches("https://localhost:8443", &allowed));
        assert!(origin_matches("http://localhost", &allowed));
        assert!(!origin_matches("http://localhost.evil.com", &allowed));
        assert!(!origin_matches("http://example.com", &allowed));
        assert!(!origin_matches("http://localhost:", &allowed));
        assert!(!origin_matches("http://localhost:80x", &allowed));
    }

    #[test]
    fn exact_patterns() {
        let allowed = patterns(&["https://game.example.com"]);

        assert!(origin_matches("https://game.example.com", &allowed));
        assert!(!origin_matches("https://game.example.com:8443", &allowed));
        assert!(!origin_matches("http://game.example.com", &allowed));
    }
}
