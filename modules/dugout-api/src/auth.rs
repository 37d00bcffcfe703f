//! Bearer auth for the cron trigger endpoints. The scheduler platform sends
//! `Authorization: Bearer <CRON_SECRET>`; anything else is rejected.

use axum::http::{header, HeaderMap};

/// True when the Authorization header carries the expected cron secret.
pub fn authorize_cron(headers: &HeaderMap, secret: &str) -> bool {
    let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return false;
    };
    !secret.is_empty() && constant_time_eq(token.as_bytes(), secret.as_bytes())
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_matching_bearer_token() {
        assert!(authorize_cron(&headers_with("Bearer s3cret"), "s3cret"));
    }

    #[test]
    fn rejects_wrong_token() {
        assert!(!authorize_cron(&headers_with("Bearer nope"), "s3cret"));
    }

    #[test]
    fn rejects_missing_header_and_bad_scheme() {
        assert!(!authorize_cron(&HeaderMap::new(), "s3cret"));
        assert!(!authorize_cron(&headers_with("Basic s3cret"), "s3cret"));
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(!authorize_cron(&headers_with("Bearer "), ""));
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
