//! Authorization header parsing.

use axum::http::header;

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> axum::http::HeaderMap {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_simple() {
        assert_eq!(bearer_token(&headers_with("Bearer abc123")), Some("abc123"));
    }

    #[test]
    fn test_bearer_scheme_case_insensitive() {
        assert_eq!(bearer_token(&headers_with("bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers_with("BEARER abc123")), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_extra_spaces() {
        assert_eq!(
            bearer_token(&headers_with("Bearer   abc123  ")),
            Some("abc123")
        );
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        assert_eq!(bearer_token(&headers_with("Basic abc123")), None);
    }

    #[test]
    fn test_empty_token_rejected() {
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
    }

    #[test]
    fn test_no_header() {
        let headers = axum::http::HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
    }
}
