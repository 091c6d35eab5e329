use axum::http::{HeaderMap, header::AUTHORIZATION};

/// Client key identifier that must accompany every authenticated request.
pub const KEY_ID_HEADER: &str = "x-permapeople-key-id";

#[derive(Debug, PartialEq, Eq)]
pub enum HeaderError {
    Missing,
    InvalidScheme,
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
/// Returns `Ok(None)` when no header is present.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<&str>, HeaderError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(Some(token)),
        _ => Err(HeaderError::InvalidScheme),
    }
}

pub(super) fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
}

/// Requires the key-id header with a non-blank value.
pub(super) fn require_key_id(headers: &HeaderMap) -> Result<(), HeaderError> {
    headers
        .get(KEY_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(|_| ())
        .ok_or(HeaderError::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(None), Ok(None));
        assert_eq!(
            extract_bearer_token(Some("Bearer admin-token")),
            Ok(Some("admin-token"))
        );
        assert_eq!(
            extract_bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(HeaderError::InvalidScheme)
        );
        assert_eq!(
            extract_bearer_token(Some("Bearer")),
            Err(HeaderError::InvalidScheme)
        );
        assert_eq!(
            extract_bearer_token(Some("Bearer a b")),
            Err(HeaderError::InvalidScheme)
        );
        assert_eq!(
            extract_bearer_token(Some("bearer token")),
            Err(HeaderError::InvalidScheme)
        );
    }

    #[test]
    fn test_require_key_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(require_key_id(&headers), Err(HeaderError::Missing));

        headers.insert(KEY_ID_HEADER, "  ".parse().unwrap());
        assert_eq!(require_key_id(&headers), Err(HeaderError::Missing));

        headers.insert(KEY_ID_HEADER, "any".parse().unwrap());
        assert_eq!(require_key_id(&headers), Ok(()));
    }
}
