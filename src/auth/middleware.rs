use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::Principal;
use super::helpers::{HeaderError, authorization, extract_bearer_token, require_key_id};
use crate::server::AppState;

/// Extractor that requires a valid bearer token and key id.
pub struct RequireAuth(pub Principal);

/// Extractor that requires an authenticated admin.
pub struct RequireAdmin(pub Principal);

/// Extractor that never rejects. Carries the principal when the request holds
/// a recognised bearer token.
pub struct OptionalAuth(pub Option<Principal>);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    NotAdmin,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "authorization token required"),
            AuthError::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "invalid token format, use: Bearer <token>",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid or expired token"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "admin access required"),
        };

        let body = json!({ "success": false, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"sintropia\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state)?;
        Ok(RequireAuth(principal))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state)?;

        if !principal.is_admin() {
            tracing::warn!(user_id = principal.user_id, "admin access denied");
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(principal))
    }
}

impl FromRequestParts<Arc<AppState>> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = extract_bearer_token(authorization(&parts.headers))
            .ok()
            .flatten()
            .and_then(|token| state.verifier.verify(token));
        Ok(OptionalAuth(principal))
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Principal, AuthError> {
    let token = extract_bearer_token(authorization(&parts.headers))
        .map_err(|_| AuthError::InvalidScheme)?
        .ok_or(AuthError::MissingAuth)?;

    require_key_id(&parts.headers).map_err(|e| match e {
        HeaderError::Missing => AuthError::MissingAuth,
        HeaderError::InvalidScheme => AuthError::InvalidScheme,
    })?;

    state.verifier.verify(token).ok_or_else(|| {
        tracing::debug!("rejected unknown bearer token");
        AuthError::InvalidToken
    })
}
