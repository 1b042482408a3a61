//! # Authentication Module
//!
//! Two independent checks:
//!
//! - **API key**: if `[server] api_key` (or `CYBERSHIELD_API_KEY`) is set, every
//!   route except `/health` requires `Authorization: Bearer <key>`.
//! - **Caller identity**: handlers that act on behalf of a user take a
//!   [`Caller`], read from the `X-User-Id` header set by the upstream auth
//!   provider and resolved through the user directory.

use super::{AppState, error::ApiError};
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use cybershield_core::{CyberShieldError, Principal, UserId};
use subtle::ConstantTimeEq;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// Constant-time key comparison.
///
/// Both keys are padded to the same length so `ct_eq` always runs over the
/// same number of bytes.
pub fn api_key_matches(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

/// API key authentication middleware.
pub async fn api_key_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.api_key() else {
        return Ok(next.run(request).await);
    };

    // Always allow health endpoint (for load balancer checks)
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            // Support both "Bearer <key>" and raw "<key>" formats
            let provided = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
            if api_key_matches(provided, expected) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_api_key",
                    "Authentication failed: invalid API key"
                );
                Err(ApiError::InvalidApiKey)
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err(ApiError::InvalidApiKey)
        }
    }
}

// =============================================================================
// CALLER EXTRACTOR
// =============================================================================

/// The principal making the request.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        resolve_caller(&parts.headers, state).await.map(Self)
    }
}

/// Resolve the `X-User-Id` header to a principal.
///
/// A missing header or an unknown user is `Unauthenticated`.
pub async fn resolve_caller(headers: &HeaderMap, state: &AppState) -> Result<Principal, ApiError> {
    let id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated("Missing X-User-Id header".to_string()))?;

    let user_id = UserId::new(id);
    let service = state.service.read().await;
    match service.principal(&user_id) {
        Ok(principal) => Ok(principal),
        Err(CyberShieldError::NotFound(_)) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "unknown_user",
                user_id = %user_id,
                "Unknown caller"
            );
            Err(ApiError::Unauthenticated(format!("Unknown user: {}", user_id)))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
