//! # API Errors
//!
//! Maps core errors onto HTTP responses with a uniform JSON envelope:
//!
//! ```json
//! { "success": false, "error": { "code": "NOT_FOUND", "message": "..." } }
//! ```

use super::types::{ErrorBody, ErrorDetail};
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cybershield_core::CyberShieldError;

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// A lifecycle, storage or validation failure from the core.
    Core(CyberShieldError),
    /// Missing or unknown caller identity.
    Unauthenticated(String),
    /// Missing or invalid API key.
    InvalidApiKey,
    RateLimited,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(e) => match e {
                CyberShieldError::Validation(_) => StatusCode::BAD_REQUEST,
                CyberShieldError::Authorization(_) => StatusCode::FORBIDDEN,
                CyberShieldError::NotFound(_) => StatusCode::NOT_FOUND,
                CyberShieldError::Conflict(_) => StatusCode::CONFLICT,
                CyberShieldError::Storage(_) | CyberShieldError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthenticated(_) | Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(e) => e.code(),
            Self::Unauthenticated(_) | Self::InvalidApiKey => "AUTHENTICATION_ERROR",
            Self::RateLimited => "RATE_LIMITED",
        }
    }

    fn message(&self) -> String {
        match self {
            // Internal details stay in the log.
            Self::Core(CyberShieldError::Storage(_) | CyberShieldError::Serialization(_)) => {
                "Internal server error".to_string()
            }
            Self::Core(e) => e.to_string(),
            Self::Unauthenticated(reason) => reason.clone(),
            Self::InvalidApiKey => "Unauthorized".to_string(),
            Self::RateLimited => "Too Many Requests".to_string(),
        }
    }
}

impl From<CyberShieldError> for ApiError {
    fn from(e: CyberShieldError) -> Self {
        Self::Core(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Core(CyberShieldError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Core(CyberShieldError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        if status.is_server_error() {
            tracing::error!(code, error = ?self, "Request failed");
        } else {
            tracing::warn!(code, status = status.as_u16(), "Request rejected: {}", self.message());
        }

        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.message(),
            },
        };
        (status, Json(body)).into_response()
    }
}
