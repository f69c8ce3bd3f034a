//! Casting Service error types.
//!
//! Two disjoint families, both rendered with the same JSON body:
//!
//! ```json
//! { "success": false, "error": 403, "message": "Permission not found in JWT." }
//! ```
//!
//! - [`AuthError`] is raised only by the authorization gate. Its status and
//!   description are surfaced to the caller unchanged.
//! - [`ApiError`] covers request/resource failures. Messages returned to
//!   clients are fixed strings; internal details are logged server-side.

use crate::models::ValidationError;
use crate::repositories::StoreError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Uniform error body shared by both error families.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: u16,
    message: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = ErrorResponse {
        success: false,
        error: status.as_u16(),
        message,
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// Authorization errors
// ============================================================================

/// Machine-readable authorization failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// No `Authorization` header (or an empty one).
    MissingHeader,
    /// Header or token cannot be used (bad scheme, bad token, unknown key).
    InvalidHeader,
    /// Token `exp` has passed.
    TokenExpired,
    /// Audience/issuer mismatch, or no permissions claim.
    InvalidClaims,
    /// Required permission not granted.
    Unauthorized,
}

impl AuthErrorCode {
    /// Returns the wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::MissingHeader => "authorization_header_missing",
            AuthErrorCode::InvalidHeader => "invalid_header",
            AuthErrorCode::TokenExpired => "token_expired",
            AuthErrorCode::InvalidClaims => "invalid_claims",
            AuthErrorCode::Unauthorized => "unauthorized",
        }
    }
}

/// Authorization gate failure: `{code, description, status}`.
///
/// Status is always one of 400, 401 or 403. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {description}", code.as_str())]
pub struct AuthError {
    code: AuthErrorCode,
    description: &'static str,
    status: StatusCode,
}

impl AuthError {
    fn new(code: AuthErrorCode, description: &'static str, status: StatusCode) -> Self {
        Self {
            code,
            description,
            status,
        }
    }

    pub fn missing_header() -> Self {
        Self::new(
            AuthErrorCode::MissingHeader,
            "Authorization header is expected.",
            StatusCode::UNAUTHORIZED,
        )
    }

    pub fn bearer_scheme_required() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Authorization header must have a Bearer at the start.",
            StatusCode::UNAUTHORIZED,
        )
    }

    pub fn token_not_found() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Token not found in authorization header.",
            StatusCode::UNAUTHORIZED,
        )
    }

    pub fn too_many_header_parts() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Authorization header must just have a Bearer and a token.",
            StatusCode::UNAUTHORIZED,
        )
    }

    /// Token header carries no key id.
    pub fn malformed_authorization() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Authorization malformed.",
            StatusCode::UNAUTHORIZED,
        )
    }

    /// No usable key in the issuer's key set matches the token's key id.
    pub fn signing_key_not_found() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Unable to find the appropriate key.",
            StatusCode::BAD_REQUEST,
        )
    }

    /// The issuer's key set could not be fetched (network, timeout, bad body).
    pub fn signing_keys_unavailable() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Unable to fetch signing keys.",
            StatusCode::BAD_REQUEST,
        )
    }

    /// Catch-all for parse and signature failures.
    pub fn unparseable_token() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Unable to parse authentication token.",
            StatusCode::BAD_REQUEST,
        )
    }

    pub fn token_expired() -> Self {
        Self::new(
            AuthErrorCode::TokenExpired,
            "Token expired.",
            StatusCode::UNAUTHORIZED,
        )
    }

    /// Audience or issuer mismatch.
    pub fn incorrect_claims() -> Self {
        Self::new(
            AuthErrorCode::InvalidClaims,
            "Incorrect claims. Please, check the audience and issuer.",
            StatusCode::UNAUTHORIZED,
        )
    }

    pub fn permissions_missing() -> Self {
        Self::new(
            AuthErrorCode::InvalidClaims,
            "Permissions not included in JWT.",
            StatusCode::FORBIDDEN,
        )
    }

    pub fn permission_denied() -> Self {
        Self::new(
            AuthErrorCode::Unauthorized,
            "Permission not found in JWT.",
            StatusCode::FORBIDDEN,
        )
    }

    pub fn code(&self) -> AuthErrorCode {
        self.code
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut response = error_response(self.status, self.description.to_string());

        // RFC 6750 challenge for 401 responses
        if self.status == StatusCode::UNAUTHORIZED {
            let challenge = format!(
                "Bearer realm=\"casting-api\", error=\"{}\"",
                self.code.as_str()
            );
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}

// ============================================================================
// Request / resource errors
// ============================================================================

/// Request and resource error type.
///
/// Maps to HTTP status codes:
/// - BadRequest: 400
/// - NotFound: 404
/// - MethodNotAllowed: 405
/// - UnprocessableEntity: 422
/// - Database, Internal: 500
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Fixed per status.
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad request.",
            ApiError::NotFound => "Resource not found.",
            ApiError::MethodNotAllowed => "Method not allowed.",
            ApiError::UnprocessableEntity(_) => "Unprocessable entity.",
            ApiError::Database(_) | ApiError::Internal => "Internal server error.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::BadRequest(reason) => {
                tracing::debug!(target: "casting.errors", reason = %reason, "Bad request");
            }
            ApiError::UnprocessableEntity(reason) => {
                tracing::debug!(target: "casting.errors", reason = %reason, "Unprocessable entity");
            }
            ApiError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "casting.database", error = %err, "Database operation failed");
            }
            ApiError::NotFound | ApiError::MethodNotAllowed | ApiError::Internal => {}
        }

        error_response(self.status_code(), self.message().to_string())
    }
}

/// Convert store errors to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Database(err.to_string())
    }
}

/// Missing fields and malformed bodies are 400; bad values are 422.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NotAnObject | ValidationError::Missing(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ValidationError::Invalid(_) => ApiError::UnprocessableEntity(err.to_string()),
        }
    }
}
