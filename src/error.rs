// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::{StoreError, StoreErrorKind};
use crate::validation::ValidationError;

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON in request body.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred.";
pub const UNAUTHENTICATED_MESSAGE: &str = "Unauthorized: Valid session required.";
pub const FORBIDDEN_MESSAGE: &str = "Forbidden: Administrator access required.";
pub const LOOKUP_FAILED_MESSAGE: &str = "Failed to verify user role.";
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body is too large.";
pub const INVALID_PATH_ID_MESSAGE: &str = "Invalid ID in request path.";
pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Route not found.";

/// HTTP API error with its status code and client-facing message.
///
/// Every failure path in the admin API ends in one of these variants, and
/// every variant renders as `{ "error": "<message>" }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),
    MalformedBody,

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),
    ReferenceNotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    StoreFailure(String),
    LookupFailed,
    Unexpected,
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::ReferenceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::StoreFailure(_) | ApiError::LookupFailed | ApiError::Unexpected => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get client-facing error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::ReferenceNotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::StoreFailure(msg) => msg,
            ApiError::MalformedBody => INVALID_JSON_MESSAGE,
            ApiError::LookupFailed => LOOKUP_FAILED_MESSAGE,
            ApiError::Unexpected => UNEXPECTED_MESSAGE,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// Unclassified store failures pass the provider message through verbatim.
    pub fn store_failure(err: &StoreError) -> Self {
        ApiError::StoreFailure(err.message.clone())
    }
}

/// Resource-specific wording used when classifying store failures.
#[derive(Debug, Clone, Copy)]
pub struct StoreErrorContext<'a> {
    /// Message for a missing target row.
    pub not_found: &'a str,
    /// Message for a uniqueness violation.
    pub conflict: &'a str,
}

/// Foreign-key constraints the catalog declares and the entity each guards.
const REFERENCED_ENTITIES: &[(&str, &str)] = &[
    ("outlet_products_outlet_id_fkey", "Outlet not found."),
    ("outlet_products_product_id_fkey", "Product not found."),
];

impl ApiError {
    /// Maps a store outcome onto the API error taxonomy.
    pub fn from_store(err: &StoreError, context: StoreErrorContext<'_>) -> Self {
        match err.kind() {
            StoreErrorKind::NotFound => ApiError::not_found(context.not_found),
            StoreErrorKind::UniqueViolation => ApiError::conflict(context.conflict),
            StoreErrorKind::ForeignKeyViolation => REFERENCED_ENTITIES
                .iter()
                .find(|(constraint, _)| err.mentions_constraint(constraint))
                .map(|(_, message)| ApiError::ReferenceNotFound((*message).to_string()))
                .unwrap_or_else(|| ApiError::store_failure(err)),
            StoreErrorKind::Other => ApiError::store_failure(err),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
