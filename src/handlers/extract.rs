//! Extractors whose rejections render through [`ApiError`], so a request the
//! framework cannot decode still gets the `{ "error": ... }` body.
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
};

use crate::error::{ApiError, BODY_TOO_LARGE_MESSAGE, INVALID_PATH_ID_MESSAGE};

/// Raw request body. JSON parsing happens later so an empty body and
/// malformed JSON can be told apart.
#[derive(Debug, Clone)]
pub struct RequestBody(pub Bytes);

#[async_trait]
impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Bytes::from_request(req, state).await {
            Ok(bytes) => Ok(RequestBody(bytes)),
            Err(rejection) => match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => Err(ApiError::validation(BODY_TOO_LARGE_MESSAGE)),
                status if status.is_client_error() => {
                    tracing::debug!("Rejected request body: {}", rejection.body_text());
                    Err(ApiError::MalformedBody)
                }
                _ => {
                    tracing::error!("Failed to read request body: {}", rejection.body_text());
                    Err(ApiError::Unexpected)
                }
            },
        }
    }
}

/// The `:id` segment of a resource route.
#[derive(Debug, Clone)]
pub struct ResourceId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(ResourceId(id)),
            Err(rejection) if rejection.status().is_client_error() => {
                tracing::debug!("Rejected path id: {}", rejection.body_text());
                Err(ApiError::validation(INVALID_PATH_ID_MESSAGE))
            }
            Err(rejection) => {
                tracing::error!("Path extraction failed: {}", rejection.body_text());
                Err(ApiError::Unexpected)
            }
        }
    }
}
