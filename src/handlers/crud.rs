//! Shared list/get/create/update/delete flow for the catalog resources.
use axum::{body::Bytes, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::database::{Record, RecordStore, StoreError, StoreErrorKind, Table};
use crate::error::{ApiError, StoreErrorContext};
use crate::validation::{ResourceSchema, ValidationError};

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything the generic handlers need to know about one resource.
#[derive(Debug, Clone, Copy)]
pub struct Resource {
    pub table: Table,
    pub schema: ResourceSchema,
    pub messages: ResourceMessages,
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceMessages {
    pub id_required: &'static str,
    pub not_found: &'static str,
    pub update_not_found: &'static str,
    pub delete_not_found: &'static str,
    pub deleted: &'static str,
    pub conflict: &'static str,
}

impl Resource {
    fn context(&self, not_found: &'static str) -> StoreErrorContext<'static> {
        StoreErrorContext {
            not_found,
            conflict: self.messages.conflict,
        }
    }

    /// Maps a store failure for `operation`, logging anything unclassified.
    fn store_error(&self, operation: &str, not_found: &'static str, err: &StoreError) -> ApiError {
        match err.kind() {
            StoreErrorKind::Other => tracing::error!(
                resource = %self.table,
                operation,
                code = %err.code,
                "Store error: {}",
                err.message
            ),
            kind => tracing::debug!(resource = %self.table, operation, ?kind, "Store rejected request: {}", err.message),
        }
        ApiError::from_store(err, self.context(not_found))
    }

    fn require_id<'a>(&self, id: &'a str) -> ApiResult<&'a str> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::validation(self.messages.id_required));
        }
        Ok(id)
    }
}

/// Parses a request body, telling malformed JSON apart from an absent body.
pub fn parse_body(body: &Bytes) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::MissingBody.into());
    }
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        serde_json::error::Category::Io => {
            tracing::error!("Failed to read request body: {}", e);
            ApiError::Unexpected
        }
        _ => ApiError::MalformedBody,
    })
}

pub async fn list(store: &dyn RecordStore, resource: &Resource) -> ApiResult<Json<Vec<Record>>> {
    let rows = store
        .list(resource.table)
        .await
        .map_err(|e| resource.store_error("list", resource.messages.not_found, &e))?;
    Ok(Json(rows))
}

pub async fn get(store: &dyn RecordStore, resource: &Resource, id: &str) -> ApiResult<Json<Record>> {
    let id = resource.require_id(id)?;
    let row = store
        .get(resource.table, id)
        .await
        .map_err(|e| resource.store_error("get", resource.messages.not_found, &e))?;
    Ok(Json(row))
}

pub async fn create(
    store: &dyn RecordStore,
    resource: &Resource,
    identity: &Identity,
    body: &Bytes,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let payload = resource.schema.validate_create(&parse_body(body)?)?;
    let row = store
        .insert(resource.table, payload)
        .await
        .map_err(|e| resource.store_error("create", resource.messages.not_found, &e))?;

    let id = row.get("id").and_then(Value::as_str).unwrap_or_default();
    tracing::info!("Admin {} created {} {}", identity.id, resource.table, id);
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update(
    store: &dyn RecordStore,
    resource: &Resource,
    identity: &Identity,
    id: &str,
    body: &Bytes,
) -> ApiResult<Json<Record>> {
    let id = resource.require_id(id)?;
    let payload = resource.schema.validate_update(&parse_body(body)?)?;
    let row = store
        .update(resource.table, id, payload)
        .await
        .map_err(|e| resource.store_error("update", resource.messages.update_not_found, &e))?;

    tracing::info!("Admin {} updated {} {}", identity.id, resource.table, id);
    Ok(Json(row))
}

pub async fn delete(
    store: &dyn RecordStore,
    resource: &Resource,
    identity: &Identity,
    id: &str,
) -> ApiResult<Json<Value>> {
    let id = resource.require_id(id)?;
    let removed = store
        .delete(resource.table, id)
        .await
        .map_err(|e| resource.store_error("delete", resource.messages.delete_not_found, &e))?;

    if removed == 0 {
        return Err(ApiError::not_found(resource.messages.delete_not_found));
    }

    tracing::info!("Admin {} deleted {} {}", identity.id, resource.table, id);
    Ok(Json(json!({ "message": resource.messages.deleted })))
}
