//! `/api/admin/outlets` - physical locations.
use axum::{extract::State, response::IntoResponse, Extension};

use super::crud::{self, ApiResult, Resource, ResourceMessages};
use super::extract::{RequestBody, ResourceId};
use crate::app::AppState;
use crate::auth::Identity;
use crate::database::Table;
use crate::validation::{DefaultValue, FieldKind, FieldSpec, ResourceSchema};

const OUTLET_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name", "Name", FieldKind::Text),
    FieldSpec::optional("address", "Address", FieldKind::Text),
    FieldSpec::optional("latitude", "Latitude", FieldKind::Number),
    FieldSpec::optional("longitude", "Longitude", FieldKind::Number),
    FieldSpec::optional("is_active", "is_active", FieldKind::Boolean).defaults_to(DefaultValue::Bool(true)),
];

pub const OUTLETS: Resource = Resource {
    table: Table::Outlets,
    schema: ResourceSchema::new(OUTLET_FIELDS),
    messages: ResourceMessages {
        id_required: "Outlet ID is required.",
        not_found: "Outlet not found.",
        update_not_found: "Outlet not found to update.",
        delete_not_found: "Outlet not found to delete or already deleted.",
        deleted: "Outlet deleted successfully.",
        conflict: "An outlet with these details already exists.",
    },
};

/// GET /api/admin/outlets
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    crud::list(state.store.as_ref(), &OUTLETS).await
}

/// POST /api/admin/outlets
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    RequestBody(body): RequestBody,
) -> ApiResult<impl IntoResponse> {
    crud::create(state.store.as_ref(), &OUTLETS, &identity, &body).await
}

/// GET /api/admin/outlets/:id
pub async fn show(State(state): State<AppState>, ResourceId(id): ResourceId) -> ApiResult<impl IntoResponse> {
    crud::get(state.store.as_ref(), &OUTLETS, &id).await
}

/// PUT /api/admin/outlets/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ResourceId(id): ResourceId,
    RequestBody(body): RequestBody,
) -> ApiResult<impl IntoResponse> {
    crud::update(state.store.as_ref(), &OUTLETS, &identity, &id, &body).await
}

/// DELETE /api/admin/outlets/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ResourceId(id): ResourceId,
) -> ApiResult<impl IntoResponse> {
    crud::delete(state.store.as_ref(), &OUTLETS, &identity, &id).await
}
