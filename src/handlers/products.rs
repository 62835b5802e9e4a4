//! `/api/admin/products` - the catalog of sellable items and their list price.
use axum::{extract::State, response::IntoResponse, Extension};

use super::crud::{self, ApiResult, Resource, ResourceMessages};
use super::extract::{RequestBody, ResourceId};
use crate::app::AppState;
use crate::auth::Identity;
use crate::database::Table;
use crate::validation::{FieldKind, FieldSpec, ResourceSchema};

const PRODUCT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name", "Name", FieldKind::Text),
    FieldSpec::required("price", "Price", FieldKind::NonNegativeNumber),
    FieldSpec::required("unit", "Unit", FieldKind::Text),
    FieldSpec::optional("description", "Description", FieldKind::Text),
    FieldSpec::optional("category", "Category", FieldKind::Text),
    FieldSpec::optional("image_url", "Image URL", FieldKind::Text),
];

pub const PRODUCTS: Resource = Resource {
    table: Table::Products,
    schema: ResourceSchema::new(PRODUCT_FIELDS),
    messages: ResourceMessages {
        id_required: "Product ID is required.",
        not_found: "Product not found.",
        update_not_found: "Product not found to update.",
        delete_not_found: "Product not found to delete or already deleted.",
        deleted: "Product deleted successfully.",
        conflict: "A product with these details already exists.",
    },
};

/// GET /api/admin/products
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    crud::list(state.store.as_ref(), &PRODUCTS).await
}

/// POST /api/admin/products
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    RequestBody(body): RequestBody,
) -> ApiResult<impl IntoResponse> {
    crud::create(state.store.as_ref(), &PRODUCTS, &identity, &body).await
}

/// GET /api/admin/products/:id
pub async fn show(State(state): State<AppState>, ResourceId(id): ResourceId) -> ApiResult<impl IntoResponse> {
    crud::get(state.store.as_ref(), &PRODUCTS, &id).await
}

/// PUT /api/admin/products/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ResourceId(id): ResourceId,
    RequestBody(body): RequestBody,
) -> ApiResult<impl IntoResponse> {
    crud::update(state.store.as_ref(), &PRODUCTS, &identity, &id, &body).await
}

/// DELETE /api/admin/products/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ResourceId(id): ResourceId,
) -> ApiResult<impl IntoResponse> {
    crud::delete(state.store.as_ref(), &PRODUCTS, &identity, &id).await
}
