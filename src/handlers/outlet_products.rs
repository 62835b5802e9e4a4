//! `/api/admin/outlet-products` - per-outlet price, stock and availability
//! for a product.
//!
//! The (outlet_id, product_id) pair identifies a relation for its whole
//! life. Neither side can be changed by an update; callers delete the
//! relation and create a new one instead.
use axum::{extract::State, response::IntoResponse, Extension};

use super::crud::{self, ApiResult, Resource, ResourceMessages};
use super::extract::{RequestBody, ResourceId};
use crate::app::AppState;
use crate::auth::Identity;
use crate::database::Table;
use crate::validation::{DefaultValue, FieldKind, FieldSpec, ResourceSchema};

const OUTLET_PRODUCT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("outlet_id", "Outlet ID", FieldKind::Uuid).immutable(),
    FieldSpec::required("product_id", "Product ID", FieldKind::Uuid).immutable(),
    FieldSpec::optional("price", "Price", FieldKind::NonNegativeNumber),
    FieldSpec::optional("stock_status", "Stock status", FieldKind::Text),
    FieldSpec::optional("is_available", "is_available", FieldKind::Boolean)
        .defaults_to(DefaultValue::Bool(true)),
];

pub const OUTLET_PRODUCTS: Resource = Resource {
    table: Table::OutletProducts,
    schema: ResourceSchema::new(OUTLET_PRODUCT_FIELDS),
    messages: ResourceMessages {
        id_required: "Outlet-product relation ID is required.",
        not_found: "Outlet-product relation not found.",
        update_not_found: "Outlet-product relation not found to update.",
        delete_not_found: "Outlet-product relation not found to delete or already deleted.",
        deleted: "Outlet-product relation deleted successfully.",
        conflict: "This product is already associated with this outlet. Update the existing entry instead.",
    },
};

/// GET /api/admin/outlet-products
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    crud::list(state.store.as_ref(), &OUTLET_PRODUCTS).await
}

/// POST /api/admin/outlet-products
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    RequestBody(body): RequestBody,
) -> ApiResult<impl IntoResponse> {
    crud::create(state.store.as_ref(), &OUTLET_PRODUCTS, &identity, &body).await
}

/// GET /api/admin/outlet-products/:id
pub async fn show(State(state): State<AppState>, ResourceId(id): ResourceId) -> ApiResult<impl IntoResponse> {
    crud::get(state.store.as_ref(), &OUTLET_PRODUCTS, &id).await
}

/// PUT /api/admin/outlet-products/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ResourceId(id): ResourceId,
    RequestBody(body): RequestBody,
) -> ApiResult<impl IntoResponse> {
    crud::update(state.store.as_ref(), &OUTLET_PRODUCTS, &identity, &id, &body).await
}

/// DELETE /api/admin/outlet-products/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ResourceId(id): ResourceId,
) -> ApiResult<impl IntoResponse> {
    crud::delete(state.store.as_ref(), &OUTLET_PRODUCTS, &identity, &id).await
}
