//! Supplier management API endpoints.
//!
//! - `/` - Create a supplier / list suppliers visible to the brand
//! - `/{id}/connect` - Idempotently link an independent supplier to the brand

use crate::AppResources;
use crate::api::auth::AuthedBrand;
use crate::entity::{connection, supplier};
use axum::{Extension, Json, extract::Path, response::IntoResponse};
use hyper::StatusCode;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Tag for OpenAPI documentation.
pub const SUPPLIERS_TAG: &str = "Suppliers API";

#[derive(Deserialize, ToSchema)]
struct CreateSupplier {
    name: String,
    #[serde(default)]
    contact_email: Option<String>,
    #[serde(default)]
    country: Option<String>,
    /// Independent suppliers keep their own identity; the creating brand is
    /// linked through a connection instead of owning the row.
    #[serde(default)]
    independent: bool,
}

/// Creates the suppliers API router.
#[tracing::instrument(skip_all)]
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_suppliers, create_supplier))
        .routes(routes!(connect_supplier))
}

#[tracing::instrument(skip(resources, payload), fields(brand_id = %authed.0.id))]
#[utoipa::path(
    post,
    path = "/",
    operation_id = "Create Supplier",
    tag = SUPPLIERS_TAG,
    summary = "Create a supplier",
    description = "Creates a supplier owned by the calling brand, or an independent supplier \
                   linked to the brand through a connection.",
    request_body(content = CreateSupplier, description = "Supplier details"),
    responses(
        (status = 201, description = "Supplier created", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn create_supplier(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<CreateSupplier>,
) -> impl IntoResponse {
    let now = OffsetDateTime::now_utc();
    let new_supplier = supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(if payload.independent {
            None
        } else {
            Some(authed.0.id)
        }),
        name: Set(payload.name),
        contact_email: Set(payload.contact_email),
        country: Set(payload.country),
        created_at: Set(now),
    };
    let created = match new_supplier.insert(resources.db.as_ref()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(
                name = "api.create_supplier.db_insert_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to insert new supplier"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };

    // Independent suppliers still need to be visible to their creator.
    if payload.independent {
        let link = connection::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(authed.0.id),
            supplier_id: Set(created.id),
            created_at: Set(now),
        };
        if let Err(e) = link.insert(resources.db.as_ref()).await {
            tracing::error!(
                name = "api.create_supplier.connection_insert_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                supplier_id = %created.id,
                message = "Failed to link independent supplier to creating brand"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    }

    (StatusCode::CREATED, Json(json!({ "supplier": created })))
}

#[tracing::instrument(skip(resources), fields(brand_id = %authed.0.id))]
#[utoipa::path(
    get,
    path = "/",
    operation_id = "List Suppliers",
    tag = SUPPLIERS_TAG,
    summary = "List suppliers visible to the brand",
    description = "Returns suppliers the brand owns plus independent suppliers it is connected to.",
    responses(
        (status = 200, description = "Supplier list", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn list_suppliers(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
) -> impl IntoResponse {
    let ids = match crate::api::visible_supplier_ids(resources.db.as_ref(), authed.0.id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(
                name = "api.list_suppliers.db_query_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to resolve visible suppliers"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };
    if ids.is_empty() {
        return (StatusCode::OK, Json(json!({ "suppliers": [] })));
    }
    match supplier::Entity::find()
        .filter(supplier::Column::Id.is_in(ids))
        .all(resources.db.as_ref())
        .await
    {
        Ok(list) => (StatusCode::OK, Json(json!({ "suppliers": list }))),
        Err(e) => {
            tracing::error!(
                name = "api.list_suppliers.db_query_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to query suppliers"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            )
        }
    }
}

#[tracing::instrument(skip(resources), fields(brand_id = %authed.0.id))]
#[utoipa::path(
    post,
    path = "/{id}/connect",
    operation_id = "Connect Supplier",
    tag = SUPPLIERS_TAG,
    summary = "Link an independent supplier to the brand",
    description = "Creates the (brand, supplier) connection if it does not exist. \
                   Repeating the call is a no-op.",
    params(
        ("id" = Uuid, Path, description = "Supplier to connect to"),
    ),
    responses(
        (status = 200, description = "Connected (or already connected)", content_type = "application/json"),
        (status = 404, description = "Supplier not found", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn connect_supplier(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let db = resources.db.as_ref();
    let found = match supplier::Entity::find_by_id(id).one(db).await {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };
    let Some(sup) = found else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Supplier not found"})),
        );
    };
    if sup.brand_id == Some(authed.0.id) {
        return (
            StatusCode::OK,
            Json(json!({ "status": "already connected" })),
        );
    }

    let existing = connection::Entity::find()
        .filter(connection::Column::BrandId.eq(authed.0.id))
        .filter(connection::Column::SupplierId.eq(id))
        .one(db)
        .await;
    match existing {
        Ok(Some(_)) => (
            StatusCode::OK,
            Json(json!({ "status": "already connected" })),
        ),
        Ok(None) => {
            let link = connection::ActiveModel {
                id: Set(Uuid::new_v4()),
                brand_id: Set(authed.0.id),
                supplier_id: Set(id),
                created_at: Set(OffsetDateTime::now_utc()),
            };
            match link.insert(db).await {
                Ok(created) => (StatusCode::OK, Json(json!({ "connection": created }))),
                Err(e) => {
                    tracing::error!(
                        name = "api.connect_supplier.db_insert_failed",
                        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                        error = ?e,
                        supplier_id = %id,
                        message = "Failed to insert connection"
                    );
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": format!("DB error: {e}")})),
                    )
                }
            }
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("DB error: {e}")})),
        ),
    }
}
