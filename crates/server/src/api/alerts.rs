//! Expiry alert API endpoints.
//!
//! - `/` - List the brand's alerts (optionally unread only)
//! - `/{id}/read` - Mark an alert read (idempotent)

use crate::AppResources;
use crate::api::auth::AuthedBrand;
use crate::entity::{alert, certification};
use axum::{
    Extension, Json,
    extract::{Path, Query},
    response::IntoResponse,
};
use hyper::StatusCode;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Tag for OpenAPI documentation.
pub const ALERTS_TAG: &str = "Alerts API";

#[derive(Deserialize, IntoParams)]
struct ListAlertsParams {
    /// Restrict the list to unread alerts.
    #[serde(default)]
    unread: Option<bool>,
}

/// Creates the alerts API router.
#[tracing::instrument(skip_all)]
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_alerts))
        .routes(routes!(mark_alert_read))
}

/// Certification ids belonging to suppliers the brand can see.
async fn visible_certification_ids(
    resources: &AppResources,
    brand_id: Uuid,
) -> Result<Vec<Uuid>, sea_orm::DbErr> {
    let db = resources.db.as_ref();
    let supplier_ids = crate::api::visible_supplier_ids(db, brand_id).await?;
    if supplier_ids.is_empty() {
        return Ok(Vec::new());
    }
    let certs = certification::Entity::find()
        .filter(certification::Column::SupplierId.is_in(supplier_ids))
        .all(db)
        .await?;
    Ok(certs.into_iter().map(|c| c.id).collect())
}

#[tracing::instrument(skip(resources, params), fields(brand_id = %authed.0.id))]
#[utoipa::path(
    get,
    path = "/",
    operation_id = "List Alerts",
    tag = ALERTS_TAG,
    summary = "List expiry alerts for the brand",
    description = "Returns alerts for certifications held by suppliers visible to the brand, \
                   newest first. Pass `unread=true` to hide acknowledged alerts.",
    params(ListAlertsParams),
    responses(
        (status = 200, description = "Alert list", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn list_alerts(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
    Query(params): Query<ListAlertsParams>,
) -> impl IntoResponse {
    let cert_ids = match visible_certification_ids(&resources, authed.0.id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(
                name = "api.list_alerts.db_query_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to resolve visible certifications"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };
    if cert_ids.is_empty() {
        return (StatusCode::OK, Json(json!({ "alerts": [] })));
    }

    let mut query = alert::Entity::find().filter(alert::Column::CertificationId.is_in(cert_ids));
    if params.unread == Some(true) {
        query = query.filter(alert::Column::IsRead.eq(false));
    }
    match query.all(resources.db.as_ref()).await {
        Ok(list) => (StatusCode::OK, Json(json!({ "alerts": list }))),
        Err(e) => {
            tracing::error!(
                name = "api.list_alerts.db_query_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to query alerts"
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
    path = "/{id}/read",
    operation_id = "Mark Alert Read",
    tag = ALERTS_TAG,
    summary = "Acknowledge an alert",
    description = "Marks the alert as read. Repeating the call is a no-op.",
    params(
        ("id" = Uuid, Path, description = "Alert ID"),
    ),
    responses(
        (status = 200, description = "Alert marked read", content_type = "application/json"),
        (status = 404, description = "Alert not found or not visible", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn mark_alert_read(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let db = resources.db.as_ref();
    let found = match alert::Entity::find_by_id(id).one(db).await {
        Ok(a) => a,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };
    let Some(found) = found else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Alert not found"})),
        );
    };

    // Visibility check runs through the certification's supplier.
    let cert = match certification::Entity::find_by_id(found.certification_id)
        .one(db)
        .await
    {
        Ok(Some(c)) => c,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Alert not found"})),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };
    match crate::api::supplier_visible(db, authed.0.id, cert.supplier_id).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Alert not found"})),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    }

    if found.is_read {
        return (StatusCode::OK, Json(json!({ "status": "already read" })));
    }
    let mut model: alert::ActiveModel = found.into();
    model.is_read = Set(true);
    match model.update(db).await {
        Ok(updated) => (StatusCode::OK, Json(json!({ "alert": updated }))),
        Err(e) => {
            tracing::error!(
                name = "api.mark_alert_read.db_update_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                alert_id = %id,
                message = "Failed to mark alert read"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            )
        }
    }
}
