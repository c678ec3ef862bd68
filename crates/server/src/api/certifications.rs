//! Certification API endpoints.
//!
//! - `/` - Create a certification / list the brand's certifications
//! - `/{id}` - Fetch one certification
//! - `/{id}/verify` - Run the verification router and persist its outcome
//!
//! `verification_status` is only ever written from the verify endpoint; it is
//! the single path through which the router's output reaches the database.

use crate::AppResources;
use crate::alerts::days_until_expiry;
use crate::api::auth::AuthedBrand;
use crate::entity::certification::{self, VerificationStatus};
use crate::entity::supplier;
use crate::verification::verify_certification;
use axum::{Extension, Json, extract::Path, response::IntoResponse};
use hyper::StatusCode;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use serde_json::json;
use time::{Date, OffsetDateTime};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Tag for OpenAPI documentation.
pub const CERTIFICATIONS_TAG: &str = "Certifications API";

#[derive(Deserialize, ToSchema)]
struct CreateCertification {
    supplier_id: Uuid,
    cert_type: String,
    name: String,
    issuing_body: String,
    #[serde(default)]
    certificate_number: Option<String>,
    #[serde(default)]
    issue_date: Option<Date>,
    expiry_date: Date,
    #[serde(default)]
    document_id: Option<Uuid>,
}

/// Creates the certifications API router.
#[tracing::instrument(skip_all)]
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_certifications, create_certification))
        .routes(routes!(get_certification))
        .routes(routes!(verify_certification_endpoint))
}

/// Load a certification together with its supplier, enforcing brand
/// visibility. `Ok(None)` means not found or not visible.
async fn load_visible(
    resources: &AppResources,
    brand_id: Uuid,
    cert_id: Uuid,
) -> Result<Option<(certification::Model, supplier::Model)>, sea_orm::DbErr> {
    let db = resources.db.as_ref();
    let Some(cert) = certification::Entity::find_by_id(cert_id).one(db).await? else {
        return Ok(None);
    };
    if !crate::api::supplier_visible(db, brand_id, cert.supplier_id).await? {
        return Ok(None);
    }
    let Some(sup) = supplier::Entity::find_by_id(cert.supplier_id).one(db).await? else {
        return Ok(None);
    };
    Ok(Some((cert, sup)))
}

#[tracing::instrument(skip(resources, payload), fields(brand_id = %authed.0.id, supplier_id = %payload.supplier_id))]
#[utoipa::path(
    post,
    path = "/",
    operation_id = "Create Certification",
    tag = CERTIFICATIONS_TAG,
    summary = "Register a certification for a supplier",
    description = "Creates a certification in UNVERIFIED state. The supplier must be owned by \
                   or connected to the calling brand. Verification happens separately through \
                   the verify endpoint.",
    request_body(content = CreateCertification, description = "Certification details"),
    responses(
        (status = 201, description = "Certification created", content_type = "application/json"),
        (status = 404, description = "Supplier not visible to this brand", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn create_certification(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<CreateCertification>,
) -> impl IntoResponse {
    let db = resources.db.as_ref();
    match crate::api::supplier_visible(db, authed.0.id, payload.supplier_id).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Supplier not found"})),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    }

    let new_cert = certification::ActiveModel {
        id: Set(Uuid::new_v4()),
        supplier_id: Set(payload.supplier_id),
        cert_type: Set(payload.cert_type),
        name: Set(payload.name),
        issuing_body: Set(payload.issuing_body),
        certificate_number: Set(payload.certificate_number),
        issue_date: Set(payload.issue_date),
        expiry_date: Set(payload.expiry_date),
        document_id: Set(payload.document_id),
        verification_status: Set(VerificationStatus::Unverified),
        verification_method: Set(None),
        confidence: Set(None),
        needs_review: Set(false),
        verified_at: Set(None),
        created_at: Set(OffsetDateTime::now_utc()),
    };
    match new_cert.insert(db).await {
        Ok(created) => (StatusCode::CREATED, Json(json!({ "certification": created }))),
        Err(e) => {
            tracing::error!(
                name = "api.create_certification.db_insert_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to insert new certification"
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
    get,
    path = "/",
    operation_id = "List Certifications",
    tag = CERTIFICATIONS_TAG,
    summary = "List certifications for the brand's suppliers",
    description = "Returns every certification held by a visible supplier, each with its \
                   computed days until expiry.",
    responses(
        (status = 200, description = "Certification list", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn list_certifications(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
) -> impl IntoResponse {
    let db = resources.db.as_ref();
    let supplier_ids = match crate::api::visible_supplier_ids(db, authed.0.id).await {
        Ok(ids) => ids,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };
    if supplier_ids.is_empty() {
        return (StatusCode::OK, Json(json!({ "certifications": [] })));
    }
    let certs = match certification::Entity::find()
        .filter(certification::Column::SupplierId.is_in(supplier_ids))
        .all(db)
        .await
    {
        Ok(list) => list,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };

    let now = OffsetDateTime::now_utc();
    let items: Vec<serde_json::Value> = certs
        .into_iter()
        .map(|c| {
            let days = days_until_expiry(c.expiry_date, now);
            json!({ "certification": c, "days_until_expiry": days })
        })
        .collect();
    (StatusCode::OK, Json(json!({ "certifications": items })))
}

#[tracing::instrument(skip(resources), fields(brand_id = %authed.0.id))]
#[utoipa::path(
    get,
    path = "/{id}",
    operation_id = "Get Certification",
    tag = CERTIFICATIONS_TAG,
    summary = "Fetch one certification",
    params(
        ("id" = Uuid, Path, description = "Certification ID"),
    ),
    responses(
        (status = 200, description = "Certification", content_type = "application/json"),
        (status = 404, description = "Not found or not visible", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn get_certification(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match load_visible(&resources, authed.0.id, id).await {
        Ok(Some((cert, sup))) => {
            let days = days_until_expiry(cert.expiry_date, OffsetDateTime::now_utc());
            (
                StatusCode::OK,
                Json(json!({
                    "certification": cert,
                    "supplier": sup,
                    "days_until_expiry": days,
                })),
            )
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Certification not found"})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("DB error: {e}")})),
        ),
    }
}

#[tracing::instrument(skip(resources), fields(brand_id = %authed.0.id))]
#[utoipa::path(
    post,
    path = "/{id}/verify",
    operation_id = "Verify Certification",
    tag = CERTIFICATIONS_TAG,
    summary = "Run verification for a certification",
    description = "Routes the certification to its verification strategy (constant lookup on \
                   the certification type), persists the resulting status, method, confidence \
                   and review flag, and returns the outcome. Strategy failures degrade to \
                   PENDING with needs_review set; the request still succeeds.",
    params(
        ("id" = Uuid, Path, description = "Certification ID"),
    ),
    responses(
        (status = 200, description = "Verification outcome", content_type = "application/json"),
        (status = 404, description = "Not found or not visible", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn verify_certification_endpoint(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (cert, sup) = match load_visible(&resources, authed.0.id, id).await {
        Ok(Some(pair)) => pair,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Certification not found"})),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };

    let outcome = verify_certification(&resources.config.verification, &cert, &sup.name).await;

    let now = OffsetDateTime::now_utc();
    let mut model: certification::ActiveModel = cert.clone().into();
    model.verification_status = Set(outcome.status.clone());
    model.verification_method = Set(Some(outcome.method.clone()));
    model.confidence = Set(Some(outcome.confidence));
    model.needs_review = Set(outcome.needs_review);
    if outcome.status == VerificationStatus::Verified {
        model.verified_at = Set(Some(now));
    }
    let updated = match model.update(resources.db.as_ref()).await {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(
                name = "api.verify_certification.db_update_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                certification_id = %id,
                message = "Failed to persist verification outcome"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            );
        }
    };

    (
        StatusCode::OK,
        Json(json!({ "outcome": outcome, "certification": updated })),
    )
}
