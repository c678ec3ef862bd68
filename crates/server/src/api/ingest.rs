//! Inbound attachment ingestion endpoint.
//!
//! `/attachments` accepts a batch of base64 attachments, typically forwarded
//! by the inbound mailbox webhook. Every item is reported independently; a
//! rejected attachment never aborts its siblings.

use crate::AppResources;
use crate::api::auth::AuthedBrand;
use crate::ingest::{self, InboundAttachment};
use axum::{Extension, Json, response::IntoResponse};
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Tag for OpenAPI documentation.
pub const INGEST_TAG: &str = "Ingestion API";

#[derive(Deserialize, ToSchema)]
struct IngestBatch {
    /// Supplier the documents belong to, when known.
    #[serde(default)]
    supplier_id: Option<Uuid>,
    /// Where the batch came from, e.g. "inbound_email".
    #[serde(default)]
    source: Option<String>,
    attachments: Vec<InboundAttachment>,
}

/// Creates the ingestion API router.
#[tracing::instrument(skip_all)]
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(ingest_attachments))
}

#[tracing::instrument(skip(resources, payload), fields(brand_id = %authed.0.id, batch_size = payload.attachments.len()))]
#[utoipa::path(
    post,
    path = "/attachments",
    operation_id = "Ingest Attachments",
    tag = INGEST_TAG,
    summary = "Ingest a batch of base64 attachments",
    description = "Decodes, fingerprints and stores each attachment, creating a document row \
                   per unique content hash. Items are processed sequentially and reported \
                   independently: attachments without content fail on their own while valid \
                   siblings are still stored. Re-ingesting identical content dedups to the \
                   existing document.",
    request_body(content = IngestBatch, description = "Attachment batch"),
    responses(
        (status = 200, description = "Per-item outcomes", content_type = "application/json"),
        (status = 404, description = "Supplier not visible to this brand", content_type = "application/json"),
        (status = 401, description = "Missing or invalid API key", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn ingest_attachments(
    authed: AuthedBrand,
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<IngestBatch>,
) -> impl IntoResponse {
    if let Some(supplier_id) = payload.supplier_id {
        match crate::api::supplier_visible(resources.db.as_ref(), authed.0.id, supplier_id).await {
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
    }

    let source = payload.source.as_deref().unwrap_or("upload");
    let outcomes = ingest::ingest_batch(
        &resources,
        authed.0.id,
        payload.supplier_id,
        source,
        &payload.attachments,
    )
    .await;

    let stored = outcomes.iter().filter(|o| o.stored).count();
    let duplicates = outcomes.iter().filter(|o| o.duplicate).count();
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

    (
        StatusCode::OK,
        Json(json!({
            "results": outcomes,
            "stored": stored,
            "duplicates": duplicates,
            "failed": failed,
        })),
    )
}
