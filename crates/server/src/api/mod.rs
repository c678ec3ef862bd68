//! API module providing the HTTP endpoints for SupplyVault.
//!
//! This module is organized into submodules:
//! - `suppliers` - Supplier management (/api/suppliers/*)
//! - `certifications` - Certification CRUD + verification (/api/certifications/*)
//! - `alerts` - Expiry alert listing and acknowledgement (/api/alerts/*)
//! - `ingest` - Inbound attachment ingestion (/api/ingest/*)
//! - `auth` - Bearer API key authentication
//! - `health` - Health check endpoint (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration

pub mod alerts;
pub mod auth;
pub mod certifications;
pub mod health;
pub mod ingest;
pub mod openapi;
pub mod suppliers;

pub use auth::AuthedBrand;

use crate::AppResources;
use crate::entity::{connection, supplier};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};
use uuid::Uuid;

/// Suppliers a brand may act on: the ones it owns plus the independent ones
/// it is connected to.
pub(crate) async fn visible_supplier_ids(
    db: &DatabaseConnection,
    brand_id: Uuid,
) -> Result<Vec<Uuid>, DbErr> {
    let owned = supplier::Entity::find()
        .filter(supplier::Column::BrandId.eq(brand_id))
        .all(db)
        .await?;
    let connected = connection::Entity::find()
        .filter(connection::Column::BrandId.eq(brand_id))
        .all(db)
        .await?;
    let mut ids: Vec<Uuid> = owned.into_iter().map(|s| s.id).collect();
    for link in connected {
        if !ids.contains(&link.supplier_id) {
            ids.push(link.supplier_id);
        }
    }
    Ok(ids)
}

pub(crate) async fn supplier_visible(
    db: &DatabaseConnection,
    brand_id: Uuid,
    supplier_id: Uuid,
) -> Result<bool, DbErr> {
    Ok(visible_supplier_ids(db, brand_id).await?.contains(&supplier_id))
}

/// Build the full application router, OpenAPI document included.
pub fn build_router(app_resources: AppResources) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .nest("/api/suppliers", suppliers::router())
        .nest("/api/certifications", certifications::router())
        .nest("/api/alerts", alerts::router())
        .nest("/api/ingest", ingest::router())
        .routes(routes!(health::health))
        .layer(axum::Extension(app_resources))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .split_for_parts();

    router.merge(Redoc::with_url("/api-docs", api))
}

/// Starts the web server with all configured routes.
#[tracing::instrument(skip(app_resources))]
pub async fn start_webserver(app_resources: AppResources) -> color_eyre::Result<()> {
    let router = build_router(app_resources);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!(addr = "0.0.0.0:8080", "Server running");
    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
