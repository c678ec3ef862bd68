//! OpenAPI/Utoipa configuration.

use crate::api::{
    alerts::ALERTS_TAG, certifications::CERTIFICATIONS_TAG, health::MISC_TAG,
    ingest::INGEST_TAG, suppliers::SUPPLIERS_TAG,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    #[tracing::instrument(skip(self, openapi))]
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let bearer = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .description(Some(
                    "Per-brand API key. Only the key's SHA-256 hash is stored server-side.",
                ))
                .build();
            components.add_security_scheme("ApiKey", SecurityScheme::Http(bearer));
        }
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "SupplyVault API",
        version = "1.0.0",
        description = "API for tracking supplier certifications, expiry alerts and compliance status."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = SUPPLIERS_TAG, description = "Supplier management endpoints"),
        (name = CERTIFICATIONS_TAG, description = "Certification and verification endpoints"),
        (name = ALERTS_TAG, description = "Expiry alert endpoints"),
        (name = INGEST_TAG, description = "Attachment ingestion endpoints")
    )
)]
pub struct ApiDoc;
