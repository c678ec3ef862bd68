//! Inbound attachment ingestion.
//!
//! Accepts batches of base64 attachments (forwarded from the inbound mailbox
//! webhook or a direct upload), fingerprints each by content hash, stores the
//! bytes under a deterministic hash-prefixed key, and records a document row.
//! Items are independent: one failure never aborts its siblings.

use crate::AppResources;
use crate::entity::document;
use crate::error::IngestError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// One attachment in an ingestion batch.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InboundAttachment {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content_base64: Option<String>,
}

/// Per-item result of a batch ingestion.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttachmentOutcome {
    pub filename: String,
    pub stored: bool,
    /// True when identical content already existed for this brand; the
    /// existing document is referenced instead of a new one.
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Hex SHA-256 fingerprint of the attachment bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write as _;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Deterministic storage key: two-character hash prefix, then the full hash.
pub fn storage_key(hash: &str) -> String {
    format!("{}/{}", &hash[..2], hash)
}

async fn ingest_one(
    resources: &AppResources,
    brand_id: Uuid,
    supplier_id: Option<Uuid>,
    source: &str,
    item: &InboundAttachment,
) -> Result<(document::Model, bool), IngestError> {
    let encoded = item
        .content_base64
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(IngestError::MissingContent)?;
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| IngestError::Decode(e.to_string()))?;

    let hash = content_hash(&bytes);
    let db = resources.db.as_ref();

    // Fingerprint dedup per brand
    if let Some(existing) = document::Entity::find()
        .filter(document::Column::BrandId.eq(brand_id))
        .filter(document::Column::ContentHash.eq(hash.clone()))
        .one(db)
        .await?
    {
        return Ok((existing, true));
    }

    let key = storage_key(&hash);
    resources.store.put(&key, &bytes).await?;

    let created = document::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(brand_id),
        supplier_id: Set(supplier_id),
        filename: Set(item.filename.clone()),
        content_type: Set(item
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string())),
        content_hash: Set(hash),
        storage_key: Set(key),
        size_bytes: Set(bytes.len() as i64),
        source: Set(source.to_string()),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(db)
    .await?;

    Ok((created, false))
}

/// Ingest a batch of attachments sequentially, reporting each item's outcome
/// independently.
#[tracing::instrument(skip(resources, items), fields(brand_id = %brand_id, batch_size = items.len()))]
pub async fn ingest_batch(
    resources: &AppResources,
    brand_id: Uuid,
    supplier_id: Option<Uuid>,
    source: &str,
    items: &[InboundAttachment],
) -> Vec<AttachmentOutcome> {
    let mut outcomes = Vec::with_capacity(items.len());
    for item in items {
        match ingest_one(resources, brand_id, supplier_id, source, item).await {
            Ok((doc, duplicate)) => {
                outcomes.push(AttachmentOutcome {
                    filename: item.filename.clone(),
                    stored: !duplicate,
                    duplicate,
                    document_id: Some(doc.id),
                    storage_key: Some(doc.storage_key),
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(
                    name = "ingest.attachment_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    filename = %item.filename,
                    message = "Attachment rejected during batch ingestion"
                );
                outcomes.push(AttachmentOutcome {
                    filename: item.filename.clone(),
                    stored: false,
                    duplicate: false,
                    document_id: None,
                    storage_key: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }
    outcomes
}
