//! Brand authentication for the API.
//!
//! Every `/api/*` endpoint requires `Authorization: Bearer <api key>`. Keys
//! are opaque tokens; only their SHA-256 hash is stored, so a lookup hashes
//! the presented token and resolves the owning brand.

use crate::AppResources;
use crate::entity::{api_key, brand};
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use sha2::{Digest, Sha256};

/// The brand resolved from the request's API key.
#[derive(Debug, Clone)]
pub struct AuthedBrand(pub brand::Model);

/// Hex SHA-256 of an API token, as stored in `api_key.token_hash`.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write as _;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

fn unauthorized(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
}

impl<S> FromRequestParts<S> for AuthedBrand
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(resources) = parts.extensions.get::<AppResources>().cloned() else {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Application resources not attached" })),
            ));
        };

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthorized("Missing bearer token"))?;

        let key = api_key::Entity::find()
            .filter(api_key::Column::TokenHash.eq(hash_token(token)))
            .one(resources.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(
                    name = "api.auth.db_query_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = ?e,
                    message = "Failed to query API key"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Authentication lookup failed" })),
                )
            })?
            .ok_or_else(|| unauthorized("Unknown API key"))?;

        let owner = brand::Entity::find_by_id(key.brand_id)
            .one(resources.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(
                    name = "api.auth.db_query_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = ?e,
                    message = "Failed to query brand for API key"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Authentication lookup failed" })),
                )
            })?
            .ok_or_else(|| unauthorized("API key has no brand"))?;

        Ok(AuthedBrand(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_token_is_hex_sha256() {
        let hash = hash_token("sv_live_example");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_token("sv_live_example"));
        assert_ne!(hash, hash_token("sv_live_other"));
    }
}
