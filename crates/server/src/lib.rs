//! SupplyVault: multi-tenant supplier certification tracking.
//!
//! Brands register suppliers and their compliance certifications; the service
//! classifies expiry windows into alert buckets, dispatches notification
//! emails, routes certifications to a verification strategy, and ingests
//! inbound document attachments into object storage.

use std::sync::Arc;

use lettre::{AsyncSmtpTransport, Tokio1Executor};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::storage::ObjectStore;

pub mod alerts;
pub mod api;
pub mod config;
pub mod entity;
pub mod error;
pub mod ingest;
pub mod storage;
pub mod verification;

#[derive(Clone, Debug)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    pub store: Arc<dyn ObjectStore>,
    pub config: Arc<AppConfig>,
}
