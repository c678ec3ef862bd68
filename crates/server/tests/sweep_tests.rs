//! Tests for the recurring expiry sweep.
//!
//! The SMTP transport points at a closed port, so every delivery attempt
//! fails. That is the interesting case here: alerts must still be created and
//! must stay eligible for retry.

use lettre::{AsyncSmtpTransport, Tokio1Executor};
use migration::MigratorTrait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, Database, EntityTrait,
    QueryFilter,
};
use std::sync::Arc;
use supplyvault::AppResources;
use supplyvault::alerts::run_expiry_sweep;
use supplyvault::config::{AlertConfig, AppConfig, SmtpConfig, StorageConfig, VerificationConfig};
use supplyvault::entity::alert::{self, AlertType};
use supplyvault::entity::{brand, certification, connection, supplier};
use supplyvault::storage::FsObjectStore;
use time::macros::datetime;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

fn test_config(storage_root: &std::path::Path) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        smtp: SmtpConfig {
            server: "127.0.0.1".into(),
            port: 1,
            username: "test".into(),
            password: "test".into(),
            from: "SupplyVault <alerts@supplyvault.test>".into(),
        },
        frontend_url: "https://app.supplyvault.test".into(),
        storage: StorageConfig {
            root: storage_root.display().to_string(),
            public_base_url: "https://cdn.supplyvault.test/docs".into(),
        },
        verification: VerificationConfig::default(),
        alerts: AlertConfig::default(),
    }
}

async fn test_resources(dir: &tempfile::TempDir) -> Arc<AppResources> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Arc::new(AppResources {
        db: Arc::new(db),
        mailer: Arc::new(
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("127.0.0.1")
                .port(1)
                .build(),
        ),
        store: Arc::new(FsObjectStore::new(
            dir.path(),
            "https://cdn.supplyvault.test/docs",
        )),
        config: Arc::new(test_config(dir.path())),
    })
}

async fn seed_brand(resources: &AppResources) -> brand::Model {
    brand::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Acme Apparel".into()),
        contact_email: Set("compliance@acme.example".into()),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(resources.db.as_ref())
    .await
    .unwrap()
}

async fn seed_supplier(resources: &AppResources, brand_id: Option<Uuid>) -> supplier::Model {
    supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(brand_id),
        name: Set("Mill One".into()),
        contact_email: Set(None),
        country: Set(Some("PT".into())),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(resources.db.as_ref())
    .await
    .unwrap()
}

async fn seed_certification(
    resources: &AppResources,
    supplier_id: Uuid,
    expiry: Date,
) -> certification::Model {
    certification::ActiveModel {
        id: Set(Uuid::new_v4()),
        supplier_id: Set(supplier_id),
        cert_type: Set("GOTS".into()),
        name: Set("GOTS Organic Textile".into()),
        issuing_body: Set("Control Union".into()),
        certificate_number: Set(Some("CU-1001".into())),
        issue_date: Set(None),
        expiry_date: Set(expiry),
        document_id: Set(None),
        verification_status: Set(certification::VerificationStatus::Unverified),
        verification_method: Set(None),
        confidence: Set(None),
        needs_review: Set(false),
        verified_at: Set(None),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(resources.db.as_ref())
    .await
    .unwrap()
}

#[tokio::test]
async fn sweep_creates_alerts_only_inside_the_horizon() {
    let dir = tempfile::tempdir().unwrap();
    let resources = test_resources(&dir).await;
    let owner = seed_brand(&resources).await;
    let sup = seed_supplier(&resources, Some(owner.id)).await;

    let now = datetime!(2026-08-23 08:00 UTC);
    let near = seed_certification(&resources, sup.id, now.date() + Duration::days(10)).await;
    seed_certification(&resources, sup.id, now.date() + Duration::days(200)).await;

    let outcome = run_expiry_sweep(&resources, now).await.unwrap();
    assert_eq!(outcome.scanned, 1);
    assert_eq!(outcome.alerts_created, 1);

    let alerts = alert::Entity::find()
        .all(resources.db.as_ref())
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].certification_id, near.id);
    assert_eq!(alerts[0].alert_type, AlertType::ThirtyDay);
}

#[tokio::test]
async fn failed_delivery_keeps_the_alert_eligible_for_retry() {
    let dir = tempfile::tempdir().unwrap();
    let resources = test_resources(&dir).await;
    let owner = seed_brand(&resources).await;
    let sup = seed_supplier(&resources, Some(owner.id)).await;

    let now = datetime!(2026-08-23 08:00 UTC);
    seed_certification(&resources, sup.id, now.date() + Duration::days(3)).await;

    let first = run_expiry_sweep(&resources, now).await.unwrap();
    assert_eq!(first.alerts_created, 1);
    assert_eq!(first.emails_sent, 0, "closed SMTP port must fail the send");

    let pending = alert::Entity::find()
        .filter(alert::Column::SentAt.is_null())
        .all(resources.db.as_ref())
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);

    // The next sweep retries the delivery without duplicating the alert.
    let second = run_expiry_sweep(&resources, now + Duration::hours(6)).await.unwrap();
    assert_eq!(second.alerts_created, 0);
    assert_eq!(second.emails_sent, 0);
    let alerts = alert::Entity::find()
        .all(resources.db.as_ref())
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
}

#[tokio::test]
async fn unconnected_independent_supplier_still_gets_an_alert_row() {
    let dir = tempfile::tempdir().unwrap();
    let resources = test_resources(&dir).await;
    let sup = seed_supplier(&resources, None).await;

    let now = datetime!(2026-08-23 08:00 UTC);
    seed_certification(&resources, sup.id, now.date() - Duration::days(1)).await;

    let outcome = run_expiry_sweep(&resources, now).await.unwrap();
    assert_eq!(outcome.alerts_created, 1);
    assert_eq!(outcome.emails_sent, 0);

    let alerts = alert::Entity::find()
        .all(resources.db.as_ref())
        .await
        .unwrap();
    assert_eq!(alerts[0].alert_type, AlertType::Expired);
    assert!(alerts[0].sent_at.is_none());
}

#[tokio::test]
async fn recipient_lookup_errors_do_not_abort_the_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let resources = test_resources(&dir).await;
    let owner = seed_brand(&resources).await;
    let owned = seed_supplier(&resources, Some(owner.id)).await;
    let independent = seed_supplier(&resources, None).await;

    let now = datetime!(2026-08-23 08:00 UTC);
    seed_certification(&resources, owned.id, now.date() + Duration::days(5)).await;
    seed_certification(&resources, independent.id, now.date() + Duration::days(5)).await;

    let first = run_expiry_sweep(&resources, now).await.unwrap();
    assert_eq!(first.alerts_created, 2);

    // Break recipient resolution for the independent supplier. Its alert
    // must be skipped with a log, not abort delivery for the rest.
    resources
        .db
        .execute_unprepared("DROP TABLE connection")
        .await
        .unwrap();

    let second = run_expiry_sweep(&resources, now + Duration::hours(6))
        .await
        .unwrap();
    assert_eq!(second.alerts_created, 0);
    let alerts = alert::Entity::find()
        .all(resources.db.as_ref())
        .await
        .unwrap();
    assert_eq!(alerts.len(), 2);
}

#[tokio::test]
async fn connected_brands_are_resolved_as_recipients() {
    let dir = tempfile::tempdir().unwrap();
    let resources = test_resources(&dir).await;
    let watcher = seed_brand(&resources).await;
    let sup = seed_supplier(&resources, None).await;
    connection::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(watcher.id),
        supplier_id: Set(sup.id),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(resources.db.as_ref())
    .await
    .unwrap();

    let now = datetime!(2026-08-23 08:00 UTC);
    seed_certification(&resources, sup.id, now.date() + Duration::days(25)).await;

    // Delivery fails on the closed port, so sent_at must stay NULL even
    // though a recipient was found.
    let outcome = run_expiry_sweep(&resources, now).await.unwrap();
    assert_eq!(outcome.alerts_created, 1);
    assert_eq!(outcome.emails_sent, 0);
    let alerts = alert::Entity::find()
        .all(resources.db.as_ref())
        .await
        .unwrap();
    assert!(alerts[0].sent_at.is_none());
}
