//! End-to-end tests for the HTTP API using an in-process test server.

use axum_test::TestServer;
use lettre::{AsyncSmtpTransport, Tokio1Executor};
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, EntityTrait};
use serde_json::{Value, json};
use std::sync::Arc;
use supplyvault::AppResources;
use supplyvault::api::auth::hash_token;
use supplyvault::api::build_router;
use supplyvault::config::{AlertConfig, AppConfig, SmtpConfig, StorageConfig, VerificationConfig};
use supplyvault::entity::{alert, api_key, brand, certification};
use supplyvault::storage::FsObjectStore;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

const BRAND_A_KEY: &str = "sv_test_brand_a";
const BRAND_B_KEY: &str = "sv_test_brand_b";

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
        verification: VerificationConfig {
            trusted_issuers: vec!["Fairtrade International".into()],
            ..VerificationConfig::default()
        },
        alerts: AlertConfig::default(),
    }
}

struct TestApp {
    server: TestServer,
    resources: AppResources,
    _dir: tempfile::TempDir,
}

async fn seed_brand(resources: &AppResources, name: &str, token: &str) -> brand::Model {
    let now = OffsetDateTime::now_utc();
    let created = brand::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        contact_email: Set(format!("compliance@{}.example", name.to_lowercase())),
        created_at: Set(now),
    }
    .insert(resources.db.as_ref())
    .await
    .unwrap();

    api_key::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(created.id),
        token_hash: Set(hash_token(token)),
        label: Set("test".into()),
        created_at: Set(now),
    }
    .insert(resources.db.as_ref())
    .await
    .unwrap();

    created
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let resources = AppResources {
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
    };

    seed_brand(&resources, "Acme", BRAND_A_KEY).await;
    seed_brand(&resources, "Borealis", BRAND_B_KEY).await;
    let server = TestServer::new(build_router(resources.clone())).unwrap();

    TestApp {
        server,
        resources,
        _dir: dir,
    }
}

async fn create_supplier(app: &TestApp, token: &str, name: &str, independent: bool) -> Uuid {
    let res = app
        .server
        .post("/api/suppliers")
        .authorization_bearer(token)
        .json(&json!({ "name": name, "country": "PT", "independent": independent }))
        .await;
    res.assert_status(hyper::StatusCode::CREATED);
    let body: Value = res.json();
    body["supplier"]["id"].as_str().unwrap().parse().unwrap()
}

async fn create_certification(app: &TestApp, token: &str, supplier_id: Uuid, days: i64) -> Value {
    let expiry = (OffsetDateTime::now_utc() + Duration::days(days)).date();
    let res = app
        .server
        .post("/api/certifications")
        .authorization_bearer(token)
        .json(&json!({
            "supplier_id": supplier_id,
            "cert_type": "FAIRTRADE",
            "name": "Fairtrade Cotton",
            "issuing_body": "Fairtrade International",
            "certificate_number": "FT-2026-01",
            "expiry_date": expiry.to_string(),
        }))
        .await;
    res.assert_status(hyper::StatusCode::CREATED);
    res.json()
}

#[tokio::test]
async fn healthz_requires_no_auth() {
    let app = spawn_app().await;
    let res = app.server.get("/healthz").await;
    res.assert_status_ok();
    res.assert_text("ok");
}

#[tokio::test]
async fn api_rejects_missing_and_unknown_tokens() {
    let app = spawn_app().await;

    let res = app.server.get("/api/suppliers").await;
    res.assert_status(hyper::StatusCode::UNAUTHORIZED);

    let res = app
        .server
        .get("/api/suppliers")
        .authorization_bearer("sv_test_not_a_key")
        .await;
    res.assert_status(hyper::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn suppliers_are_scoped_to_their_brand() {
    let app = spawn_app().await;
    create_supplier(&app, BRAND_A_KEY, "Mill One", false).await;

    let res = app
        .server
        .get("/api/suppliers")
        .authorization_bearer(BRAND_A_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["suppliers"].as_array().unwrap().len(), 1);

    // The other brand sees nothing.
    let res = app
        .server
        .get("/api/suppliers")
        .authorization_bearer(BRAND_B_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert!(body["suppliers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn connecting_a_supplier_is_idempotent() {
    let app = spawn_app().await;
    let supplier_id = create_supplier(&app, BRAND_A_KEY, "Shared Mill", true).await;

    let res = app
        .server
        .post(&format!("/api/suppliers/{supplier_id}/connect"))
        .authorization_bearer(BRAND_B_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert!(body.get("connection").is_some());

    let res = app
        .server
        .post(&format!("/api/suppliers/{supplier_id}/connect"))
        .authorization_bearer(BRAND_B_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["status"], "already connected");

    // Both brands now see the supplier.
    for token in [BRAND_A_KEY, BRAND_B_KEY] {
        let res = app
            .server
            .get("/api/suppliers")
            .authorization_bearer(token)
            .await;
        let body: Value = res.json();
        assert_eq!(body["suppliers"].as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn certification_creation_enforces_supplier_visibility() {
    let app = spawn_app().await;
    let supplier_id = create_supplier(&app, BRAND_A_KEY, "Mill One", false).await;

    let expiry = (OffsetDateTime::now_utc() + Duration::days(120)).date();
    let res = app
        .server
        .post("/api/certifications")
        .authorization_bearer(BRAND_B_KEY)
        .json(&json!({
            "supplier_id": supplier_id,
            "cert_type": "GOTS",
            "name": "GOTS",
            "issuing_body": "Control Union",
            "expiry_date": expiry.to_string(),
        }))
        .await;
    res.assert_status(hyper::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn new_certifications_start_unverified_with_computed_expiry_days() {
    let app = spawn_app().await;
    let supplier_id = create_supplier(&app, BRAND_A_KEY, "Mill One", false).await;
    let created = create_certification(&app, BRAND_A_KEY, supplier_id, 45).await;
    assert_eq!(created["certification"]["verification_status"], "UNVERIFIED");

    let res = app
        .server
        .get("/api/certifications")
        .authorization_bearer(BRAND_A_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    let items = body["certifications"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    let days = items[0]["days_until_expiry"].as_i64().unwrap();
    assert!((44..=45).contains(&days), "days={days}");
}

#[tokio::test]
async fn verify_endpoint_persists_the_outcome() {
    let app = spawn_app().await;
    let supplier_id = create_supplier(&app, BRAND_A_KEY, "Mill One", false).await;
    let created = create_certification(&app, BRAND_A_KEY, supplier_id, 120).await;
    let cert_id = created["certification"]["id"].as_str().unwrap();

    // FAIRTRADE routes to list matching; the issuer is on the trusted list.
    let res = app
        .server
        .post(&format!("/api/certifications/{cert_id}/verify"))
        .authorization_bearer(BRAND_A_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["outcome"]["status"], "VERIFIED");
    assert_eq!(body["outcome"]["method"], "LIST_MATCHING");
    assert_eq!(body["certification"]["verification_status"], "VERIFIED");
    assert!(!body["certification"]["verified_at"].is_null());

    let stored = certification::Entity::find_by_id(cert_id.parse::<Uuid>().unwrap())
        .one(app.resources.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.verification_status,
        certification::VerificationStatus::Verified
    );
    assert_eq!(stored.confidence, Some(0.6));
}

#[tokio::test]
async fn verify_endpoint_hides_foreign_certifications() {
    let app = spawn_app().await;
    let supplier_id = create_supplier(&app, BRAND_A_KEY, "Mill One", false).await;
    let created = create_certification(&app, BRAND_A_KEY, supplier_id, 120).await;
    let cert_id = created["certification"]["id"].as_str().unwrap();

    let res = app
        .server
        .post(&format!("/api/certifications/{cert_id}/verify"))
        .authorization_bearer(BRAND_B_KEY)
        .await;
    res.assert_status(hyper::StatusCode::NOT_FOUND);
}

async fn seed_alert(app: &TestApp, certification_id: Uuid) -> alert::Model {
    alert::ActiveModel {
        id: Set(Uuid::new_v4()),
        certification_id: Set(certification_id),
        alert_type: Set(alert::AlertType::ThirtyDay),
        is_read: Set(false),
        sent_at: Set(None),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(app.resources.db.as_ref())
    .await
    .unwrap()
}

#[tokio::test]
async fn alerts_can_be_listed_filtered_and_acknowledged() {
    let app = spawn_app().await;
    let supplier_id = create_supplier(&app, BRAND_A_KEY, "Mill One", false).await;
    let created = create_certification(&app, BRAND_A_KEY, supplier_id, 20).await;
    let cert_id: Uuid = created["certification"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let seeded = seed_alert(&app, cert_id).await;

    let res = app
        .server
        .get("/api/alerts")
        .add_query_param("unread", "true")
        .authorization_bearer(BRAND_A_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["alerts"].as_array().unwrap().len(), 1);

    let res = app
        .server
        .post(&format!("/api/alerts/{}/read", seeded.id))
        .authorization_bearer(BRAND_A_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["alert"]["is_read"], true);

    // Acknowledging twice is a no-op.
    let res = app
        .server
        .post(&format!("/api/alerts/{}/read", seeded.id))
        .authorization_bearer(BRAND_A_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["status"], "already read");

    // The unread filter now hides it.
    let res = app
        .server
        .get("/api/alerts")
        .add_query_param("unread", "true")
        .authorization_bearer(BRAND_A_KEY)
        .await;
    let body: Value = res.json();
    assert!(body["alerts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn alerts_of_other_brands_stay_hidden() {
    let app = spawn_app().await;
    let supplier_id = create_supplier(&app, BRAND_A_KEY, "Mill One", false).await;
    let created = create_certification(&app, BRAND_A_KEY, supplier_id, 20).await;
    let cert_id: Uuid = created["certification"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let seeded = seed_alert(&app, cert_id).await;

    let res = app
        .server
        .get("/api/alerts")
        .authorization_bearer(BRAND_B_KEY)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert!(body["alerts"].as_array().unwrap().is_empty());

    let res = app
        .server
        .post(&format!("/api/alerts/{}/read", seeded.id))
        .authorization_bearer(BRAND_B_KEY)
        .await;
    res.assert_status(hyper::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ingest_endpoint_reports_per_item_outcomes() {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;

    let app = spawn_app().await;
    let res = app
        .server
        .post("/api/ingest/attachments")
        .authorization_bearer(BRAND_A_KEY)
        .json(&json!({
            "source": "inbound_email",
            "attachments": [
                { "filename": "gots.pdf", "content_base64": BASE64.encode(b"gots certificate") },
                { "filename": "empty.pdf" },
            ],
        }))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["stored"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    // Unknown supplier ids are rejected up front.
    let res = app
        .server
        .post("/api/ingest/attachments")
        .authorization_bearer(BRAND_A_KEY)
        .json(&json!({
            "supplier_id": Uuid::new_v4(),
            "attachments": [],
        }))
        .await;
    res.assert_status(hyper::StatusCode::NOT_FOUND);
}
