//! Background sweep over expiring certifications.
//!
//! Each pass classifies every certification inside the alerting horizon and
//! then delivers notification emails for alerts that have none sent yet
//! (including alerts whose earlier delivery attempt failed).

use crate::AppResources;
use crate::alerts::classifier::classify_certification;
use crate::alerts::email::send_expiry_email;
use crate::entity::{alert, brand, certification, connection, supplier};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::time::Duration;

/// Counters from one sweep pass, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub scanned: usize,
    pub alerts_created: usize,
    pub emails_sent: usize,
}

/// Contact addresses to notify for a supplier's certifications: the owning
/// brand if there is one, otherwise every connected brand.
async fn alert_recipients(
    db: &DatabaseConnection,
    sup: &supplier::Model,
) -> Result<Vec<String>, DbErr> {
    if let Some(brand_id) = sup.brand_id {
        let owner = brand::Entity::find_by_id(brand_id).one(db).await?;
        return Ok(owner.map(|b| b.contact_email).into_iter().collect());
    }
    let links = connection::Entity::find()
        .filter(connection::Column::SupplierId.eq(sup.id))
        .all(db)
        .await?;
    let mut recipients = Vec::new();
    for link in links {
        if let Some(b) = brand::Entity::find_by_id(link.brand_id).one(db).await? {
            recipients.push(b.contact_email);
        }
    }
    Ok(recipients)
}

/// Run one classification + notification pass.
pub async fn run_expiry_sweep(
    resources: &Arc<AppResources>,
    now: OffsetDateTime,
) -> Result<SweepOutcome, DbErr> {
    let db = resources.db.as_ref();
    let thresholds = &resources.config.alerts.thresholds;
    let max_threshold = thresholds.iter().copied().max().unwrap_or(90);
    let horizon = now.date() + time::Duration::days(max_threshold);

    let mut outcome = SweepOutcome::default();

    // 1. Classify everything inside the horizon (past expiries included).
    let certs = certification::Entity::find()
        .filter(certification::Column::ExpiryDate.lte(horizon))
        .all(db)
        .await?;
    outcome.scanned = certs.len();
    for cert in &certs {
        match classify_certification(db, cert, thresholds, now).await {
            Ok(Some(_)) => outcome.alerts_created += 1,
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    name = "alerts.sweep.classification_error",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = ?e,
                    certification_id = %cert.id,
                    message = "Classification failed for certification"
                );
            }
        }
    }

    // 2. Deliver emails for alerts without a successful send.
    let pending = alert::Entity::find()
        .filter(alert::Column::SentAt.is_null())
        .find_also_related(certification::Entity)
        .all(db)
        .await?;
    for (pending_alert, cert) in pending {
        let Some(cert) = cert else {
            continue;
        };
        let sup = match supplier::Entity::find_by_id(cert.supplier_id).one(db).await {
            Ok(Some(s)) => s,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(
                    name = "alerts.sweep.supplier_lookup_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = ?e,
                    alert_id = %pending_alert.id,
                    message = "Supplier lookup failed for pending alert"
                );
                continue;
            }
        };
        let recipients = match alert_recipients(db, &sup).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    name = "alerts.sweep.recipient_lookup_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = ?e,
                    alert_id = %pending_alert.id,
                    supplier_id = %sup.id,
                    message = "Recipient resolution failed for pending alert"
                );
                continue;
            }
        };
        if recipients.is_empty() {
            tracing::warn!(
                name = "alerts.sweep.no_recipients",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                alert_id = %pending_alert.id,
                supplier_id = %sup.id,
                message = "No brand contact to notify for alert"
            );
            continue;
        }

        let mut any_sent = false;
        for recipient in &recipients {
            if send_expiry_email(
                &resources.mailer,
                &resources.config,
                &resources.db,
                recipient,
                &cert,
                &sup.name,
                &pending_alert,
            )
            .await
            {
                any_sent = true;
                outcome.emails_sent += 1;
            }
        }

        if any_sent {
            let alert_id = pending_alert.id;
            let mut update: alert::ActiveModel = pending_alert.into();
            update.sent_at = ActiveValue::Set(Some(now));
            if let Err(e) = update.update(db).await {
                tracing::error!(
                    name = "alerts.sweep.sent_at_update_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = ?e,
                    alert_id = %alert_id,
                    message = "Failed to stamp sent_at; delivery will repeat next sweep"
                );
            }
        }
    }

    Ok(outcome)
}

/// Main loop for the recurring expiry sweep.
///
/// Runs indefinitely; sweep errors are logged and the loop continues with the
/// next tick.
#[tracing::instrument(skip_all)]
pub async fn expiry_scan_loop(resources: Arc<AppResources>) {
    let interval = Duration::from_secs(resources.config.alerts.scan_interval_secs);
    loop {
        match run_expiry_sweep(&resources, OffsetDateTime::now_utc()).await {
            Ok(outcome) => {
                tracing::info!(
                    name = "alerts.sweep.completed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    scanned = outcome.scanned,
                    alerts_created = outcome.alerts_created,
                    emails_sent = outcome.emails_sent,
                    message = "Expiry sweep completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    name = "alerts.sweep.error",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = ?e,
                    message = "Expiry sweep failed"
                );
            }
        }
        tokio::time::sleep(interval).await;
    }
}
