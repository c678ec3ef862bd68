//! Notification email dispatch for expiry alerts.

use crate::config::AppConfig;
use crate::entity::alert::{self, AlertType};
use crate::entity::{certification, email_log};
use lettre::AsyncTransport;
use lettre::message::{MultiPart, SinglePart};
use sea_orm::{ActiveModelTrait, ActiveValue};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

fn window_text(alert_type: &AlertType) -> &'static str {
    match alert_type {
        AlertType::NinetyDay => "expires within 90 days",
        AlertType::ThirtyDay => "expires within 30 days",
        AlertType::SevenDay => "expires within 7 days",
        AlertType::Expired => "has expired",
    }
}

/// Send one expiry notification email and log it to `email_log`.
///
/// Returns `true` on successful delivery to the SMTP relay. Failures are
/// logged and swallowed; the caller leaves `sent_at` unset so the next sweep
/// retries.
#[tracing::instrument(skip(mailer, config, db, recipient, cert))]
pub async fn send_expiry_email(
    mailer: &Arc<lettre::AsyncSmtpTransport<lettre::Tokio1Executor>>,
    config: &Arc<AppConfig>,
    db: &Arc<sea_orm::DatabaseConnection>,
    recipient: &str,
    cert: &certification::Model,
    supplier_name: &str,
    alert: &alert::Model,
) -> bool {
    let window = window_text(&alert.alert_type);
    let subject = format!("Compliance alert: {} for {supplier_name} {window}", cert.name);
    let detail_url = format!(
        "{}/certifications/{}",
        config.frontend_url.trim_end_matches('/'),
        cert.id
    );

    let text_body = format!(
        r#"Hello,

The certification '{}' ({}) held by {supplier_name} {window}.

  Issuing body: {}
  Expiry date:  {}

Review the certification and request an updated document from the supplier:
{detail_url}

Best regards,
The SupplyVault Team"#,
        cert.name, cert.cert_type, cert.issuing_body, cert.expiry_date,
    );

    let html_body = format!(
        r#"<html><body>
<p>Hello,</p>
<p>The certification <strong>{}</strong> ({}) held by <strong>{supplier_name}</strong> {window}.</p>
<ul>
<li>Issuing body: {}</li>
<li>Expiry date: {}</li>
</ul>
<p><a href="{detail_url}">Review the certification</a> and request an updated document from the supplier.</p>
<p>Best regards,<br/>The SupplyVault Team</p>
</body></html>"#,
        cert.name, cert.cert_type, cert.issuing_body, cert.expiry_date,
    );

    let Ok(from) = config.smtp.from.parse() else {
        tracing::error!(
            name = "alerts.send_expiry_email.invalid_from_address",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            from = %config.smtp.from,
            message = "Configured smtp.from is not a valid mailbox"
        );
        return false;
    };
    let Ok(to) = recipient.parse() else {
        tracing::error!(
            name = "alerts.send_expiry_email.invalid_recipient",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            alert_id = %alert.id,
            message = "Alert recipient is not a valid mailbox"
        );
        return false;
    };

    let email_msg = match lettre::Message::builder()
        .from(from)
        .to(to)
        .subject(subject.clone())
        .header(lettre::message::header::MIME_VERSION_1_0)
        .message_id(None)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(lettre::message::header::ContentType::TEXT_PLAIN)
                        .body(text_body),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(lettre::message::header::ContentType::TEXT_HTML)
                        .body(html_body),
                ),
        ) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::error!(
                name = "alerts.send_expiry_email.build_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                alert_id = %alert.id,
                message = "Failed to build alert email"
            );
            return false;
        }
    };

    if let Err(e) = mailer.send(email_msg).await {
        tracing::error!(
            name = "alerts.send_expiry_email.send_failed",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            error = %e,
            alert_id = %alert.id,
            alert_type = ?alert.alert_type,
            message = "Failed to send expiry alert email"
        );
        return false;
    }

    tracing::info!(
        name = "alerts.send_expiry_email.sent",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        alert_id = %alert.id,
        alert_type = ?alert.alert_type,
        certification_id = %cert.id,
        message = "Sent expiry alert email"
    );

    let log_entry = email_log::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        alert_id: ActiveValue::Set(Some(alert.id)),
        recipient: ActiveValue::Set(recipient.to_string()),
        subject: ActiveValue::Set(subject),
        email_type: ActiveValue::Set("expiry_alert".to_string()),
        sent_at: ActiveValue::Set(OffsetDateTime::now_utc()),
    };
    if let Err(e) = log_entry.insert(db.as_ref()).await {
        tracing::error!(
            name = "alerts.send_expiry_email.log_insert_failed",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            error = %e,
            alert_id = %alert.id,
            message = "Failed to log alert email to database"
        );
    }

    true
}
