//! Alert classification: expiry date -> threshold bucket -> alert row.

use crate::entity::alert::{self, AlertType};
use crate::entity::certification;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Whole days until `expiry`, measured from the date of `now`.
///
/// Expiry dates are date-granular, so the ceiling of (expiry - now) in days
/// reduces to plain date subtraction: an expiry of today is 0, yesterday -1.
pub fn days_until_expiry(expiry: Date, now: OffsetDateTime) -> i64 {
    (expiry - now.date()).whole_days()
}

/// Map a day count to its alert bucket.
///
/// Negative days are EXPIRED. Otherwise the smallest configured threshold
/// that is `>=` the day count wins; beyond the largest threshold no alert is
/// due.
pub fn classify(days: i64, thresholds: &[i64]) -> Option<AlertType> {
    if days < 0 {
        return Some(AlertType::Expired);
    }
    let bucket = thresholds
        .iter()
        .copied()
        .filter(|&t| t >= days)
        .min()?;
    match bucket {
        7 => Some(AlertType::SevenDay),
        30 => Some(AlertType::ThirtyDay),
        90 => Some(AlertType::NinetyDay),
        // Config validation restricts thresholds to the known buckets.
        _ => None,
    }
}

/// Classify one certification and create its alert row if the bucket has not
/// been alerted yet.
///
/// Idempotent per (certification, bucket): re-running against an
/// already-alerted pair is a no-op, read or unread. Returns the newly created
/// alert, if any.
#[tracing::instrument(skip(db, cert), fields(certification_id = %cert.id))]
pub async fn classify_certification(
    db: &DatabaseConnection,
    cert: &certification::Model,
    thresholds: &[i64],
    now: OffsetDateTime,
) -> Result<Option<alert::Model>, DbErr> {
    let days = days_until_expiry(cert.expiry_date, now);
    let Some(bucket) = classify(days, thresholds) else {
        return Ok(None);
    };

    let existing = alert::Entity::find()
        .filter(alert::Column::CertificationId.eq(cert.id))
        .filter(alert::Column::AlertType.eq(bucket.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(None);
    }

    let created = alert::ActiveModel {
        id: Set(Uuid::new_v4()),
        certification_id: Set(cert.id),
        alert_type: Set(bucket.clone()),
        is_read: Set(false),
        sent_at: Set(None),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    tracing::info!(
        name = "alerts.classifier.created",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        message = "Created expiry alert",
        certification_id = %cert.id,
        alert_type = ?bucket,
        days_until_expiry = days,
    );

    Ok(Some(created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    const THRESHOLDS: &[i64] = &[90, 30, 7];

    #[test]
    fn past_dates_are_expired() {
        assert_eq!(classify(-1, THRESHOLDS), Some(AlertType::Expired));
        assert_eq!(classify(-400, THRESHOLDS), Some(AlertType::Expired));
    }

    #[test]
    fn expiring_today_is_seven_day_not_expired() {
        assert_eq!(classify(0, THRESHOLDS), Some(AlertType::SevenDay));
    }

    #[test]
    fn threshold_boundaries_map_to_their_bucket() {
        assert_eq!(classify(7, THRESHOLDS), Some(AlertType::SevenDay));
        assert_eq!(classify(8, THRESHOLDS), Some(AlertType::ThirtyDay));
        assert_eq!(classify(30, THRESHOLDS), Some(AlertType::ThirtyDay));
        assert_eq!(classify(31, THRESHOLDS), Some(AlertType::NinetyDay));
        assert_eq!(classify(90, THRESHOLDS), Some(AlertType::NinetyDay));
    }

    #[test]
    fn beyond_largest_threshold_is_no_alert() {
        assert_eq!(classify(91, THRESHOLDS), None);
        assert_eq!(classify(365, THRESHOLDS), None);
    }

    #[test]
    fn smallest_matching_threshold_wins() {
        // With only the 90-day threshold configured, near expiries still
        // land in the ninety-day bucket.
        assert_eq!(classify(3, &[90]), Some(AlertType::NinetyDay));
        assert_eq!(classify(3, &[90, 7]), Some(AlertType::SevenDay));
    }

    #[test]
    fn days_until_expiry_uses_date_granularity() {
        let now = datetime!(2026-08-23 15:30 UTC);
        assert_eq!(days_until_expiry(date!(2026 - 08 - 23), now), 0);
        assert_eq!(days_until_expiry(date!(2026 - 08 - 24), now), 1);
        assert_eq!(days_until_expiry(date!(2026 - 08 - 22), now), -1);
        assert_eq!(days_until_expiry(date!(2026 - 11 - 21), now), 90);
    }
}
