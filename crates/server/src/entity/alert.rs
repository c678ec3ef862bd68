use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Day-threshold bucket an expiry alert was created for.
#[derive(
    Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum AlertType {
    #[sea_orm(string_value = "NINETY_DAY")]
    NinetyDay,
    #[sea_orm(string_value = "THIRTY_DAY")]
    ThirtyDay,
    #[sea_orm(string_value = "SEVEN_DAY")]
    SevenDay,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
}

/// Expiry alert for a certification. Unique per (certification, alert_type).
/// `sent_at` is set once the notification email went out; NULL means the next
/// sweep retries the send.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "alert")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub certification_id: Uuid,
    pub alert_type: AlertType,
    pub is_read: bool,
    pub sent_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::certification::Entity",
        from = "Column::CertificationId",
        to = "super::certification::Column::Id"
    )]
    Certification,
}

impl Related<super::certification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
