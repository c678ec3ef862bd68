use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use utoipa::ToSchema;

/// Verification state of a certification.
///
/// Transitions happen only through the verification router; callers never
/// write this column directly.
#[derive(
    Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    #[sea_orm(string_value = "UNVERIFIED")]
    Unverified,
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "VERIFIED")]
    Verified,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "BASIC")]
    Basic,
}

/// Strategy the verification router used for a certification.
#[derive(
    Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMethod {
    #[sea_orm(string_value = "MANUAL")]
    Manual,
    #[sea_orm(string_value = "API")]
    Api,
    #[sea_orm(string_value = "WEB_SCRAPING")]
    WebScraping,
    #[sea_orm(string_value = "LIST_MATCHING")]
    ListMatching,
}

/// A compliance document with validity dates requiring periodic
/// re-verification. Owned by a supplier.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "certification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub cert_type: String,
    pub name: String,
    pub issuing_body: String,
    pub certificate_number: Option<String>,
    pub issue_date: Option<Date>,
    pub expiry_date: Date,
    pub document_id: Option<Uuid>,
    pub verification_status: VerificationStatus,
    pub verification_method: Option<VerificationMethod>,
    pub confidence: Option<f64>,
    pub needs_review: bool,
    pub verified_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::alert::Entity")]
    Alert,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alert.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
