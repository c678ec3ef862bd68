use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certification::Table)
                    .if_not_exists()
                    .col(pk_uuid(Certification::Id))
                    .col(uuid(Certification::SupplierId).not_null().to_owned())
                    .col(string(Certification::CertType).not_null().to_owned())
                    .col(string(Certification::Name).not_null().to_owned())
                    .col(string(Certification::IssuingBody).not_null().to_owned())
                    .col(string_null(Certification::CertificateNumber).to_owned())
                    .col(date_null(Certification::IssueDate).to_owned())
                    .col(date(Certification::ExpiryDate).not_null().to_owned())
                    .col(uuid_null(Certification::DocumentId).to_owned())
                    .col(
                        string(Certification::VerificationStatus)
                            .default("UNVERIFIED")
                            .not_null()
                            .to_owned(),
                    )
                    .col(string_null(Certification::VerificationMethod).to_owned())
                    .col(double_null(Certification::Confidence).to_owned())
                    .col(
                        boolean(Certification::NeedsReview)
                            .default(false)
                            .not_null()
                            .to_owned(),
                    )
                    .col(timestamp_with_time_zone_null(Certification::VerifiedAt).to_owned())
                    .col(
                        timestamp_with_time_zone(Certification::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certification_supplier")
                            .from(Certification::Table, Certification::SupplierId)
                            .to(Supplier::Table, Supplier::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        // Expiry sweeps scan by date range
        manager
            .create_index(
                Index::create()
                    .name("idx_certification_expiry_date")
                    .table(Certification::Table)
                    .col(Certification::ExpiryDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_certification_expiry_date")
                    .table(Certification::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Certification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Certification {
    Table,
    Id,
    SupplierId,
    CertType,
    Name,
    IssuingBody,
    CertificateNumber,
    IssueDate,
    ExpiryDate,
    DocumentId,
    VerificationStatus,
    VerificationMethod,
    Confidence,
    NeedsReview,
    VerifiedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Supplier {
    Table,
    Id,
}
