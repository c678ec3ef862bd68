use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alert::Table)
                    .if_not_exists()
                    .col(pk_uuid(Alert::Id))
                    .col(uuid(Alert::CertificationId).not_null().to_owned())
                    .col(string(Alert::AlertType).not_null().to_owned())
                    .col(
                        boolean(Alert::IsRead)
                            .default(false)
                            .not_null()
                            .to_owned(),
                    )
                    .col(timestamp_with_time_zone_null(Alert::SentAt).to_owned())
                    .col(
                        timestamp_with_time_zone(Alert::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alert_certification")
                            .from(Alert::Table, Alert::CertificationId)
                            .to(Certification::Table, Certification::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        // One alert per certification per threshold bucket. Re-classification
        // must never duplicate a bucket.
        manager
            .create_index(
                Index::create()
                    .name("idx_alert_certification_type_unique")
                    .table(Alert::Table)
                    .col(Alert::CertificationId)
                    .col(Alert::AlertType)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_alert_certification_type_unique")
                    .table(Alert::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Alert::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Alert {
    Table,
    Id,
    CertificationId,
    AlertType,
    IsRead,
    SentAt,
    CreatedAt,
}

#[derive(Iden)]
enum Certification {
    Table,
    Id,
}
