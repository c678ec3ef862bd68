use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailLog::Table)
                    .if_not_exists()
                    .col(pk_uuid(EmailLog::Id))
                    .col(uuid_null(EmailLog::AlertId).to_owned())
                    .col(string(EmailLog::Recipient).not_null().to_owned())
                    .col(string(EmailLog::Subject).not_null().to_owned())
                    .col(string(EmailLog::EmailType).not_null().to_owned())
                    .col(
                        timestamp_with_time_zone(EmailLog::SentAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EmailLog {
    Table,
    Id,
    AlertId,
    Recipient,
    Subject,
    EmailType,
    SentAt,
}
