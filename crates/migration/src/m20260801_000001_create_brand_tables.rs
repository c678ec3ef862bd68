use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Brand::Table)
                    .if_not_exists()
                    .col(pk_uuid(Brand::Id))
                    .col(string(Brand::Name).not_null().to_owned())
                    .col(string(Brand::ContactEmail).not_null().to_owned())
                    .col(
                        timestamp_with_time_zone(Brand::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(ApiKey::Table)
                    .if_not_exists()
                    .col(pk_uuid(ApiKey::Id))
                    .col(uuid(ApiKey::BrandId).not_null().to_owned())
                    .col(
                        string(ApiKey::TokenHash)
                            .not_null()
                            .unique_key()
                            .to_owned(),
                    )
                    .col(string(ApiKey::Label).not_null().to_owned())
                    .col(
                        timestamp_with_time_zone(ApiKey::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_api_key_brand")
                            .from(ApiKey::Table, ApiKey::BrandId)
                            .to(Brand::Table, Brand::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiKey::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Brand::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Brand {
    Table,
    Id,
    Name,
    ContactEmail,
    CreatedAt,
}

#[derive(Iden)]
enum ApiKey {
    Table,
    Id,
    BrandId,
    TokenHash,
    Label,
    CreatedAt,
}
