use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Supplier::Table)
                    .if_not_exists()
                    .col(pk_uuid(Supplier::Id))
                    // NULL brand_id marks an independent supplier with its own identity
                    .col(uuid_null(Supplier::BrandId).to_owned())
                    .col(string(Supplier::Name).not_null().to_owned())
                    .col(string_null(Supplier::ContactEmail).to_owned())
                    .col(string_null(Supplier::Country).to_owned())
                    .col(
                        timestamp_with_time_zone(Supplier::CreatedAt)
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
                    .table(Connection::Table)
                    .if_not_exists()
                    .col(pk_uuid(Connection::Id))
                    .col(uuid(Connection::BrandId).not_null().to_owned())
                    .col(uuid(Connection::SupplierId).not_null().to_owned())
                    .col(
                        timestamp_with_time_zone(Connection::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connection_supplier")
                            .from(Connection::Table, Connection::SupplierId)
                            .to(Supplier::Table, Supplier::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_connection_brand_supplier_unique")
                    .table(Connection::Table)
                    .col(Connection::BrandId)
                    .col(Connection::SupplierId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_connection_brand_supplier_unique")
                    .table(Connection::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Connection::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Supplier::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Supplier {
    Table,
    Id,
    BrandId,
    Name,
    ContactEmail,
    Country,
    CreatedAt,
}

#[derive(Iden)]
enum Connection {
    Table,
    Id,
    BrandId,
    SupplierId,
    CreatedAt,
}
