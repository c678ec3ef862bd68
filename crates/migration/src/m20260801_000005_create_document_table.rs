use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Document::Table)
                    .if_not_exists()
                    .col(pk_uuid(Document::Id))
                    .col(uuid(Document::BrandId).not_null().to_owned())
                    .col(uuid_null(Document::SupplierId).to_owned())
                    .col(string(Document::Filename).not_null().to_owned())
                    .col(string(Document::ContentType).not_null().to_owned())
                    .col(string(Document::ContentHash).not_null().to_owned())
                    .col(string(Document::StorageKey).not_null().to_owned())
                    .col(big_integer(Document::SizeBytes).not_null().to_owned())
                    .col(string(Document::Source).not_null().to_owned())
                    .col(
                        timestamp_with_time_zone(Document::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_brand")
                            .from(Document::Table, Document::BrandId)
                            .to(Brand::Table, Brand::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        // Content fingerprint dedup per tenant
        manager
            .create_index(
                Index::create()
                    .name("idx_document_brand_hash_unique")
                    .table(Document::Table)
                    .col(Document::BrandId)
                    .col(Document::ContentHash)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_document_brand_hash_unique")
                    .table(Document::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Document::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Document {
    Table,
    Id,
    BrandId,
    SupplierId,
    Filename,
    ContentType,
    ContentHash,
    StorageKey,
    SizeBytes,
    Source,
    CreatedAt,
}

#[derive(Iden)]
enum Brand {
    Table,
    Id,
}
