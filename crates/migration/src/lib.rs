pub use sea_orm_migration::prelude::*;

mod m20260801_000001_create_brand_tables;
mod m20260801_000002_create_supplier_tables;
mod m20260801_000003_create_certification_table;
mod m20260801_000004_create_alert_table;
mod m20260801_000005_create_document_table;
mod m20260801_000006_create_email_log_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_brand_tables::Migration),
            Box::new(m20260801_000002_create_supplier_tables::Migration),
            Box::new(m20260801_000003_create_certification_table::Migration),
            Box::new(m20260801_000004_create_alert_table::Migration),
            Box::new(m20260801_000005_create_document_table::Migration),
            Box::new(m20260801_000006_create_email_log_table::Migration),
        ]
    }
}
