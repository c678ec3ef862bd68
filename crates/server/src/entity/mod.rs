//! SeaORM entities for the SupplyVault schema.

pub mod alert;
pub mod api_key;
pub mod brand;
pub mod certification;
pub mod connection;
pub mod document;
pub mod email_log;
pub mod supplier;
