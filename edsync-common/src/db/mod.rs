//! Destination database: schema, models, patches and the upsert engine

pub mod columns;
pub mod init;
pub mod models;
pub mod patch;
pub mod schema;
pub mod store;

pub use init::{init_database, init_memory_database};
pub use models::UpsertOutcome;
pub use patch::{RowPatch, SqlValue};
pub use store::SyncStore;
