//! Schema-validated SQLite store with a vector index.
//!
//! - [`schema`]: declarative table registry and per-stage schemas
//! - [`validate`]: generic column and row-type validation
//! - [`store`]: open/repair/close lifecycle
//! - [`vector_index`]: `sqlite-vec` registration and KNN queries
//! - [`repositories`]: zero-sized repository structs per table group

pub mod error;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod store;
pub mod validate;
pub mod vector_index;

pub use error::{SchemaError, StoreError};
pub use store::{RepairPolicy, Store, StoreOptions};

/// Verify the connection can execute a trivial query.
pub async fn health_check(conn: &mut sqlx::SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(conn).await?;
    Ok(())
}
