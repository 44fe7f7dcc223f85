//! Store lifecycle: open, validate or initialize, repair, close.
//!
//! A [`Store`] owns one SQLite connection and the [`Schema`] of the stage
//! using it. Opening a new file (or opening with `reset`) drops and
//! recreates every declared table; opening an existing file validates each
//! declared table and, under [`RepairPolicy::RecreateMissing`], recreates
//! tables that are absent. Column and row mismatches always fail the open.

use std::path::{Path, PathBuf};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, Sqlite, SqliteConnection, Transaction};

use crate::error::{SchemaError, StoreError};
use crate::schema::{migrations, Schema, TableDef, SCHEMA_VERSION};
use crate::validate::{validate_schema, validate_table};
use crate::vector_index;

/// What to do when a declared table is missing from an existing file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepairPolicy {
    /// Recreate and reseed just the missing table.
    #[default]
    RecreateMissing,
    /// Fail the open with [`SchemaError::TableNotFound`].
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Drop and recreate every declared table.
    pub reset: bool,
    pub repair: RepairPolicy,
}

pub struct Store {
    conn: Option<SqliteConnection>,
    schema: &'static Schema,
    path: PathBuf,
}

impl Store {
    pub async fn open(
        path: impl AsRef<Path>,
        schema: &'static Schema,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let is_new = !path.exists();

        vector_index::register_extension();
        let mut conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true)
            .connect()
            .await?;

        if schema.has_vectors() {
            let version = vector_index::extension_version(&mut conn).await?;
            tracing::debug!(vec_version = %version, "Vector index available");
        }

        let mut tx = conn.begin().await?;
        let found: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&mut *tx)
            .await?;
        if found > SCHEMA_VERSION {
            return Err(SchemaError::VersionMismatch {
                found,
                supported: SCHEMA_VERSION,
            }
            .into());
        }
        for migration in migrations::pending(found) {
            tracing::info!(
                from = migration.from,
                description = migration.description,
                "Migrating schema"
            );
            for statement in migration.statements {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
        }

        if is_new || options.reset {
            initialize(&mut tx, schema).await?;
        } else {
            validate_or_repair(&mut tx, schema, options.repair).await?;
        }

        sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(
            path = %path.display(),
            schema = schema.name,
            created = is_new,
            reset = options.reset,
            "Store opened"
        );
        Ok(Self {
            conn: Some(conn),
            schema,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn conn(&mut self) -> Result<&mut SqliteConnection, StoreError> {
        self.conn.as_mut().ok_or(StoreError::Closed)
    }

    /// Start the transaction a pass runs in.
    pub async fn begin(&mut self) -> Result<Transaction<'_, Sqlite>, StoreError> {
        Ok(self.conn()?.begin().await?)
    }

    /// Validate every declared table.
    pub async fn validate(&mut self) -> Result<(), StoreError> {
        let schema = self.schema;
        validate_schema(self.conn()?, schema).await
    }

    /// Re-validate, then release the connection.
    ///
    /// Validation failures are logged, never returned. Closing an already
    /// closed store does nothing.
    pub async fn close(&mut self) -> Result<(), StoreError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        if let Err(e) = validate_schema(&mut conn, self.schema).await {
            tracing::warn!(schema = self.schema.name, error = %e, "Schema check on close failed");
        }
        conn.close().await?;
        tracing::debug!(path = %self.path.display(), "Store closed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

async fn create_table(conn: &mut SqliteConnection, table: &TableDef) -> Result<(), StoreError> {
    sqlx::query(&(table.create)()).execute(&mut *conn).await?;
    if let Some(seed) = table.seed {
        sqlx::query(&seed()).execute(&mut *conn).await?;
    }
    Ok(())
}

async fn drop_table(conn: &mut SqliteConnection, table: &TableDef) -> Result<(), StoreError> {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table.name))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Drop every declared table (children first), then recreate and seed.
async fn initialize(conn: &mut SqliteConnection, schema: &Schema) -> Result<(), StoreError> {
    for table in schema.tables.iter().rev() {
        drop_table(conn, table).await?;
    }
    for table in schema.tables {
        create_table(conn, table).await?;
    }
    tracing::debug!(schema = schema.name, tables = schema.tables.len(), "Tables initialized");
    Ok(())
}

async fn validate_or_repair(
    conn: &mut SqliteConnection,
    schema: &Schema,
    policy: RepairPolicy,
) -> Result<(), StoreError> {
    for table in schema.tables {
        match validate_table(conn, table).await {
            Ok(()) => {}
            Err(StoreError::Schema(SchemaError::TableNotFound(name)))
                if policy == RepairPolicy::RecreateMissing =>
            {
                tracing::warn!(table = %name, schema = schema.name, "Recreating missing table");
                create_table(conn, table).await?;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
