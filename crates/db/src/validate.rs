//! Generic table validation against the schema registry.
//!
//! Column checks compare the table's column set with the declared one.
//! Row checks scan every row and compare each value's storage class with
//! the declared column type; there is no sampling.

use futures::TryStreamExt;
use sqlx::{Row, SqliteConnection};

use crate::error::{SchemaError, StoreError};
use crate::schema::{Schema, TableDef};

/// Whether a table (or virtual table) named `name` exists, ignoring case.
pub async fn table_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND LOWER(name) = LOWER(?)",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

/// Column names in table order.
pub async fn table_columns(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
        .bind(name)
        .fetch_all(&mut *conn)
        .await
}

/// Validate one table: existence, then columns and row types when declared.
pub async fn validate_table(conn: &mut SqliteConnection, table: &TableDef) -> Result<(), StoreError> {
    if !table_exists(conn, table.name).await? {
        return Err(SchemaError::TableNotFound(table.name.to_string()).into());
    }
    let Some(columns) = table.columns else {
        return Ok(());
    };

    let actual = table_columns(conn, table.name).await?;
    let same_set = actual.len() == columns.len()
        && columns
            .iter()
            .all(|(name, _)| actual.iter().any(|a| a == name));
    if !same_set {
        return Err(SchemaError::ColumnMismatch {
            table: table.name.to_string(),
            expected: columns.iter().map(|(name, _)| name.to_string()).collect(),
            actual,
        }
        .into());
    }

    let types = columns
        .iter()
        .map(|(name, _)| format!("typeof({name})"))
        .collect::<Vec<_>>()
        .join(", ");
    let values = columns
        .iter()
        .map(|(name, _)| format!("quote({name})"))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!("SELECT {types}, {values} FROM {}", table.name);

    let mut rows = sqlx::query(&query).fetch(&mut *conn);
    while let Some(row) = rows.try_next().await? {
        let conforms = columns.iter().enumerate().try_fold(true, |ok, (i, (_, ty))| {
            row.try_get::<String, _>(i)
                .map(|actual| ok && actual == ty.sqlite_type())
        })?;
        if !conforms {
            let rendered = columns
                .iter()
                .enumerate()
                .map(|(i, (name, _))| {
                    let value: String = row
                        .try_get(columns.len() + i)
                        .unwrap_or_else(|_| "?".into());
                    format!("{name}: {value}")
                })
                .collect::<Vec<_>>()
                .join(", ");
            return Err(SchemaError::RowTypeMismatch {
                table: table.name.to_string(),
                expected: describe(table),
                row: format!("{{{rendered}}}"),
            }
            .into());
        }
    }
    Ok(())
}

/// Validate every table of a schema, stopping at the first failure.
pub async fn validate_schema(conn: &mut SqliteConnection, schema: &Schema) -> Result<(), StoreError> {
    for table in schema.tables {
        validate_table(conn, table).await?;
    }
    Ok(())
}

/// `{column: type, ...}` rendering of a table's declared columns.
pub fn describe(table: &TableDef) -> String {
    let Some(columns) = table.columns else {
        return "{}".into();
    };
    let body = columns
        .iter()
        .map(|(name, ty)| format!("{name}: {}", ty.sqlite_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}
