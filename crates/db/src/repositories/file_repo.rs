//! Repository for the `File` table.

use poseaxis_core::types::DbId;
use sqlx::SqliteConnection;

use crate::models::file::{CreateSourceFile, SourceFile};
use crate::validate::table_exists;
use crate::vector_index::{CRUS_DIR, SPINE_DIR, THIGH_DIR, TORSO_DIR};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, path, size, timestamp, hash";

/// Provides lookups and registration for source files.
pub struct FileRepo;

impl FileRepo {
    /// Insert a new source file, returning the created row.
    pub async fn create(
        conn: &mut SqliteConnection,
        input: &CreateSourceFile,
    ) -> Result<SourceFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO File (path, size, timestamp, hash)
             VALUES (?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SourceFile>(&query)
            .bind(&input.path)
            .bind(input.size)
            .bind(input.timestamp)
            .bind(&input.hash)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_by_path(
        conn: &mut SqliteConnection,
        path: &str,
    ) -> Result<Option<SourceFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM File WHERE path = ?");
        sqlx::query_as::<_, SourceFile>(&query)
            .bind(path)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn find_by_hash(
        conn: &mut SqliteConnection,
        hash: &[u8],
    ) -> Result<Option<SourceFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM File WHERE hash = ?");
        sqlx::query_as::<_, SourceFile>(&query)
            .bind(hash)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List all source files ordered by path.
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<SourceFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM File ORDER BY path");
        sqlx::query_as::<_, SourceFile>(&query)
            .fetch_all(&mut *conn)
            .await
    }

    /// Point a moved file at its new path, refreshing size and timestamp.
    pub async fn update_location(
        conn: &mut SqliteConnection,
        id: DbId,
        path: &str,
        size: i64,
        timestamp: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE File SET path = ?, size = ?, timestamp = ? WHERE id = ?")
            .bind(path)
            .bind(size)
            .bind(timestamp)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a file and everything derived from its frames.
    ///
    /// Relational rows go through `ON DELETE CASCADE`; vector rows are
    /// removed first since virtual tables cannot reference `Frame`.
    /// Returns `true` if a row was removed.
    pub async fn delete(conn: &mut SqliteConnection, id: DbId) -> Result<bool, sqlx::Error> {
        for column in [&TORSO_DIR, &SPINE_DIR, &THIGH_DIR, &CRUS_DIR] {
            if !table_exists(conn, column.table).await? {
                continue;
            }
            let frame_of = if column.sided {
                format!("{} / 2", column.key)
            } else {
                column.key.to_string()
            };
            let query = format!(
                "DELETE FROM {table} WHERE {frame_of} IN (SELECT id FROM Frame WHERE file_id = ?)",
                table = column.table,
            );
            sqlx::query(&query).bind(id).execute(&mut *conn).await?;
        }

        let result = sqlx::query("DELETE FROM File WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
