//! Approximate nearest-neighbour search over orientation vectors.
//!
//! Vectors live in `sqlite-vec` `vec0` virtual tables that mirror the
//! relational direction tables key for key. The extension is compiled in and
//! registered process-wide as an auto-extension, so every connection opened
//! afterwards can query it.

use std::sync::Once;

use poseaxis_core::codec;
use poseaxis_core::error::CoreError;
use poseaxis_core::types::{DbId, Side};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::StoreError;

static REGISTER: Once = Once::new();

/// Register the vector extension for all connections opened from now on.
pub fn register_extension() {
    REGISTER.call_once(|| {
        // SAFETY: `sqlite3_vec_init` has the extension entry-point signature
        // SQLite expects from an auto-extension.
        unsafe {
            libsqlite3_sys::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite_vec::sqlite3_vec_init as *const (),
            )));
        }
    });
}

/// Version of the loaded extension; fails if it is not available.
pub async fn extension_version(conn: &mut SqliteConnection) -> Result<String, StoreError> {
    sqlx::query_scalar("SELECT vec_version()")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| StoreError::VectorCapability(e.to_string()))
}

// ---------------------------------------------------------------------------
// Indexed columns
// ---------------------------------------------------------------------------

/// A `float[N]` column of a vector table and the relational table it mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorColumn {
    pub table: &'static str,
    /// Primary key column of the vector table.
    pub key: &'static str,
    pub column: &'static str,
    pub dimensions: usize,
    /// Relational table holding the direction rows.
    pub source: &'static str,
    /// Keys encode `(frame_id, side)` as `frame_id * 2 + is_right`.
    pub sided: bool,
}

pub const TORSO_DIR: VectorColumn = VectorColumn {
    table: "TorsoVec",
    key: "frame_id",
    column: "dir",
    dimensions: 3,
    source: "TorsoDirection",
    sided: false,
};

pub const TORSO_YAW: VectorColumn = VectorColumn {
    table: "TorsoVec",
    key: "frame_id",
    column: "yaw",
    dimensions: 2,
    source: "TorsoDirection",
    sided: false,
};

pub const SPINE_DIR: VectorColumn = VectorColumn {
    table: "SpineVec",
    key: "frame_id",
    column: "dir",
    dimensions: 3,
    source: "SpineDirection",
    sided: false,
};

pub const THIGH_DIR: VectorColumn = VectorColumn {
    table: "ThighVec",
    key: "segment_key",
    column: "dir",
    dimensions: 3,
    source: "ThighDirection",
    sided: true,
};

pub const CRUS_DIR: VectorColumn = VectorColumn {
    table: "CrusVec",
    key: "segment_key",
    column: "dir",
    dimensions: 3,
    source: "CrusDirection",
    sided: true,
};

/// Vector-table key of a sided segment row.
pub fn segment_key(frame_id: DbId, side: Side) -> DbId {
    frame_id * 2 + side.is_right()
}

/// Inverse of [`segment_key`].
pub fn split_segment_key(key: DbId) -> (DbId, Option<Side>) {
    (key.div_euclid(2), Side::from_is_right(key.rem_euclid(2)))
}

impl VectorColumn {
    /// Pack `query` for a `MATCH`, checking its dimensionality.
    pub fn encode_query(&self, query: &[f32]) -> Result<Vec<u8>, CoreError> {
        if query.len() != self.dimensions {
            return Err(CoreError::Validation(format!(
                "{}.{} holds {}-dimensional vectors, got {}",
                self.table,
                self.column,
                self.dimensions,
                query.len()
            )));
        }
        Ok(codec::encode(query))
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub key: DbId,
    pub distance: f64,
}

/// The `k` nearest rows to `query`, by ascending distance.
pub async fn knn(
    conn: &mut SqliteConnection,
    column: &VectorColumn,
    query: &[f32],
    k: u32,
) -> Result<Vec<Neighbor>, StoreError> {
    let blob = column.encode_query(query)?;
    let sql = format!(
        "SELECT {key}, distance FROM {table}
         WHERE {col} MATCH ? AND k = ?
         ORDER BY distance",
        key = column.key,
        table = column.table,
        col = column.column,
    );
    let rows: Vec<(DbId, f64)> = sqlx::query_as(&sql)
        .bind(blob)
        .bind(i64::from(k))
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(key, distance)| Neighbor { key, distance })
        .collect())
}

/// Stored vector for `key`, decoded.
pub async fn fetch_vector(
    conn: &mut SqliteConnection,
    column: &VectorColumn,
    key: DbId,
) -> Result<Option<Vec<f32>>, StoreError> {
    let sql = format!(
        "SELECT {col} FROM {table} WHERE {key} = ?",
        col = column.column,
        table = column.table,
        key = column.key,
    );
    let blob: Option<Vec<u8>> = sqlx::query_scalar(&sql)
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(blob.map(|b| codec::decode(&b)).transpose()?)
}
