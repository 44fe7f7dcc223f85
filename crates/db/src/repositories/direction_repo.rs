//! Repository for segment direction tables and their vector mirrors.
//!
//! Every write touches the relational row and its vector row in the same
//! call, so both stay in lockstep within the caller's transaction.

use poseaxis_core::codec;
use poseaxis_core::direction::SegmentKind;
use poseaxis_core::error::CoreError;
use poseaxis_core::types::DbId;
use sqlx::SqliteConnection;

use crate::error::StoreError;
use crate::models::direction::{
    NewSideDirection, NewSpineDirection, NewTorsoDirection, SideDirectionRow, SpineDirectionRow,
    TorsoDirectionRow,
};
use crate::vector_index::{segment_key, VectorColumn, CRUS_DIR, THIGH_DIR};

const TORSO_COLUMNS: &str = "frame_id, x, y, z, method, score, yaw_x, yaw_z, pitch";

const SPINE_COLUMNS: &str = "frame_id, x, y, z, method";

const SIDE_COLUMNS: &str = "frame_id, is_right, x, y, z";

fn sided_column(kind: SegmentKind) -> Result<&'static VectorColumn, CoreError> {
    match kind {
        SegmentKind::Thigh => Ok(&THIGH_DIR),
        SegmentKind::Crus => Ok(&CRUS_DIR),
        other => Err(CoreError::Validation(format!(
            "{other:?} is not a sided segment"
        ))),
    }
}

pub struct DirectionRepo;

impl DirectionRepo {
    // -----------------------------------------------------------------------
    // Torso
    // -----------------------------------------------------------------------

    /// Replace every torso row and torso vector with `rows`.
    pub async fn replace_torso(
        conn: &mut SqliteConnection,
        rows: &[NewTorsoDirection],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM TorsoDirection")
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM TorsoVec").execute(&mut *conn).await?;

        let insert = format!(
            "INSERT INTO TorsoDirection ({TORSO_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        for row in rows {
            sqlx::query(&insert)
                .bind(row.frame_id)
                .bind(row.direction.x())
                .bind(row.direction.y())
                .bind(row.direction.z())
                .bind(row.tier.label())
                .bind(row.score)
                .bind(row.orientation.yaw[0])
                .bind(row.orientation.yaw[1])
                .bind(row.orientation.pitch)
                .execute(&mut *conn)
                .await?;
            sqlx::query("INSERT INTO TorsoVec (frame_id, dir, yaw) VALUES (?, ?, ?)")
                .bind(row.frame_id)
                .bind(codec::encode_f64(&row.direction.to_array()))
                .bind(codec::encode_f64(&row.orientation.yaw))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn list_torso(
        conn: &mut SqliteConnection,
    ) -> Result<Vec<TorsoDirectionRow>, sqlx::Error> {
        let query = format!("SELECT {TORSO_COLUMNS} FROM TorsoDirection ORDER BY frame_id");
        sqlx::query_as::<_, TorsoDirectionRow>(&query)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn find_torso(
        conn: &mut SqliteConnection,
        frame_id: DbId,
    ) -> Result<Option<TorsoDirectionRow>, sqlx::Error> {
        let query = format!("SELECT {TORSO_COLUMNS} FROM TorsoDirection WHERE frame_id = ?");
        sqlx::query_as::<_, TorsoDirectionRow>(&query)
            .bind(frame_id)
            .fetch_optional(&mut *conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Spine
    // -----------------------------------------------------------------------

    /// Replace every spine row and spine vector with `rows`.
    pub async fn replace_spine(
        conn: &mut SqliteConnection,
        rows: &[NewSpineDirection],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM SpineDirection")
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM SpineVec").execute(&mut *conn).await?;

        let insert = format!("INSERT INTO SpineDirection ({SPINE_COLUMNS}) VALUES (?, ?, ?, ?, ?)");
        for row in rows {
            sqlx::query(&insert)
                .bind(row.frame_id)
                .bind(row.direction.x())
                .bind(row.direction.y())
                .bind(row.direction.z())
                .bind(row.tier.label())
                .execute(&mut *conn)
                .await?;
            sqlx::query("INSERT INTO SpineVec (frame_id, dir) VALUES (?, ?)")
                .bind(row.frame_id)
                .bind(codec::encode_f64(&row.direction.to_array()))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn list_spine(
        conn: &mut SqliteConnection,
    ) -> Result<Vec<SpineDirectionRow>, sqlx::Error> {
        let query = format!("SELECT {SPINE_COLUMNS} FROM SpineDirection ORDER BY frame_id");
        sqlx::query_as::<_, SpineDirectionRow>(&query)
            .fetch_all(&mut *conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Thigh and crus
    // -----------------------------------------------------------------------

    /// Insert or overwrite sided rows keyed by `(frame_id, is_right)`.
    pub async fn upsert_sided(
        conn: &mut SqliteConnection,
        kind: SegmentKind,
        rows: &[NewSideDirection],
    ) -> Result<(), StoreError> {
        let column = sided_column(kind)?;
        let upsert = format!(
            "INSERT INTO {table} ({SIDE_COLUMNS}) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(frame_id, is_right) DO UPDATE SET
                x = excluded.x,
                y = excluded.y,
                z = excluded.z",
            table = column.source,
        );
        let delete_vec = format!(
            "DELETE FROM {} WHERE {} = ?",
            column.table, column.key
        );
        let insert_vec = format!(
            "INSERT INTO {} ({}, {}) VALUES (?, ?)",
            column.table, column.key, column.column
        );

        for row in rows {
            sqlx::query(&upsert)
                .bind(row.frame_id)
                .bind(row.side.is_right())
                .bind(row.direction.x())
                .bind(row.direction.y())
                .bind(row.direction.z())
                .execute(&mut *conn)
                .await?;

            // vec0 has no upsert
            let key = segment_key(row.frame_id, row.side);
            sqlx::query(&delete_vec)
                .bind(key)
                .execute(&mut *conn)
                .await?;
            sqlx::query(&insert_vec)
                .bind(key)
                .bind(codec::encode_f64(&row.direction.to_array()))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Drop vector rows whose relational row no longer exists.
    ///
    /// Relational rows cascade with their frame; vector rows do not.
    pub async fn purge_orphan_vectors(
        conn: &mut SqliteConnection,
        kind: SegmentKind,
    ) -> Result<u64, StoreError> {
        let column = sided_column(kind)?;
        let query = format!(
            "DELETE FROM {table} WHERE {key} NOT IN
                (SELECT frame_id * 2 + is_right FROM {source})",
            table = column.table,
            key = column.key,
            source = column.source,
        );
        let result = sqlx::query(&query).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    pub async fn list_sided(
        conn: &mut SqliteConnection,
        kind: SegmentKind,
    ) -> Result<Vec<SideDirectionRow>, StoreError> {
        let column = sided_column(kind)?;
        let query = format!(
            "SELECT {SIDE_COLUMNS} FROM {} ORDER BY frame_id, is_right",
            column.source
        );
        Ok(sqlx::query_as::<_, SideDirectionRow>(&query)
            .fetch_all(&mut *conn)
            .await?)
    }
}
