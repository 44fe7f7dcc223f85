//! Repository for the `Reliability` table.

use poseaxis_core::reliability::{Region, RegionReliability};
use poseaxis_core::types::DbId;
use sqlx::SqliteConnection;

use crate::models::reliability::ReliabilityRow;

const COLUMNS: &str = "frame_id, torso_half_min, face_detect";

pub struct ReliabilityRepo;

impl ReliabilityRepo {
    /// Frames with at least one landmark in every region.
    ///
    /// Only these frames are scored, which keeps the three region
    /// aggregates aligned frame for frame.
    fn scope() -> String {
        let having = Region::ALL
            .iter()
            .map(|r| format!("SUM(landmark_index IN ({})) > 0", r.index_list()))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!("SELECT frame_id FROM Landmark GROUP BY frame_id HAVING {having}")
    }

    /// `(frame_id, mean squared confidence)` over one region, ascending by frame.
    pub async fn region_aggregate(
        conn: &mut SqliteConnection,
        region: Region,
    ) -> Result<Vec<(DbId, f64)>, sqlx::Error> {
        let query = format!(
            "SELECT frame_id, AVG(confidence * confidence)
             FROM Landmark
             WHERE landmark_index IN ({indices}) AND frame_id IN ({scope})
             GROUP BY frame_id
             ORDER BY frame_id",
            indices = region.index_list(),
            scope = Self::scope(),
        );
        sqlx::query_as(&query).fetch_all(&mut *conn).await
    }

    /// Frames with landmarks that fall outside the scoring scope.
    pub async fn count_unscored(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(DISTINCT frame_id) FROM Landmark WHERE frame_id NOT IN ({})",
            Self::scope()
        );
        sqlx::query_scalar(&query).fetch_one(&mut *conn).await
    }

    /// Replace every reliability row with `scores`.
    pub async fn replace_all(
        conn: &mut SqliteConnection,
        scores: &[RegionReliability],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM Reliability")
            .execute(&mut *conn)
            .await?;
        let query = format!("INSERT INTO Reliability ({COLUMNS}) VALUES (?, ?, ?)");
        for score in scores {
            sqlx::query(&query)
                .bind(score.frame_id)
                .bind(score.torso_half_min)
                .bind(score.face_detect)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        frame_id: DbId,
    ) -> Result<Option<ReliabilityRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM Reliability WHERE frame_id = ?");
        sqlx::query_as::<_, ReliabilityRow>(&query)
            .bind(frame_id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<ReliabilityRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM Reliability ORDER BY frame_id");
        sqlx::query_as::<_, ReliabilityRow>(&query)
            .fetch_all(&mut *conn)
            .await
    }
}
