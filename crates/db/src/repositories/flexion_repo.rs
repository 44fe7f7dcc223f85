//! Repository for `ThighFlexion` and `CrusFlexion`.

use sqlx::SqliteConnection;

use crate::models::flexion::{
    CrusFlexionInput, CrusFlexionRow, NewCrusFlexion, NewThighFlexion, ThighFlexionInput,
    ThighFlexionRow,
};

const THIGH_COLUMNS: &str = "frame_id, is_right, dot_body, angle_rad, dot_spine";

const CRUS_COLUMNS: &str = "frame_id, is_right, angle_rad, dot";

pub struct FlexionRepo;

impl FlexionRepo {
    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Frames and sides with torso, spine and thigh directions all present.
    pub async fn thigh_inputs(
        conn: &mut SqliteConnection,
    ) -> Result<Vec<ThighFlexionInput>, sqlx::Error> {
        sqlx::query_as::<_, ThighFlexionInput>(
            "SELECT th.frame_id, th.is_right,
                    t.x AS torso_x, t.y AS torso_y, t.z AS torso_z,
                    th.x AS thigh_x, th.y AS thigh_y, th.z AS thigh_z,
                    s.x AS spine_x, s.y AS spine_y, s.z AS spine_z
             FROM ThighDirection AS th
             JOIN TorsoDirection AS t ON t.frame_id = th.frame_id
             JOIN SpineDirection AS s ON s.frame_id = th.frame_id
             ORDER BY th.frame_id, th.is_right",
        )
        .fetch_all(&mut *conn)
        .await
    }

    /// Frames and sides with both thigh and crus directions present.
    pub async fn crus_inputs(
        conn: &mut SqliteConnection,
    ) -> Result<Vec<CrusFlexionInput>, sqlx::Error> {
        sqlx::query_as::<_, CrusFlexionInput>(
            "SELECT c.frame_id, c.is_right,
                    th.x AS thigh_x, th.y AS thigh_y, th.z AS thigh_z,
                    c.x AS crus_x, c.y AS crus_y, c.z AS crus_z
             FROM CrusDirection AS c
             JOIN ThighDirection AS th
               ON th.frame_id = c.frame_id AND th.is_right = c.is_right
             ORDER BY c.frame_id, c.is_right",
        )
        .fetch_all(&mut *conn)
        .await
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    pub async fn upsert_thigh(
        conn: &mut SqliteConnection,
        rows: &[NewThighFlexion],
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO ThighFlexion ({THIGH_COLUMNS}) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(frame_id, is_right) DO UPDATE SET
                dot_body = excluded.dot_body,
                angle_rad = excluded.angle_rad,
                dot_spine = excluded.dot_spine"
        );
        for row in rows {
            sqlx::query(&query)
                .bind(row.frame_id)
                .bind(row.side.is_right())
                .bind(row.flexion.dot_body)
                .bind(row.flexion.angle_rad)
                .bind(row.flexion.dot_spine)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn upsert_crus(
        conn: &mut SqliteConnection,
        rows: &[NewCrusFlexion],
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO CrusFlexion ({CRUS_COLUMNS}) VALUES (?, ?, ?, ?)
             ON CONFLICT(frame_id, is_right) DO UPDATE SET
                angle_rad = excluded.angle_rad,
                dot = excluded.dot"
        );
        for row in rows {
            sqlx::query(&query)
                .bind(row.frame_id)
                .bind(row.side.is_right())
                .bind(row.flexion.angle_rad)
                .bind(row.flexion.dot)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn list_thigh(
        conn: &mut SqliteConnection,
    ) -> Result<Vec<ThighFlexionRow>, sqlx::Error> {
        let query = format!("SELECT {THIGH_COLUMNS} FROM ThighFlexion ORDER BY frame_id, is_right");
        sqlx::query_as::<_, ThighFlexionRow>(&query)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn list_crus(conn: &mut SqliteConnection) -> Result<Vec<CrusFlexionRow>, sqlx::Error> {
        let query = format!("SELECT {CRUS_COLUMNS} FROM CrusFlexion ORDER BY frame_id, is_right");
        sqlx::query_as::<_, CrusFlexionRow>(&query)
            .fetch_all(&mut *conn)
            .await
    }
}
