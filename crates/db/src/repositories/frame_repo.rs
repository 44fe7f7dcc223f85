//! Repository for `Frame`, `Landmark` and `FrameRect`.

use poseaxis_core::landmark::{Keypoint, LandmarkSample};
use poseaxis_core::rect::FrameRect;
use poseaxis_core::types::DbId;
use sqlx::SqliteConnection;

use crate::models::frame::{Frame, FrameRectRow, LandmarkRow};

const FRAME_COLUMNS: &str = "id, file_id, person_index";

const LANDMARK_COLUMNS: &str =
    "frame_id, landmark_index, presence, confidence, x, y, z, image_x, image_y";

const RECT_COLUMNS: &str = "frame_id, x_min, x_max, y_min, y_max";

/// Provides frame, landmark and bounding-box persistence.
pub struct FrameRepo;

impl FrameRepo {
    // -----------------------------------------------------------------------
    // Frames
    // -----------------------------------------------------------------------

    pub async fn create(
        conn: &mut SqliteConnection,
        file_id: DbId,
        person_index: i64,
    ) -> Result<Frame, sqlx::Error> {
        let query = format!(
            "INSERT INTO Frame (file_id, person_index) VALUES (?, ?) RETURNING {FRAME_COLUMNS}"
        );
        sqlx::query_as::<_, Frame>(&query)
            .bind(file_id)
            .bind(person_index)
            .fetch_one(&mut *conn)
            .await
    }

    /// All frame ids, ascending.
    pub async fn list_ids(conn: &mut SqliteConnection) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM Frame ORDER BY id")
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn list_by_file(
        conn: &mut SqliteConnection,
        file_id: DbId,
    ) -> Result<Vec<Frame>, sqlx::Error> {
        let query =
            format!("SELECT {FRAME_COLUMNS} FROM Frame WHERE file_id = ? ORDER BY person_index");
        sqlx::query_as::<_, Frame>(&query)
            .bind(file_id)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM Frame")
            .fetch_one(&mut *conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Landmarks
    // -----------------------------------------------------------------------

    /// Store one sample per keypoint, in vocabulary order, clamping scores.
    pub async fn insert_landmarks(
        conn: &mut SqliteConnection,
        frame_id: DbId,
        samples: &[LandmarkSample],
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO Landmark ({LANDMARK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        for (keypoint, sample) in Keypoint::ALL.iter().zip(samples) {
            let s = sample.clamped();
            sqlx::query(&query)
                .bind(frame_id)
                .bind(keypoint.index())
                .bind(s.presence)
                .bind(s.confidence)
                .bind(s.position[0])
                .bind(s.position[1])
                .bind(s.position[2])
                .bind(s.image_position[0])
                .bind(s.image_position[1])
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn landmarks_for(
        conn: &mut SqliteConnection,
        frame_id: DbId,
    ) -> Result<Vec<LandmarkRow>, sqlx::Error> {
        let query = format!(
            "SELECT {LANDMARK_COLUMNS} FROM Landmark WHERE frame_id = ? ORDER BY landmark_index"
        );
        sqlx::query_as::<_, LandmarkRow>(&query)
            .bind(frame_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Every landmark row, ordered by frame then index.
    pub async fn all_landmarks(conn: &mut SqliteConnection) -> Result<Vec<LandmarkRow>, sqlx::Error> {
        let query = format!(
            "SELECT {LANDMARK_COLUMNS} FROM Landmark ORDER BY frame_id, landmark_index"
        );
        sqlx::query_as::<_, LandmarkRow>(&query)
            .fetch_all(&mut *conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Bounding boxes
    // -----------------------------------------------------------------------

    pub async fn insert_rect(
        conn: &mut SqliteConnection,
        frame_id: DbId,
        rect: &FrameRect,
    ) -> Result<(), sqlx::Error> {
        let query = format!("INSERT INTO FrameRect ({RECT_COLUMNS}) VALUES (?, ?, ?, ?, ?)");
        sqlx::query(&query)
            .bind(frame_id)
            .bind(rect.x_min)
            .bind(rect.x_max)
            .bind(rect.y_min)
            .bind(rect.y_max)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn find_rect(
        conn: &mut SqliteConnection,
        frame_id: DbId,
    ) -> Result<Option<FrameRectRow>, sqlx::Error> {
        let query = format!("SELECT {RECT_COLUMNS} FROM FrameRect WHERE frame_id = ?");
        sqlx::query_as::<_, FrameRectRow>(&query)
            .bind(frame_id)
            .fetch_optional(&mut *conn)
            .await
    }
}
