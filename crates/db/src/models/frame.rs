//! Frame, landmark and bounding-box models.

use nalgebra::Vector3;
use poseaxis_core::landmark::{FrameLandmarks, Keypoint, Landmark};
use poseaxis_core::rect::FrameRect;
use poseaxis_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A row from the `Frame` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Frame {
    pub id: DbId,
    pub file_id: DbId,
    pub person_index: i64,
}

// ---------------------------------------------------------------------------
// Landmark
// ---------------------------------------------------------------------------

/// A row from the `Landmark` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LandmarkRow {
    pub frame_id: DbId,
    pub landmark_index: i64,
    pub presence: f64,
    pub confidence: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub image_x: f64,
    pub image_y: f64,
}

impl LandmarkRow {
    pub fn keypoint(&self) -> Option<Keypoint> {
        Keypoint::from_index(self.landmark_index)
    }

    pub fn to_landmark(&self) -> Landmark {
        Landmark {
            presence: self.presence,
            confidence: self.confidence,
            position: Vector3::new(self.x, self.y, self.z),
        }
    }
}

/// Group one frame's rows into a landmark set; unknown indices are ignored.
pub fn collect_landmarks<'a>(rows: impl IntoIterator<Item = &'a LandmarkRow>) -> FrameLandmarks {
    let mut set = FrameLandmarks::new();
    for row in rows {
        if let Some(kp) = row.keypoint() {
            set.insert(kp, row.to_landmark());
        }
    }
    set
}

// ---------------------------------------------------------------------------
// FrameRect
// ---------------------------------------------------------------------------

/// A row from the `FrameRect` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FrameRectRow {
    pub frame_id: DbId,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl FrameRectRow {
    pub fn rect(&self) -> FrameRect {
        FrameRect {
            x_min: self.x_min,
            x_max: self.x_max,
            y_min: self.y_min,
            y_max: self.y_max,
        }
    }
}
