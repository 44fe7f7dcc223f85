use poseaxis_core::reliability::RegionReliability;
use poseaxis_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `Reliability` table.
#[derive(Debug, Clone, Copy, PartialEq, FromRow, Serialize)]
pub struct ReliabilityRow {
    pub frame_id: DbId,
    pub torso_half_min: f64,
    pub face_detect: f64,
}

impl From<RegionReliability> for ReliabilityRow {
    fn from(r: RegionReliability) -> Self {
        Self {
            frame_id: r.frame_id,
            torso_half_min: r.torso_half_min,
            face_detect: r.face_detect,
        }
    }
}
