use poseaxis_core::angle::{CrusFlexion, ThighFlexion};
use poseaxis_core::types::{DbId, Side};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `ThighFlexion` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ThighFlexionRow {
    pub frame_id: DbId,
    pub is_right: i64,
    pub dot_body: f64,
    pub angle_rad: f64,
    pub dot_spine: f64,
}

/// A row from the `CrusFlexion` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct CrusFlexionRow {
    pub frame_id: DbId,
    pub is_right: i64,
    pub angle_rad: f64,
    pub dot: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct NewThighFlexion {
    pub frame_id: DbId,
    pub side: Side,
    pub flexion: ThighFlexion,
}

#[derive(Debug, Clone, Copy)]
pub struct NewCrusFlexion {
    pub frame_id: DbId,
    pub side: Side,
    pub flexion: CrusFlexion,
}

// ---------------------------------------------------------------------------
// Pass inputs
// ---------------------------------------------------------------------------

/// Torso, spine and one side's thigh direction of a frame.
#[derive(Debug, Clone, FromRow)]
pub struct ThighFlexionInput {
    pub frame_id: DbId,
    pub is_right: i64,
    pub torso_x: f64,
    pub torso_y: f64,
    pub torso_z: f64,
    pub thigh_x: f64,
    pub thigh_y: f64,
    pub thigh_z: f64,
    pub spine_x: f64,
    pub spine_y: f64,
    pub spine_z: f64,
}

/// One side's thigh and crus direction of a frame.
#[derive(Debug, Clone, FromRow)]
pub struct CrusFlexionInput {
    pub frame_id: DbId,
    pub is_right: i64,
    pub thigh_x: f64,
    pub thigh_y: f64,
    pub thigh_z: f64,
    pub crus_x: f64,
    pub crus_y: f64,
    pub crus_z: f64,
}
