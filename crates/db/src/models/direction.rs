//! Segment direction models.

use poseaxis_core::direction::{Tier, TorsoOrientation, UnitVector};
use poseaxis_core::types::{DbId, Side};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A row from the `TorsoDirection` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct TorsoDirectionRow {
    pub frame_id: DbId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Tier label, e.g. `4pt` or `3pt:A`.
    pub method: String,
    pub score: f64,
    pub yaw_x: f64,
    pub yaw_z: f64,
    pub pitch: f64,
}

impl TorsoDirectionRow {
    pub fn tier(&self) -> Option<Tier> {
        Tier::from_label(&self.method)
    }
}

/// A row from the `SpineDirection` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SpineDirectionRow {
    pub frame_id: DbId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub method: String,
}

/// A row from the `ThighDirection` or `CrusDirection` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SideDirectionRow {
    pub frame_id: DbId,
    pub is_right: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SideDirectionRow {
    pub fn side(&self) -> Option<Side> {
        Side::from_is_right(self.is_right)
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct NewTorsoDirection {
    pub frame_id: DbId,
    pub direction: UnitVector,
    pub tier: Tier,
    /// The frame's `torso_half_min`.
    pub score: f64,
    pub orientation: TorsoOrientation,
}

#[derive(Debug, Clone, Copy)]
pub struct NewSpineDirection {
    pub frame_id: DbId,
    pub direction: UnitVector,
    pub tier: Tier,
}

#[derive(Debug, Clone, Copy)]
pub struct NewSideDirection {
    pub frame_id: DbId,
    pub side: Side,
    pub direction: UnitVector,
}
