//! Similarity query input and result rows.

use poseaxis_core::types::{DbId, Side};
use serde::Serialize;
use sqlx::FromRow;

use crate::vector_index::{self, VectorColumn};

/// Which indexed vector a query searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentVector {
    Torso,
    TorsoYaw,
    Spine,
    Thigh,
    Crus,
}

impl SegmentVector {
    pub fn column(&self) -> &'static VectorColumn {
        match self {
            Self::Torso => &vector_index::TORSO_DIR,
            Self::TorsoYaw => &vector_index::TORSO_YAW,
            Self::Spine => &vector_index::SPINE_DIR,
            Self::Thigh => &vector_index::THIGH_DIR,
            Self::Crus => &vector_index::CRUS_DIR,
        }
    }
}

/// A nearest-neighbour lookup with optional relational filters.
///
/// `predicate` is a SQL boolean expression over the joined rows, using the
/// aliases `f` (Frame), `file` (File), `d` (the segment's direction table)
/// and `r` (Reliability, may be NULL).
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
    pub segment: SegmentVector,
    pub vector: Vec<f32>,
    /// Neighbours fetched from the index before filtering.
    pub k: u32,
    /// Minimum `torso_half_min` of the frame.
    pub min_score: Option<f64>,
    /// Only frames carrying this tag.
    pub tag: Option<String>,
    pub predicate: Option<String>,
}

impl SimilarityQuery {
    pub fn new(segment: SegmentVector, vector: Vec<f32>, k: u32) -> Self {
        Self {
            segment,
            vector,
            k,
            min_score: None,
            tag: None,
            predicate: None,
        }
    }
}

/// One similarity result joined with its frame and source file.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SimilarFrame {
    pub frame_id: DbId,
    /// Set for thigh and crus results.
    pub is_right: Option<i64>,
    pub distance: f64,
    pub path: String,
    pub person_index: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// The frame's `torso_half_min`, if scored.
    pub score: Option<f64>,
}

impl SimilarFrame {
    pub fn side(&self) -> Option<Side> {
        self.is_right.and_then(Side::from_is_right)
    }
}
