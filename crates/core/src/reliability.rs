//! Per-frame detection reliability over anatomical regions.
//!
//! A region's reliability is the mean of squared confidence over the
//! landmarks reported in that region. Unreported landmarks are left out of
//! the mean rather than counted as zero.

use serde::Serialize;

use crate::error::CoreError;
use crate::landmark::{FrameLandmarks, Keypoint};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// Face keypoints: the contiguous vocabulary prefix up to the right ear.
pub const FACE_REGION: [Keypoint; 5] = [
    Keypoint::Nose,
    Keypoint::LeftEye,
    Keypoint::RightEye,
    Keypoint::LeftEar,
    Keypoint::RightEar,
];

pub const LEFT_LIMB_REGION: [Keypoint; 4] = [
    Keypoint::LeftShoulder,
    Keypoint::LeftElbow,
    Keypoint::LeftHip,
    Keypoint::LeftKnee,
];

pub const RIGHT_LIMB_REGION: [Keypoint; 4] = [
    Keypoint::RightShoulder,
    Keypoint::RightElbow,
    Keypoint::RightHip,
    Keypoint::RightKnee,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Face,
    LeftLimb,
    RightLimb,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Face, Region::LeftLimb, Region::RightLimb];

    pub fn keypoints(&self) -> &'static [Keypoint] {
        match self {
            Self::Face => &FACE_REGION,
            Self::LeftLimb => &LEFT_LIMB_REGION,
            Self::RightLimb => &RIGHT_LIMB_REGION,
        }
    }

    /// Comma-separated landmark indices, for `IN (..)` clauses.
    pub fn index_list(&self) -> String {
        self.keypoints()
            .iter()
            .map(|k| k.index().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Reliability scores for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionReliability {
    pub frame_id: DbId,
    /// Lower of the left and right limb reliabilities.
    pub torso_half_min: f64,
    pub face_detect: f64,
}

/// Mean squared confidence over the reported landmarks of a region.
///
/// `None` when the region has no reported landmark.
pub fn region_score(landmarks: &FrameLandmarks, region: Region) -> Option<f64> {
    let squares: Vec<f64> = region
        .keypoints()
        .iter()
        .filter_map(|kp| landmarks.get(*kp))
        .map(|lm| lm.confidence * lm.confidence)
        .collect();
    if squares.is_empty() {
        return None;
    }
    Some(squares.iter().sum::<f64>() / squares.len() as f64)
}

/// Score a single frame.
///
/// Frames missing every landmark of any region are not scored.
pub fn score(frame_id: DbId, landmarks: &FrameLandmarks) -> Option<RegionReliability> {
    let face = region_score(landmarks, Region::Face)?;
    let left = region_score(landmarks, Region::LeftLimb)?;
    let right = region_score(landmarks, Region::RightLimb)?;
    Some(RegionReliability {
        frame_id,
        torso_half_min: left.min(right),
        face_detect: face,
    })
}

/// Zip the three grouped aggregates of a batch pass into per-frame scores.
///
/// Each input is `(frame_id, mean squared confidence)` ordered by ascending
/// frame id. The three lists must agree in length and frame id at every
/// position; anything else is [`CoreError::AggregateAlignment`].
pub fn zip_aggregates(
    face: &[(DbId, f64)],
    left: &[(DbId, f64)],
    right: &[(DbId, f64)],
) -> Result<Vec<RegionReliability>, CoreError> {
    let longest = face.len().max(left.len()).max(right.len());
    let mut scores = Vec::with_capacity(longest);

    for position in 0..longest {
        let (f, l, r) = (face.get(position), left.get(position), right.get(position));
        match (f, l, r) {
            (Some(&(fid, face_score)), Some(&(lid, left_score)), Some(&(rid, right_score)))
                if fid == lid && lid == rid =>
            {
                scores.push(RegionReliability {
                    frame_id: fid,
                    torso_half_min: left_score.min(right_score).clamp(0.0, 1.0),
                    face_detect: face_score.clamp(0.0, 1.0),
                });
            }
            _ => {
                return Err(CoreError::AggregateAlignment {
                    position,
                    face: f.map(|e| e.0),
                    left: l.map(|e| e.0),
                    right: r.map(|e| e.0),
                });
            }
        }
    }
    Ok(scores)
}
