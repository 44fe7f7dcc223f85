//! Landmark vocabulary and per-frame landmark sets.
//!
//! Frames are stored against the 17-point COCO person-keypoint vocabulary.
//! The discriminant of [`Keypoint`] is the `landmark_index` column and the
//! row id of the seeded `LandmarkName` table.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Number of entries in the landmark vocabulary.
pub const LANDMARK_COUNT: usize = 17;

/// Version tag of the landmark vocabulary, bumped if the keypoint set changes.
pub const VOCABULARY_VERSION: &str = "coco-17";

/// COCO person keypoints, in detector output order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keypoint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Keypoint {
    pub const ALL: [Keypoint; LANDMARK_COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Value of the `landmark_index` column.
    pub fn index(&self) -> i64 {
        *self as i64
    }

    /// Name seeded into the `LandmarkName` table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

// ---------------------------------------------------------------------------
// Detector samples
// ---------------------------------------------------------------------------

/// One landmark as reported by the detector.
///
/// `position` is the 3-D landmark (x right, y up, z depth); `image_position`
/// is the normalized 2-D image coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSample {
    pub presence: f64,
    pub confidence: f64,
    pub position: [f64; 3],
    pub image_position: [f64; 2],
}

impl LandmarkSample {
    /// Copy with presence and confidence clamped to `[0, 1]`.
    ///
    /// NaN scores become 0.
    pub fn clamped(&self) -> Self {
        Self {
            presence: clamp_unit(self.presence),
            confidence: clamp_unit(self.confidence),
            ..*self
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Validate that a detected instance carries one sample per vocabulary entry.
pub fn validate_landmark_count(samples: &[LandmarkSample]) -> Result<(), CoreError> {
    if samples.len() != LANDMARK_COUNT {
        return Err(CoreError::Validation(format!(
            "Expected {LANDMARK_COUNT} landmarks ({VOCABULARY_VERSION}), got {}",
            samples.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Frame landmark set
// ---------------------------------------------------------------------------

/// A landmark as read back from the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub presence: f64,
    pub confidence: f64,
    pub position: Vector3<f64>,
}

/// The landmarks reported for one frame, indexed by keypoint.
///
/// Keypoints without a stored row are absent; absence is distinct from a
/// low presence score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameLandmarks {
    slots: [Option<Landmark>; LANDMARK_COUNT],
}

impl FrameLandmarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keypoint: Keypoint, landmark: Landmark) {
        self.slots[keypoint as usize] = Some(landmark);
    }

    pub fn with(mut self, keypoint: Keypoint, landmark: Landmark) -> Self {
        self.insert(keypoint, landmark);
        self
    }

    pub fn get(&self, keypoint: Keypoint) -> Option<&Landmark> {
        self.slots[keypoint as usize].as_ref()
    }

    /// Position of a keypoint whose presence reaches `threshold`.
    pub fn qualifying(&self, keypoint: Keypoint, threshold: f64) -> Option<Vector3<f64>> {
        self.get(keypoint)
            .filter(|lm| lm.presence >= threshold)
            .map(|lm| lm.position)
    }

    /// Number of keypoints with a stored row.
    pub fn reported(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Build a set from ingestion samples in vocabulary order.
    pub fn from_samples(samples: &[LandmarkSample]) -> Self {
        let mut set = Self::new();
        for (keypoint, sample) in Keypoint::ALL.iter().zip(samples) {
            let sample = sample.clamped();
            set.insert(
                *keypoint,
                Landmark {
                    presence: sample.presence,
                    confidence: sample.confidence,
                    position: Vector3::from(sample.position),
                },
            );
        }
        set
    }
}
