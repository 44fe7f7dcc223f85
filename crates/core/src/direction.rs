//! Segment direction inference.
//!
//! Torso direction is the normal of the shoulder/hip plane, derived through
//! a fallback chain of tiers gated on landmark presence:
//!
//! | Tier        | Needs (presence >= threshold)                  |
//! |-------------|------------------------------------------------|
//! | four-point  | both shoulders and both hips                   |
//! | three-point | both shoulders + one hip, or both hips + one shoulder |
//! | two-point   | one shoulder/hip diagonal                      |
//!
//! The first tier whose landmarks qualify decides the result; a degenerate
//! cross product in that tier makes the segment unavailable.
//!
//! Spine direction is the hip-centre to shoulder-centre axis. Thigh
//! (hip to knee) and crus (knee to ankle) are point-pair segments that only
//! need both endpoints reported.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use nalgebra::Vector3;
use serde::Serialize;

use crate::landmark::{FrameLandmarks, Keypoint};
use crate::types::Side;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum presence for a landmark to take part in torso or spine inference.
pub const PRESENCE_THRESHOLD: f64 = 0.9;

/// Lower bound of the squared norm accepted as a unit vector.
pub const UNIT_NORM_SQ_MIN: f64 = 0.995;

/// Upper bound of the squared norm accepted as a unit vector.
pub const UNIT_NORM_SQ_MAX: f64 = 1.005;

/// Norms at or below this are treated as zero-length.
const DEGENERATE_NORM: f64 = 1e-12;

// ---------------------------------------------------------------------------
// UnitVector
// ---------------------------------------------------------------------------

/// A finite 3-D vector of length one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitVector(Vector3<f64>);

impl UnitVector {
    /// Normalize `v`, or `None` when it is zero-length or not finite.
    pub fn new(v: Vector3<f64>) -> Option<Self> {
        let norm = v.norm();
        if !norm.is_finite() || norm <= DEGENERATE_NORM {
            return None;
        }
        Some(Self(v / norm))
    }

    pub fn from_components(x: f64, y: f64, z: f64) -> Option<Self> {
        Self::new(Vector3::new(x, y, z))
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    pub fn as_vector(&self) -> &Vector3<f64> {
        &self.0
    }

    pub fn dot(&self, other: &UnitVector) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }
}

/// Whether a squared norm falls inside the stored unit-vector band.
pub fn is_unit_norm_sq(norm_sq: f64) -> bool {
    (UNIT_NORM_SQ_MIN..=UNIT_NORM_SQ_MAX).contains(&norm_sq)
}

// ---------------------------------------------------------------------------
// Segments and tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Torso,
    Spine,
    Thigh,
    Crus,
}

impl SegmentKind {
    /// Whether the segment is keyed per body side.
    pub fn is_sided(&self) -> bool {
        matches!(self, Self::Thigh | Self::Crus)
    }

    /// Endpoints `(from, to)` of a point-pair segment.
    pub fn endpoints(&self, side: Side) -> Option<(Keypoint, Keypoint)> {
        match (self, side) {
            (Self::Thigh, Side::Left) => Some((Keypoint::LeftHip, Keypoint::LeftKnee)),
            (Self::Thigh, Side::Right) => Some((Keypoint::RightHip, Keypoint::RightKnee)),
            (Self::Crus, Side::Left) => Some((Keypoint::LeftKnee, Keypoint::LeftAnkle)),
            (Self::Crus, Side::Right) => Some((Keypoint::RightKnee, Keypoint::RightAnkle)),
            _ => None,
        }
    }
}

/// Three-point torso sub-cases, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreePointCase {
    /// Both shoulders and the left hip.
    A,
    /// Both shoulders and the right hip.
    B,
    /// Both hips and the left shoulder.
    C,
    /// Both hips and the right shoulder.
    D,
}

/// Two-point torso sub-cases, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TwoPointCase {
    /// Left shoulder and right hip.
    A,
    /// Left hip and right shoulder.
    B,
}

/// The strategy that produced a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    FourPoint,
    ThreePoint(ThreePointCase),
    TwoPoint(TwoPointCase),
    /// Hip-centre to shoulder-centre axis.
    Midpoint,
    /// Normalized difference of two landmarks.
    PointPair,
}

impl Tier {
    /// Label stored in the torso table's `method` column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FourPoint => "4pt",
            Self::ThreePoint(ThreePointCase::A) => "3pt:A",
            Self::ThreePoint(ThreePointCase::B) => "3pt:B",
            Self::ThreePoint(ThreePointCase::C) => "3pt:C",
            Self::ThreePoint(ThreePointCase::D) => "3pt:D",
            Self::TwoPoint(TwoPointCase::A) => "2pt:A",
            Self::TwoPoint(TwoPointCase::B) => "2pt:B",
            Self::Midpoint => "midpoint",
            Self::PointPair => "pair",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "4pt" => Self::FourPoint,
            "3pt:A" => Self::ThreePoint(ThreePointCase::A),
            "3pt:B" => Self::ThreePoint(ThreePointCase::B),
            "3pt:C" => Self::ThreePoint(ThreePointCase::C),
            "3pt:D" => Self::ThreePoint(ThreePointCase::D),
            "2pt:A" => Self::TwoPoint(TwoPointCase::A),
            "2pt:B" => Self::TwoPoint(TwoPointCase::B),
            "midpoint" => Self::Midpoint,
            "pair" => Self::PointPair,
            _ => return None,
        })
    }

    /// All labels a torso row may carry, for the schema CHECK constraint.
    pub fn torso_labels() -> [&'static str; 7] {
        [
            Self::FourPoint.label(),
            Self::ThreePoint(ThreePointCase::A).label(),
            Self::ThreePoint(ThreePointCase::B).label(),
            Self::ThreePoint(ThreePointCase::C).label(),
            Self::ThreePoint(ThreePointCase::D).label(),
            Self::TwoPoint(TwoPointCase::A).label(),
            Self::TwoPoint(TwoPointCase::B).label(),
        ]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Inference results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub vector: UnitVector,
    pub tier: Tier,
}

/// Why a segment direction could not be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// A required landmark has no stored row.
    MissingLandmark(Keypoint),
    /// The qualifying landmarks produced a zero-length vector.
    Degenerate(Tier),
    /// No tier of the fallback chain had enough qualifying landmarks.
    NoQualifyingTier,
    /// A sided segment was requested without a side.
    SideRequired,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inference {
    Available(Direction),
    Unavailable(UnavailableReason),
}

impl Inference {
    pub fn available(self) -> Option<Direction> {
        match self {
            Self::Available(direction) => Some(direction),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    fn from_vector(v: Vector3<f64>, tier: Tier) -> Self {
        match UnitVector::new(v) {
            Some(vector) => Self::Available(Direction { vector, tier }),
            None => Self::Unavailable(UnavailableReason::Degenerate(tier)),
        }
    }
}

// ---------------------------------------------------------------------------
// Handedness
// ---------------------------------------------------------------------------

/// Chooses the reference axis for the two-point tier.
///
/// With only one shoulder/hip diagonal the plane normal is underdetermined;
/// the resolver supplies the axis the diagonal is crossed with, which fixes
/// which way the torso faces.
pub trait HandednessResolver: Send + Sync {
    /// `left` and `right` are the positions of the left-side and right-side
    /// landmarks of the diagonal.
    fn reference_axis(&self, left: &Vector3<f64>, right: &Vector3<f64>) -> Vector3<f64>;
}

/// Depth axis whose sign follows the horizontal order of the diagonal.
///
/// Assumes x grows to the subject's left in image space and z is depth:
/// when the left landmark lies at smaller x the axis is `+z`, else `-z`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HorizontalSignResolver;

impl HandednessResolver for HorizontalSignResolver {
    fn reference_axis(&self, left: &Vector3<f64>, right: &Vector3<f64>) -> Vector3<f64> {
        if left.x < right.x {
            Vector3::z()
        } else {
            -Vector3::z()
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Derives segment directions from a frame's landmarks.
#[derive(Debug, Clone)]
pub struct DirectionEngine<R = HorizontalSignResolver> {
    presence_threshold: f64,
    resolver: R,
}

impl Default for DirectionEngine {
    fn default() -> Self {
        Self::new(PRESENCE_THRESHOLD)
    }
}

impl DirectionEngine {
    pub fn new(presence_threshold: f64) -> Self {
        Self::with_resolver(presence_threshold, HorizontalSignResolver)
    }
}

impl<R: HandednessResolver> DirectionEngine<R> {
    pub fn with_resolver(presence_threshold: f64, resolver: R) -> Self {
        Self {
            presence_threshold,
            resolver,
        }
    }

    pub fn presence_threshold(&self) -> f64 {
        self.presence_threshold
    }

    /// Infer one segment direction. `side` is required for thigh and crus
    /// and ignored for torso and spine.
    pub fn infer_segment_direction(
        &self,
        landmarks: &FrameLandmarks,
        kind: SegmentKind,
        side: Option<Side>,
    ) -> Inference {
        match kind {
            SegmentKind::Torso => self.torso(landmarks),
            SegmentKind::Spine => self.spine(landmarks),
            SegmentKind::Thigh | SegmentKind::Crus => match side {
                Some(side) => point_pair(landmarks, kind, side),
                None => Inference::Unavailable(UnavailableReason::SideRequired),
            },
        }
    }

    /// Torso plane normal via the four/three/two-point chain.
    pub fn torso(&self, landmarks: &FrameLandmarks) -> Inference {
        let t = self.presence_threshold;
        let ls = landmarks.qualifying(Keypoint::LeftShoulder, t);
        let rs = landmarks.qualifying(Keypoint::RightShoulder, t);
        let lh = landmarks.qualifying(Keypoint::LeftHip, t);
        let rh = landmarks.qualifying(Keypoint::RightHip, t);

        // four-point
        if let (Some(ls), Some(rs), Some(lh), Some(rh)) = (ls, rs, lh, rh) {
            let tier = Tier::FourPoint;
            let (Some(a), Some(b)) = (
                UnitVector::new((lh - ls).cross(&(rs - ls))),
                UnitVector::new((ls - rs).cross(&(rh - rs))),
            ) else {
                return Inference::Unavailable(UnavailableReason::Degenerate(tier));
            };
            return Inference::from_vector(a.as_vector() + b.as_vector(), tier);
        }

        // three-point: shoulders plus a hip before hips plus a shoulder
        if let (Some(ls), Some(rs)) = (ls, rs) {
            if let Some(lh) = lh {
                return Inference::from_vector(
                    (lh - ls).cross(&(rs - ls)),
                    Tier::ThreePoint(ThreePointCase::A),
                );
            }
            if let Some(rh) = rh {
                return Inference::from_vector(
                    (ls - rs).cross(&(rh - rs)),
                    Tier::ThreePoint(ThreePointCase::B),
                );
            }
        }
        if let (Some(lh), Some(rh)) = (lh, rh) {
            if let Some(ls) = ls {
                return Inference::from_vector(
                    (rh - lh).cross(&(ls - lh)),
                    Tier::ThreePoint(ThreePointCase::C),
                );
            }
            if let Some(rs) = rs {
                return Inference::from_vector(
                    (rs - rh).cross(&(lh - rh)),
                    Tier::ThreePoint(ThreePointCase::D),
                );
            }
        }

        // two-point diagonals
        if let (Some(ls), Some(rh)) = (ls, rh) {
            let axis = self.resolver.reference_axis(&ls, &rh);
            return Inference::from_vector(
                (rh - ls).cross(&axis),
                Tier::TwoPoint(TwoPointCase::A),
            );
        }
        if let (Some(lh), Some(rs)) = (lh, rs) {
            let axis = self.resolver.reference_axis(&lh, &rs);
            return Inference::from_vector(
                (lh - rs).cross(&axis),
                Tier::TwoPoint(TwoPointCase::B),
            );
        }

        Inference::Unavailable(UnavailableReason::NoQualifyingTier)
    }

    /// Spine axis from the hip centre to the shoulder centre.
    pub fn spine(&self, landmarks: &FrameLandmarks) -> Inference {
        let t = self.presence_threshold;
        let points = [
            Keypoint::LeftShoulder,
            Keypoint::RightShoulder,
            Keypoint::LeftHip,
            Keypoint::RightHip,
        ]
        .map(|kp| landmarks.qualifying(kp, t));

        let [Some(ls), Some(rs), Some(lh), Some(rh)] = points else {
            return Inference::Unavailable(UnavailableReason::NoQualifyingTier);
        };
        let shoulder_centre = (ls + rs) / 2.0;
        let hip_centre = (lh + rh) / 2.0;
        Inference::from_vector(shoulder_centre - hip_centre, Tier::Midpoint)
    }
}

fn point_pair(landmarks: &FrameLandmarks, kind: SegmentKind, side: Side) -> Inference {
    let Some((from, to)) = kind.endpoints(side) else {
        return Inference::Unavailable(UnavailableReason::NoQualifyingTier);
    };
    let Some(a) = landmarks.get(from) else {
        return Inference::Unavailable(UnavailableReason::MissingLandmark(from));
    };
    let Some(b) = landmarks.get(to) else {
        return Inference::Unavailable(UnavailableReason::MissingLandmark(to));
    };
    Inference::from_vector(b.position - a.position, Tier::PointPair)
}

// ---------------------------------------------------------------------------
// Torso orientation
// ---------------------------------------------------------------------------

/// Yaw/pitch decomposition of a torso direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TorsoOrientation {
    /// Normalized `(x, z)` projection onto the horizontal plane; `(0, 0)`
    /// when the direction is vertical.
    pub yaw: [f64; 2],
    /// Elevation above the horizontal plane rescaled from `[-pi/2, pi/2]`
    /// to `[-1, 1]`.
    pub pitch: f64,
}

impl TorsoOrientation {
    pub fn from_direction(direction: &UnitVector) -> Self {
        let horizontal = (direction.x() * direction.x() + direction.z() * direction.z()).sqrt();
        let yaw = if horizontal > 0.0 {
            [direction.x() / horizontal, direction.z() / horizontal]
        } else {
            [0.0, 0.0]
        };
        let pitch = (direction.y().atan2(horizontal) / FRAC_PI_2).clamp(-1.0, 1.0);
        Self { yaw, pitch }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;

    const EPS: f64 = 1e-9;

    fn lm(presence: f64, x: f64, y: f64, z: f64) -> Landmark {
        Landmark {
            presence,
            confidence: 1.0,
            position: Vector3::new(x, y, z),
        }
    }

    /// An upright subject facing the camera.
    fn upright(ls: f64, rs: f64, lh: f64, rh: f64) -> FrameLandmarks {
        FrameLandmarks::new()
            .with(Keypoint::LeftShoulder, lm(ls, 0.2, 0.5, 0.0))
            .with(Keypoint::RightShoulder, lm(rs, -0.2, 0.5, 0.0))
            .with(Keypoint::LeftHip, lm(lh, 0.15, 0.0, 0.05))
            .with(Keypoint::RightHip, lm(rh, -0.15, 0.0, 0.05))
    }

    fn assert_close(a: &Vector3<f64>, b: &Vector3<f64>) {
        assert!((a - b).norm() < EPS, "{a:?} != {b:?}");
    }

    fn pos(set: &FrameLandmarks, kp: Keypoint) -> Vector3<f64> {
        set.get(kp).unwrap().position
    }

    // -- UnitVector ----------------------------------------------------------

    #[test]
    fn unit_vector_rejects_zero_and_nan() {
        assert!(UnitVector::new(Vector3::zeros()).is_none());
        assert!(UnitVector::new(Vector3::new(f64::NAN, 0.0, 0.0)).is_none());
        let v = UnitVector::from_components(3.0, 0.0, 4.0).unwrap();
        assert!((v.as_vector().norm_squared() - 1.0).abs() < EPS);
        assert!(is_unit_norm_sq(v.as_vector().norm_squared()));
    }

    #[test]
    fn unit_band_bounds() {
        assert!(is_unit_norm_sq(0.995));
        assert!(is_unit_norm_sq(1.005));
        assert!(!is_unit_norm_sq(0.99));
        assert!(!is_unit_norm_sq(1.01));
    }

    // -- Tier labels ---------------------------------------------------------

    #[test]
    fn tier_labels_roundtrip() {
        for label in Tier::torso_labels() {
            assert_eq!(Tier::from_label(label).unwrap().label(), label);
        }
        assert_eq!(Tier::from_label("midpoint"), Some(Tier::Midpoint));
        assert_eq!(Tier::from_label("invalid"), None);
    }

    // -- Torso chain ---------------------------------------------------------

    #[test]
    fn four_qualifying_points_select_four_point() {
        let engine = DirectionEngine::default();
        for presence in [0.9, 0.95, 1.0] {
            let d = engine
                .torso(&upright(presence, presence, presence, presence))
                .available()
                .unwrap();
            assert_eq!(d.tier, Tier::FourPoint);
        }
    }

    #[test]
    fn four_point_averages_both_normals() {
        let set = upright(1.0, 1.0, 1.0, 1.0);
        let (ls, rs, lh, rh) = (
            pos(&set, Keypoint::LeftShoulder),
            pos(&set, Keypoint::RightShoulder),
            pos(&set, Keypoint::LeftHip),
            pos(&set, Keypoint::RightHip),
        );
        let a = (lh - ls).cross(&(rs - ls)).normalize();
        let b = (ls - rs).cross(&(rh - rs)).normalize();
        let expected = (a + b).normalize();

        let d = DirectionEngine::default().torso(&set).available().unwrap();
        assert_close(d.vector.as_vector(), &expected);
    }

    #[test]
    fn dropping_right_hip_falls_back_to_case_a() {
        let set = upright(1.0, 1.0, 1.0, 0.89);
        let d = DirectionEngine::default().torso(&set).available().unwrap();
        assert_eq!(d.tier, Tier::ThreePoint(ThreePointCase::A));

        let (ls, rs, lh) = (
            pos(&set, Keypoint::LeftShoulder),
            pos(&set, Keypoint::RightShoulder),
            pos(&set, Keypoint::LeftHip),
        );
        let expected = (lh - ls).cross(&(rs - ls)).normalize();
        assert_close(d.vector.as_vector(), &expected);
    }

    #[test]
    fn dropping_left_hip_falls_back_to_case_b() {
        let set = upright(1.0, 1.0, 0.5, 1.0);
        let d = DirectionEngine::default().torso(&set).available().unwrap();
        assert_eq!(d.tier, Tier::ThreePoint(ThreePointCase::B));

        let (ls, rs, rh) = (
            pos(&set, Keypoint::LeftShoulder),
            pos(&set, Keypoint::RightShoulder),
            pos(&set, Keypoint::RightHip),
        );
        let expected = (ls - rs).cross(&(rh - rs)).normalize();
        assert_close(d.vector.as_vector(), &expected);
    }

    #[test]
    fn dropping_a_shoulder_uses_hip_cases() {
        let engine = DirectionEngine::default();

        let set = upright(1.0, 0.2, 1.0, 1.0);
        let d = engine.torso(&set).available().unwrap();
        assert_eq!(d.tier, Tier::ThreePoint(ThreePointCase::C));
        let (ls, lh, rh) = (
            pos(&set, Keypoint::LeftShoulder),
            pos(&set, Keypoint::LeftHip),
            pos(&set, Keypoint::RightHip),
        );
        assert_close(
            d.vector.as_vector(),
            &(rh - lh).cross(&(ls - lh)).normalize(),
        );

        let set = upright(0.2, 1.0, 1.0, 1.0);
        let d = engine.torso(&set).available().unwrap();
        assert_eq!(d.tier, Tier::ThreePoint(ThreePointCase::D));
    }

    #[test]
    fn three_point_normals_agree_with_four_point_orientation() {
        let engine = DirectionEngine::default();
        let four = engine.torso(&upright(1.0, 1.0, 1.0, 1.0)).available().unwrap();
        for set in [
            upright(1.0, 1.0, 1.0, 0.0),
            upright(1.0, 1.0, 0.0, 1.0),
            upright(1.0, 0.0, 1.0, 1.0),
            upright(0.0, 1.0, 1.0, 1.0),
        ] {
            let three = engine.torso(&set).available().unwrap();
            assert!(three.vector.dot(&four.vector) > 0.9, "{:?}", three.tier);
        }
    }

    #[test]
    fn case_c_stays_in_the_four_point_hemisphere() {
        let engine = DirectionEngine::default();
        let leaning = FrameLandmarks::new()
            .with(Keypoint::LeftShoulder, lm(1.0, 0.25, 0.45, -0.1))
            .with(Keypoint::RightShoulder, lm(1.0, -0.15, 0.5, 0.05))
            .with(Keypoint::LeftHip, lm(1.0, 0.15, 0.0, 0.05))
            .with(Keypoint::RightHip, lm(1.0, -0.15, 0.0, 0.05));

        for full in [upright(1.0, 1.0, 1.0, 1.0), leaning] {
            let four = engine.torso(&full).available().unwrap();
            assert_eq!(four.tier, Tier::FourPoint);

            let without_rs = full
                .clone()
                .with(Keypoint::RightShoulder, lm(0.0, 0.0, 0.0, 0.0));
            let c = engine.torso(&without_rs).available().unwrap();
            assert_eq!(c.tier, Tier::ThreePoint(ThreePointCase::C));
            assert!(c.vector.dot(&four.vector) > 0.0);

            // operands the other way round face backwards
            let (ls, lh, rh) = (
                pos(&full, Keypoint::LeftShoulder),
                pos(&full, Keypoint::LeftHip),
                pos(&full, Keypoint::RightHip),
            );
            let flipped = UnitVector::new((ls - lh).cross(&(rh - lh))).unwrap();
            assert!(flipped.dot(&four.vector) < 0.0);
        }
    }

    #[test]
    fn diagonal_pairs_use_two_point() {
        let engine = DirectionEngine::default();

        let set = upright(1.0, 0.0, 0.0, 1.0);
        let d = engine.torso(&set).available().unwrap();
        assert_eq!(d.tier, Tier::TwoPoint(TwoPointCase::A));
        let (ls, rh) = (
            pos(&set, Keypoint::LeftShoulder),
            pos(&set, Keypoint::RightHip),
        );
        // left shoulder sits at larger x, so the axis flips to -z
        let expected = (rh - ls).cross(&-Vector3::z()).normalize();
        assert_close(d.vector.as_vector(), &expected);

        let d = engine.torso(&upright(0.0, 1.0, 1.0, 0.0)).available().unwrap();
        assert_eq!(d.tier, Tier::TwoPoint(TwoPointCase::B));
    }

    #[test]
    fn same_side_pair_is_unavailable() {
        let engine = DirectionEngine::default();
        assert_eq!(
            engine.torso(&upright(1.0, 0.0, 1.0, 0.0)),
            Inference::Unavailable(UnavailableReason::NoQualifyingTier)
        );
        assert_eq!(
            engine.torso(&FrameLandmarks::new()),
            Inference::Unavailable(UnavailableReason::NoQualifyingTier)
        );
    }

    #[test]
    fn threshold_is_configurable() {
        let set = upright(0.8, 0.8, 0.8, 0.8);
        assert!(!DirectionEngine::default().torso(&set).is_available());
        let d = DirectionEngine::new(0.8).torso(&set).available().unwrap();
        assert_eq!(d.tier, Tier::FourPoint);
    }

    #[test]
    fn collinear_four_point_is_degenerate() {
        let set = FrameLandmarks::new()
            .with(Keypoint::LeftShoulder, lm(1.0, 0.0, 0.0, 0.0))
            .with(Keypoint::RightShoulder, lm(1.0, 1.0, 0.0, 0.0))
            .with(Keypoint::LeftHip, lm(1.0, 2.0, 0.0, 0.0))
            .with(Keypoint::RightHip, lm(1.0, 3.0, 0.0, 0.0));
        assert_eq!(
            DirectionEngine::default().torso(&set),
            Inference::Unavailable(UnavailableReason::Degenerate(Tier::FourPoint))
        );
    }

    struct FixedAxis;

    impl HandednessResolver for FixedAxis {
        fn reference_axis(&self, _: &Vector3<f64>, _: &Vector3<f64>) -> Vector3<f64> {
            Vector3::x()
        }
    }

    #[test]
    fn two_point_uses_pluggable_resolver() {
        let set = upright(1.0, 0.0, 0.0, 1.0);
        let d = DirectionEngine::with_resolver(PRESENCE_THRESHOLD, FixedAxis)
            .torso(&set)
            .available()
            .unwrap();
        let (ls, rh) = (
            pos(&set, Keypoint::LeftShoulder),
            pos(&set, Keypoint::RightHip),
        );
        assert_close(
            d.vector.as_vector(),
            &(rh - ls).cross(&Vector3::x()).normalize(),
        );
    }

    #[test]
    fn horizontal_resolver_flips_on_x_order() {
        let r = HorizontalSignResolver;
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(r.reference_axis(&a, &b), Vector3::z());
        assert_eq!(r.reference_axis(&b, &a), -Vector3::z());
        assert_eq!(r.reference_axis(&a, &a), -Vector3::z());
    }

    // -- Spine ---------------------------------------------------------------

    #[test]
    fn spine_points_from_hips_to_shoulders() {
        let d = DirectionEngine::default()
            .spine(&upright(1.0, 1.0, 1.0, 1.0))
            .available()
            .unwrap();
        assert_eq!(d.tier, Tier::Midpoint);
        assert_close(
            d.vector.as_vector(),
            &Vector3::new(0.0, 0.5, -0.05).normalize(),
        );
    }

    #[test]
    fn spine_needs_all_four_qualifying() {
        assert!(!DirectionEngine::default()
            .spine(&upright(1.0, 1.0, 1.0, 0.5))
            .is_available());
    }

    // -- Point pairs ---------------------------------------------------------

    #[test]
    fn thigh_points_hip_to_knee() {
        let set = FrameLandmarks::new()
            .with(Keypoint::LeftHip, lm(0.1, 0.0, 1.0, 0.0))
            .with(Keypoint::LeftKnee, lm(0.1, 0.0, 0.0, 0.0));
        let d = DirectionEngine::default()
            .infer_segment_direction(&set, SegmentKind::Thigh, Some(Side::Left))
            .available()
            .unwrap();
        assert_eq!(d.tier, Tier::PointPair);
        assert_close(d.vector.as_vector(), &Vector3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn point_pair_missing_endpoint_or_zero_length() {
        let engine = DirectionEngine::default();
        let set = FrameLandmarks::new().with(Keypoint::RightKnee, lm(1.0, 0.0, 0.0, 0.0));
        assert_eq!(
            engine.infer_segment_direction(&set, SegmentKind::Crus, Some(Side::Right)),
            Inference::Unavailable(UnavailableReason::MissingLandmark(Keypoint::RightAnkle))
        );

        let set = set.with(Keypoint::RightAnkle, lm(1.0, 0.0, 0.0, 0.0));
        assert_eq!(
            engine.infer_segment_direction(&set, SegmentKind::Crus, Some(Side::Right)),
            Inference::Unavailable(UnavailableReason::Degenerate(Tier::PointPair))
        );
        assert_eq!(
            engine.infer_segment_direction(&set, SegmentKind::Crus, None),
            Inference::Unavailable(UnavailableReason::SideRequired)
        );
    }

    // -- Orientation ---------------------------------------------------------

    #[test]
    fn orientation_of_horizontal_direction() {
        let o = TorsoOrientation::from_direction(&UnitVector::from_components(0.0, 0.0, -1.0).unwrap());
        assert_eq!(o.yaw, [0.0, -1.0]);
        assert!(o.pitch.abs() < EPS);
    }

    #[test]
    fn orientation_of_vertical_direction() {
        let up = TorsoOrientation::from_direction(&UnitVector::from_components(0.0, 1.0, 0.0).unwrap());
        assert_eq!(up.yaw, [0.0, 0.0]);
        assert!((up.pitch - 1.0).abs() < EPS);

        let down =
            TorsoOrientation::from_direction(&UnitVector::from_components(0.0, -1.0, 0.0).unwrap());
        assert!((down.pitch + 1.0).abs() < EPS);
    }

    #[test]
    fn orientation_pitch_is_linear_in_angle() {
        let o = TorsoOrientation::from_direction(&UnitVector::from_components(1.0, 1.0, 0.0).unwrap());
        assert!((o.pitch - 0.5).abs() < EPS);
        assert!((o.yaw[0] - 1.0).abs() < EPS);
    }
}
