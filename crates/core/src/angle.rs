//! Joint flexion angles from adjacent segment directions.
//!
//! The angle between two unit vectors is `acos(dot)`, which is unsigned.
//! Hip flexion takes its sign from a third reference (the spine): a thigh
//! pointing against the spine is flexed forward and gets a positive angle.

use serde::Serialize;

use crate::direction::UnitVector;

/// Knee flexion between thigh and crus. `angle_rad` is in `[0, pi]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrusFlexion {
    pub angle_rad: f64,
    /// `dot(thigh, crus)` clamped to `[-1, 1]`; `1` is full extension.
    pub dot: f64,
}

/// Hip flexion between torso and thigh. `angle_rad` is in `[-pi, pi]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThighFlexion {
    pub angle_rad: f64,
    /// `dot(torso, thigh)` clamped to `[-1, 1]`.
    pub dot_body: f64,
    /// `dot(thigh, spine)` clamped to `[-1, 1]`; its sign decides the angle's.
    pub dot_spine: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Flexion {
    Crus(CrusFlexion),
    Thigh(ThighFlexion),
}

impl Flexion {
    pub fn angle_rad(&self) -> f64 {
        match self {
            Self::Crus(c) => c.angle_rad,
            Self::Thigh(t) => t.angle_rad,
        }
    }
}

fn clamped_dot(a: &UnitVector, b: &UnitVector) -> f64 {
    a.dot(b).clamp(-1.0, 1.0)
}

pub fn crus_flexion(thigh: &UnitVector, crus: &UnitVector) -> CrusFlexion {
    let dot = clamped_dot(thigh, crus);
    CrusFlexion {
        angle_rad: dot.acos(),
        dot,
    }
}

pub fn thigh_flexion(torso: &UnitVector, thigh: &UnitVector, spine: &UnitVector) -> ThighFlexion {
    let dot_body = clamped_dot(torso, thigh);
    let dot_spine = clamped_dot(thigh, spine);
    let magnitude = dot_body.acos();
    let angle_rad = if dot_spine < 0.0 { magnitude } else { -magnitude };
    ThighFlexion {
        angle_rad,
        dot_body,
        dot_spine,
    }
}

/// Angle between `a` and `b`.
///
/// Without a reference this is the unsigned crus angle (`a` thigh, `b`
/// crus). With one it is the signed thigh angle (`a` torso, `b` thigh,
/// `reference` spine).
pub fn derive_flexion(a: &UnitVector, b: &UnitVector, reference: Option<&UnitVector>) -> Flexion {
    match reference {
        Some(spine) => Flexion::Thigh(thigh_flexion(a, b, spine)),
        None => Flexion::Crus(crus_flexion(a, b)),
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    const EPS: f64 = 1e-9;

    fn unit(x: f64, y: f64, z: f64) -> UnitVector {
        UnitVector::from_components(x, y, z).unwrap()
    }

    // -- crus ----------------------------------------------------------------

    #[test]
    fn straight_leg_is_zero() {
        let down = unit(0.0, -1.0, 0.0);
        let c = crus_flexion(&down, &down);
        assert!(c.angle_rad.abs() < EPS);
        assert!((c.dot - 1.0).abs() < EPS);
    }

    #[test]
    fn folded_leg_is_pi() {
        let c = crus_flexion(&unit(0.0, -1.0, 0.0), &unit(0.0, 1.0, 0.0));
        assert!((c.angle_rad - PI).abs() < EPS);
        assert!((c.dot + 1.0).abs() < EPS);
    }

    #[test]
    fn right_angle_knee() {
        let c = crus_flexion(&unit(0.0, 0.0, -1.0), &unit(0.0, -1.0, 0.0));
        assert!((c.angle_rad - FRAC_PI_2).abs() < EPS);
    }

    // -- thigh ---------------------------------------------------------------

    #[test]
    fn thigh_against_spine_is_positive() {
        let torso = unit(0.0, 0.0, -1.0);
        let spine = unit(0.0, 1.0, 0.0);
        let thigh = unit(0.0, -0.5, -1.0);
        let t = thigh_flexion(&torso, &thigh, &spine);
        assert!(t.dot_spine < 0.0);
        assert!(t.angle_rad > 0.0);
        assert!((t.angle_rad - t.dot_body.acos()).abs() < EPS);
    }

    #[test]
    fn thigh_along_spine_is_negative() {
        let torso = unit(0.0, 0.0, -1.0);
        let spine = unit(0.0, 1.0, 0.0);
        let thigh = unit(0.0, 0.5, 1.0);
        let t = thigh_flexion(&torso, &thigh, &spine);
        assert!(t.dot_spine >= 0.0);
        assert!(t.angle_rad < 0.0);
    }

    #[test]
    fn orthogonal_spine_counts_as_non_negative() {
        let torso = unit(0.0, 0.0, -1.0);
        let spine = unit(0.0, 1.0, 0.0);
        let thigh = unit(1.0, 0.0, 0.0);
        let t = thigh_flexion(&torso, &thigh, &spine);
        assert_eq!(t.dot_spine, 0.0);
        assert!((t.angle_rad + FRAC_PI_2).abs() < EPS);
    }

    // -- derive_flexion ------------------------------------------------------

    #[test]
    fn reference_selects_signed_variant() {
        let a = unit(0.0, 0.0, -1.0);
        let b = unit(0.0, -1.0, 0.0);
        let spine = unit(0.0, 1.0, 0.0);
        assert!(matches!(derive_flexion(&a, &b, None), Flexion::Crus(_)));
        let signed = derive_flexion(&a, &b, Some(&spine));
        assert!(matches!(signed, Flexion::Thigh(_)));
        assert!((signed.angle_rad() - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn angles_stay_in_domain() {
        let dirs = [
            unit(1.0, 0.0, 0.0),
            unit(-1.0, 0.0, 0.0),
            unit(0.3, -0.9, 0.1),
            unit(-0.2, 0.4, -0.8),
        ];
        for a in &dirs {
            for b in &dirs {
                let c = crus_flexion(a, b);
                assert!((0.0..=PI).contains(&c.angle_rad));
                for r in &dirs {
                    let t = thigh_flexion(a, b, r);
                    assert!((-PI..=PI).contains(&t.angle_rad));
                }
            }
        }
    }
}
