//! Normalized image-space bounding box of a detected person.

use serde::Serialize;

use crate::error::CoreError;
use crate::landmark::{Keypoint, LandmarkSample};

/// Margin added on every side of the landmark extent.
pub const RECT_MARGIN: f64 = 0.1;

/// Extra margin above the head when the nose is the topmost landmark.
pub const HEAD_MARGIN: f64 = 0.1;

/// How close to the top edge the nose must be to count as topmost.
const HEAD_PROXIMITY: f64 = 0.05;

/// Axis-aligned rectangle in normalized image coordinates (y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl FrameRect {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, CoreError> {
        if !(x_min <= x_max && y_min <= y_max) {
            return Err(CoreError::Validation(format!(
                "Invalid rectangle: x {x_min}..{x_max}, y {y_min}..{y_max}"
            )));
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Extent of the 2-D landmark positions, padded and clipped to `[0, 1]`.
    pub fn from_samples(samples: &[LandmarkSample]) -> Result<Self, CoreError> {
        let Some(first) = samples.first() else {
            return Err(CoreError::Validation(
                "Cannot bound an empty landmark set".into(),
            ));
        };
        let [mut x_min, mut y_min] = first.image_position;
        let (mut x_max, mut y_max) = (x_min, y_min);
        for s in samples {
            let [x, y] = s.image_position;
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }

        let head_room = samples
            .get(Keypoint::Nose as usize)
            .filter(|nose| nose.image_position[1] <= y_min + HEAD_PROXIMITY)
            .map_or(0.0, |_| HEAD_MARGIN);

        Self::new(x_min, x_max, y_min, y_max)?
            .pad(RECT_MARGIN, RECT_MARGIN, RECT_MARGIN + head_room, RECT_MARGIN)
            .clip_unit()
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    fn pad(&self, left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            x_min: self.x_min - left,
            x_max: self.x_max + right,
            y_min: self.y_min - top,
            y_max: self.y_max + bottom,
        }
    }

    fn clip_unit(&self) -> Result<Self, CoreError> {
        Self::new(
            self.x_min.max(0.0),
            self.x_max.min(1.0),
            self.y_min.max(0.0),
            self.y_max.min(1.0),
        )
    }
}
