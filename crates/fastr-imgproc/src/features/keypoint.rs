use serde::{Deserialize, Serialize};

/// A detected corner in the image frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Column of the corner.
    pub x: f32,
    /// Row of the corner.
    pub y: f32,
    /// Diameter of the neighbourhood the corner was detected in.
    pub size: f32,
}

impl Keypoint {
    /// The size given to keypoints unless configured otherwise.
    pub const DEFAULT_SIZE: f32 = 7.0;

    /// Create a keypoint at `(x, y)` with the default size.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            size: Self::DEFAULT_SIZE,
        }
    }

    /// Set the size of the keypoint.
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// The nearest pixel `(col, row)`, or `None` for negative or non finite coordinates.
    pub fn pixel(&self) -> Option<(usize, usize)> {
        let (x, y) = (self.x.round(), self.y.round());
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        Some((x as usize, y as usize))
    }
}

/// Whether a pixel is a candidate for a bright or a dark corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// The circle is brighter than the center.
    Bright,
    /// The circle is darker than the center.
    Dark,
    /// Neither, the pixel is rejected.
    None,
}
