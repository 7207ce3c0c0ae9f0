use fastr_image::{Image, ImageError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{DetectorError, Keypoint, Polarity};
use crate::padding::{pad_uniform, PaddingMode};

/// Radius of the Bresenham circle sampled around each pixel.
pub const CIRCLE_RADIUS: usize = 3;

/// Number of contiguous circle samples that must be brighter or darker than the center.
pub const ARC_LENGTH: usize = 12;

/// The 16 `(dx, dy)` offsets of the radius 3 Bresenham circle, clockwise in
/// image coordinates starting straight up.
pub const CIRCLE_OFFSETS: [[i32; 2]; 16] = [
    [0, -3],  // 1
    [1, -3],  // 2
    [2, -2],  // 3
    [3, -1],  // 4
    [3, 0],   // 5
    [3, 1],   // 6
    [2, 2],   // 7
    [1, 3],   // 8
    [0, 3],   // 9
    [-1, 3],  // 10
    [-2, 2],  // 11
    [-3, 1],  // 12
    [-3, 0],  // 13
    [-3, -1], // 14
    [-2, -2], // 15
    [-1, -3], // 16
];

/// Positions of the high-speed test samples in the offset table.
const CARDINALS: [usize; 4] = [0, 4, 8, 12];

/// Parameters of the FAST candidate scanner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastConfig {
    /// Intensity margin a circle sample must exceed, in normalized units.
    pub threshold: f32,
    /// Size given to the detected keypoints.
    pub keypoint_size: f32,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            keypoint_size: Keypoint::DEFAULT_SIZE,
        }
    }
}

impl FastConfig {
    /// Set the intensity margin.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the size of the detected keypoints.
    pub fn with_keypoint_size(mut self, keypoint_size: f32) -> Self {
        self.keypoint_size = keypoint_size;
        self
    }
}

/// FAST-12 segment test over a normalized grayscale image.
///
/// The circle is given as an offset table at construction. The high-speed
/// test reads entries 0, 4, 8 and 12 of the table, which are the four
/// cardinal points of [`CIRCLE_OFFSETS`].
#[derive(Debug, Clone)]
pub struct FastScanner {
    offsets: [[i32; 2]; 16],
    threshold: f32,
    keypoint_size: f32,
    border_mode: PaddingMode,
}

impl FastScanner {
    /// Create a scanner over [`CIRCLE_OFFSETS`].
    pub fn new(config: &FastConfig) -> Self {
        Self {
            offsets: CIRCLE_OFFSETS,
            threshold: config.threshold,
            keypoint_size: config.keypoint_size,
            border_mode: PaddingMode::Reflect101,
        }
    }

    /// Create a scanner over a custom offset table.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::InvalidConfig`] if an offset is farther than
    /// [`CIRCLE_RADIUS`] from the center in either axis, since the scan only
    /// pads the image by that radius.
    pub fn with_offsets(
        config: &FastConfig,
        offsets: [[i32; 2]; 16],
    ) -> Result<Self, DetectorError> {
        let radius = CIRCLE_RADIUS as i32;
        if let Some([dx, dy]) = offsets
            .iter()
            .find(|[dx, dy]| dx.abs() > radius || dy.abs() > radius)
        {
            return Err(DetectorError::InvalidConfig(format!(
                "circle offset ({dx}, {dy}) is outside the radius {radius}"
            )));
        }

        Ok(Self {
            offsets,
            ..Self::new(config)
        })
    }

    /// Set the border mode used to pad the image before scanning.
    pub fn with_border_mode(mut self, border_mode: PaddingMode) -> Self {
        self.border_mode = border_mode;
        self
    }

    /// The intensity margin of the scanner.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Classify a pixel from the four cardinal samples of its circle.
    ///
    /// At least three of them must be strictly brighter than `center + t`
    /// for [`Polarity::Bright`], or strictly darker than `center - t` for
    /// [`Polarity::Dark`]. Bright wins when both hold.
    pub fn high_speed_test(&self, center: f32, ring: &[f32; 16]) -> Polarity {
        let upper = center + self.threshold;
        let lower = center - self.threshold;

        let bright = CARDINALS.iter().filter(|&&i| ring[i] > upper).count();
        if bright >= 3 {
            return Polarity::Bright;
        }

        let dark = CARDINALS.iter().filter(|&&i| ring[i] < lower).count();
        if dark >= 3 {
            return Polarity::Dark;
        }

        Polarity::None
    }

    /// Check for [`ARC_LENGTH`] contiguous circle samples of the given polarity.
    ///
    /// The circle is walked twice so that runs wrapping from the last entry to
    /// the first are found.
    pub fn arc_test(&self, center: f32, ring: &[f32; 16], polarity: Polarity) -> bool {
        let upper = center + self.threshold;
        let lower = center - self.threshold;

        let qualifies = |v: f32| match polarity {
            Polarity::Bright => v > upper,
            Polarity::Dark => v < lower,
            Polarity::None => false,
        };

        let mut run = 0;
        for step in 0..2 * ring.len() {
            if qualifies(ring[step % ring.len()]) {
                run += 1;
                if run >= ARC_LENGTH {
                    return true;
                }
            } else {
                run = 0;
            }
        }

        false
    }

    /// Run both tests on a center value and its circle.
    pub fn is_corner(&self, center: f32, ring: &[f32; 16]) -> bool {
        match self.high_speed_test(center, ring) {
            Polarity::None => false,
            polarity => self.arc_test(center, ring, polarity),
        }
    }

    /// Evaluate the pixel `(x, y)` directly on an unpadded image.
    ///
    /// Pixels closer than [`CIRCLE_RADIUS`] to the border are never corners.
    pub fn is_corner_at(&self, image: &Image<f32, 1>, x: usize, y: usize) -> bool {
        let r = CIRCLE_RADIUS;
        if x < r || y < r || x + r >= image.cols() || y + r >= image.rows() {
            return false;
        }

        let data = image.as_slice();
        let center = data[y * image.cols() + x];
        let ring = self.ring(data, image.cols(), x, y);
        self.is_corner(center, &ring)
    }

    /// Scan every pixel at least [`CIRCLE_RADIUS`] away from the border.
    ///
    /// The image is padded by the circle radius before sampling. Keypoints are
    /// reported in the unpadded frame in raster order.
    ///
    /// # Arguments
    ///
    /// * `src` - The normalized grayscale image.
    ///
    /// # Returns
    ///
    /// The accepted pixels, empty for images too small to hold an interior pixel.
    pub fn scan(&self, src: &Image<f32, 1>) -> Result<Vec<Keypoint>, ImageError> {
        let r = CIRCLE_RADIUS;
        if src.cols() <= 2 * r || src.rows() <= 2 * r {
            return Ok(Vec::new());
        }

        let padded = pad_uniform(src, r, self.border_mode)?;
        let stride = padded.cols();
        let data = padded.as_slice();

        // process rows in parallel, collect keeps the row order
        let rows = (r..src.rows() - r)
            .into_par_iter()
            .map(|y| {
                let mut row_keypoints = Vec::new();
                let mut passed = 0usize;

                for x in r..src.cols() - r {
                    let (px, py) = (x + r, y + r);
                    let center = data[py * stride + px];
                    let ring = self.ring(data, stride, px, py);

                    let polarity = self.high_speed_test(center, &ring);
                    if polarity == Polarity::None {
                        continue;
                    }
                    passed += 1;

                    if self.arc_test(center, &ring, polarity) {
                        row_keypoints.push(
                            Keypoint::new(x as f32, y as f32).with_size(self.keypoint_size),
                        );
                    }
                }

                (row_keypoints, passed)
            })
            .collect::<Vec<_>>();

        let evaluated = (src.cols() - 2 * r) * (src.rows() - 2 * r);
        let passed = rows.iter().map(|(_, p)| p).sum::<usize>();
        let keypoints = rows.into_iter().flat_map(|(kps, _)| kps).collect::<Vec<_>>();

        log::trace!(
            "fast scan: {} evaluated, {} passed the high-speed test, {} accepted",
            evaluated,
            passed,
            keypoints.len()
        );

        Ok(keypoints)
    }

    /// Gather the circle samples around `(x, y)` of a row-major buffer.
    ///
    /// PRECONDITION: the whole circle lies inside the buffer.
    fn ring(&self, data: &[f32], stride: usize, x: usize, y: usize) -> [f32; 16] {
        self.offsets.map(|[dx, dy]| {
            let sx = (x as isize + dx as isize) as usize;
            let sy = (y as isize + dy as isize) as usize;
            data[sy * stride + sx]
        })
    }
}
