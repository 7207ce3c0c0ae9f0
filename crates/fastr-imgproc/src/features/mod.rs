//! Corner detection.
//!
//! The detectors in this module turn an image into a list of distinctive
//! points, useful for:
//!
//! - Image matching and registration
//! - Panorama stitching
//! - Object tracking
//!
//! # Available Detectors
//!
//! - **FAST**: segment test on a radius 3 circle, see [`FastScanner`].
//! - **Harris**: structure tensor corner strength, see [`HarrisResponse`].
//! - **Hybrid**: FAST candidates gated by the Harris response, see [`CornerDetector`].
//!
//! # Examples
//!
//! ```
//! use fastr_image::Image;
//! use fastr_imgproc::features::{CornerDetector, DetectorConfig};
//!
//! let mut image = Image::<u8, 1>::from_size_val([32, 32].into(), 20).unwrap();
//! image.as_slice_mut()[16 * 32 + 16] = 230;
//!
//! let detector = CornerDetector::new(DetectorConfig::default()).unwrap();
//! let keypoints = detector.detect(&image).unwrap();
//!
//! assert_eq!(keypoints.len(), 1);
//! assert_eq!((keypoints[0].x, keypoints[0].y), (16.0, 16.0));
//! ```

mod error;
pub use error::*;

mod keypoint;
pub use keypoint::*;

mod fast;
pub use fast::*;

mod harris;
pub use harris::*;

mod gate;
pub use gate::*;

mod detector;
pub use detector::*;
