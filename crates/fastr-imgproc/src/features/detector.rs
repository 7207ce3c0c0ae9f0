use fastr_image::{Image, ImageDtype, ImageSize};
use serde::{Deserialize, Serialize};

use super::{
    hybrid_gate, response_keypoints, DetectorError, FastConfig, FastScanner, HarrisConfig,
    HarrisResponse, Keypoint, CIRCLE_OFFSETS,
};
use crate::{
    color::{gray_normalized, ChannelOrder},
    padding::PaddingMode,
    parallel::ExecutionStrategy,
};

/// Which detector the [`CornerDetector`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectorMode {
    /// FAST candidates kept where the normalized Harris response passes the gate.
    #[default]
    Hybrid,
    /// FAST candidates only.
    Fast,
    /// Every interior pixel whose normalized Harris response passes the gate.
    Harris,
}

/// Configuration of the [`CornerDetector`].
///
/// Missing fields take their default value when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// The detector to run.
    pub mode: DetectorMode,
    /// Parameters of the FAST scanner.
    pub fast: FastConfig,
    /// Parameters of the Harris response.
    pub harris: HarrisConfig,
    /// The normalized Harris response must be strictly above this value.
    pub gate_threshold: f32,
    /// Channel order of color input.
    pub channel_order: ChannelOrder,
    /// Border handling of the padding and the filters.
    pub border_mode: PaddingMode,
    /// Thread pool the pipeline runs on.
    pub strategy: ExecutionStrategy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            mode: DetectorMode::default(),
            fast: FastConfig::default(),
            harris: HarrisConfig::default(),
            gate_threshold: 0.35,
            channel_order: ChannelOrder::default(),
            border_mode: PaddingMode::Reflect101,
            strategy: ExecutionStrategy::default(),
        }
    }
}

impl DetectorConfig {
    /// Set the detector mode.
    pub fn with_mode(mut self, mode: DetectorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the FAST parameters.
    pub fn with_fast(mut self, fast: FastConfig) -> Self {
        self.fast = fast;
        self
    }

    /// Set the Harris parameters.
    pub fn with_harris(mut self, harris: HarrisConfig) -> Self {
        self.harris = harris;
        self
    }

    /// Set the gate threshold.
    pub fn with_gate_threshold(mut self, gate_threshold: f32) -> Self {
        self.gate_threshold = gate_threshold;
        self
    }

    /// Set the channel order of color input.
    pub fn with_channel_order(mut self, channel_order: ChannelOrder) -> Self {
        self.channel_order = channel_order;
        self
    }

    /// Set the border mode.
    pub fn with_border_mode(mut self, border_mode: PaddingMode) -> Self {
        self.border_mode = border_mode;
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check that every value is in its valid range.
    pub fn validate(&self) -> Result<(), DetectorError> {
        fn invalid(msg: String) -> Result<(), DetectorError> {
            Err(DetectorError::InvalidConfig(msg))
        }

        let fast = &self.fast;
        if !fast.threshold.is_finite() || fast.threshold < 0.0 {
            return invalid(format!("fast threshold must be >= 0, got {}", fast.threshold));
        }
        if !fast.keypoint_size.is_finite() || fast.keypoint_size <= 0.0 {
            return invalid(format!(
                "keypoint size must be > 0, got {}",
                fast.keypoint_size
            ));
        }

        let harris = &self.harris;
        if harris.gaussian_kernel_size % 2 == 0 {
            return invalid(format!(
                "gaussian kernel size must be odd, got {}",
                harris.gaussian_kernel_size
            ));
        }
        if !harris.gaussian_sigma.is_finite() || harris.gaussian_sigma <= 0.0 {
            return invalid(format!(
                "gaussian sigma must be > 0, got {}",
                harris.gaussian_sigma
            ));
        }
        if !harris.k.is_finite() {
            return invalid(format!("harris k must be finite, got {}", harris.k));
        }

        if !self.gate_threshold.is_finite() || self.gate_threshold < 0.0 {
            return invalid(format!(
                "gate threshold must be >= 0, got {}",
                self.gate_threshold
            ));
        }

        Ok(())
    }
}

/// Diagnostics of a single detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    /// Size of the input image.
    pub image_size: ImageSize,
    /// Number of FAST candidates, zero in [`DetectorMode::Harris`].
    pub candidates: usize,
    /// Number of reported keypoints.
    pub keypoints: usize,
    /// Whether the Harris response was flat. Always `false` in [`DetectorMode::Fast`].
    pub degenerate_response: bool,
}

/// Corner detector combining the FAST segment test and the Harris response.
///
/// # Example
///
/// ```
/// use fastr_image::Image;
/// use fastr_imgproc::features::{CornerDetector, DetectorConfig, DetectorMode};
///
/// let image = Image::<f32, 1>::from_size_val([16, 16].into(), 0.5).unwrap();
/// let detector = CornerDetector::new(DetectorConfig::default().with_mode(DetectorMode::Fast)).unwrap();
///
/// let (keypoints, report) = detector.detect_with_report(&image).unwrap();
/// assert!(keypoints.is_empty());
/// assert_eq!(report.candidates, 0);
/// ```
#[derive(Debug, Clone)]
pub struct CornerDetector {
    config: DetectorConfig,
    offsets: [[i32; 2]; 16],
}

impl CornerDetector {
    /// Create a detector, validating the configuration.
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        config.validate()?;
        Ok(Self {
            config,
            offsets: CIRCLE_OFFSETS,
        })
    }

    /// Replace the circle offset table of the FAST scanner.
    ///
    /// Every offset must lie within [`CIRCLE_RADIUS`](super::CIRCLE_RADIUS) of the center
    /// in both axes.
    pub fn with_offsets(mut self, offsets: [[i32; 2]; 16]) -> Result<Self, DetectorError> {
        FastScanner::with_offsets(&self.config.fast, offsets)?;
        self.offsets = offsets;
        Ok(self)
    }

    /// The configuration of the detector.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect corners in an image.
    ///
    /// # Arguments
    ///
    /// * `src` - The input image with 1, 3 or 4 channels.
    ///
    /// # Returns
    ///
    /// The keypoints in raster order, empty for an empty image.
    pub fn detect<T, const C: usize>(&self, src: &Image<T, C>) -> Result<Vec<Keypoint>, DetectorError>
    where
        T: ImageDtype,
    {
        Ok(self.detect_with_report(src)?.0)
    }

    /// Detect corners in an image and report statistics of the run.
    pub fn detect_with_report<T, const C: usize>(
        &self,
        src: &Image<T, C>,
    ) -> Result<(Vec<Keypoint>, DetectionReport), DetectorError>
    where
        T: ImageDtype,
    {
        self.config.strategy.install(|| self.run(src))?
    }

    fn run<T, const C: usize>(
        &self,
        src: &Image<T, C>,
    ) -> Result<(Vec<Keypoint>, DetectionReport), DetectorError>
    where
        T: ImageDtype,
    {
        let gray = gray_normalized(src, self.config.channel_order)?;

        let scanner = FastScanner::with_offsets(&self.config.fast, self.offsets)?
            .with_border_mode(self.config.border_mode);
        let harris =
            HarrisResponse::new(self.config.harris).with_border_mode(self.config.border_mode);
        let gate = self.config.gate_threshold;

        let (keypoints, candidates, degenerate_response) = match self.config.mode {
            DetectorMode::Fast => {
                let keypoints = scanner.scan(&gray)?;
                let candidates = keypoints.len();
                (keypoints, candidates, false)
            }
            DetectorMode::Harris => {
                let (response, degenerate) = harris.compute_normalized(&gray)?;
                let keypoints = if degenerate {
                    Vec::new()
                } else {
                    response_keypoints(&response, gate, self.config.fast.keypoint_size)
                };
                (keypoints, 0, degenerate)
            }
            DetectorMode::Hybrid => {
                // both branches only read the normalized image
                let (candidates, response) =
                    rayon::join(|| scanner.scan(&gray), || harris.compute_normalized(&gray));
                let candidates = candidates?;
                let (response, degenerate) = response?;

                let keypoints = if degenerate {
                    Vec::new()
                } else {
                    hybrid_gate(&candidates, &response, gate)
                };
                (keypoints, candidates.len(), degenerate)
            }
        };

        let report = DetectionReport {
            image_size: src.size(),
            candidates,
            keypoints: keypoints.len(),
            degenerate_response,
        };

        log::debug!(
            "{:?} detection on {}: {} candidates, {} keypoints, degenerate response: {}",
            self.config.mode,
            report.image_size,
            report.candidates,
            report.keypoints,
            report.degenerate_response
        );

        Ok((keypoints, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ParallelError;
    use fastr_image::ImageError;

    fn dot_image() -> Result<Image<u8, 1>, ImageError> {
        let mut image = Image::<u8, 1>::from_size_val([24, 20].into(), 25)?;
        image.as_slice_mut()[9 * 24 + 12] = 230;
        Ok(image)
    }

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.mode, DetectorMode::Hybrid);
        assert_eq!(config.gate_threshold, 0.35);
        assert_eq!(config.fast.threshold, 0.1);
        assert_eq!(config.fast.keypoint_size, 7.0);
        assert_eq!(config.border_mode, PaddingMode::Reflect101);
        assert_eq!(config.channel_order, ChannelOrder::Rgb);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        let configs = [
            DetectorConfig::default().with_gate_threshold(-0.1),
            DetectorConfig::default().with_gate_threshold(f32::NAN),
            DetectorConfig::default().with_fast(FastConfig::default().with_threshold(-1.0)),
            DetectorConfig::default().with_fast(FastConfig::default().with_keypoint_size(0.0)),
            DetectorConfig::default().with_harris(HarrisConfig::default().with_gaussian(4, 1.0)),
            DetectorConfig::default().with_harris(HarrisConfig::default().with_gaussian(5, 0.0)),
            DetectorConfig::default().with_harris(HarrisConfig::default().with_k(f32::INFINITY)),
        ];

        for config in configs {
            assert!(
                matches!(
                    CornerDetector::new(config.clone()),
                    Err(DetectorError::InvalidConfig(_))
                ),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_with_offsets_rejects_wide_circle() -> Result<(), DetectorError> {
        let mut offsets = CIRCLE_OFFSETS;
        offsets[3] = [4, -1];
        let res = CornerDetector::new(DetectorConfig::default())?.with_offsets(offsets);
        assert!(matches!(res, Err(DetectorError::InvalidConfig(_))));
        Ok(())
    }

    #[test]
    fn test_detect_modes() -> Result<(), DetectorError> {
        let image = dot_image()?;

        let hybrid = CornerDetector::new(DetectorConfig::default())?;
        let (keypoints, report) = hybrid.detect_with_report(&image)?;
        assert_eq!(keypoints, vec![Keypoint::new(12.0, 9.0)]);
        assert_eq!(
            report,
            DetectionReport {
                image_size: image.size(),
                candidates: 1,
                keypoints: 1,
                degenerate_response: false,
            }
        );

        let fast = CornerDetector::new(DetectorConfig::default().with_mode(DetectorMode::Fast))?;
        assert_eq!(fast.detect(&image)?, keypoints);

        // the response is high in the 3x3 neighbourhood of the dot
        let harris =
            CornerDetector::new(DetectorConfig::default().with_mode(DetectorMode::Harris))?;
        let (harris_keypoints, report) = harris.detect_with_report(&image)?;
        assert_eq!(harris_keypoints.len(), 9);
        assert_eq!(report.candidates, 0);
        assert!(harris_keypoints.contains(&Keypoint::new(12.0, 9.0)));
        Ok(())
    }

    #[test]
    fn test_detect_constant_image() -> Result<(), DetectorError> {
        let image = Image::<f32, 3>::from_size_val([16, 16].into(), 0.5)?;

        for mode in [DetectorMode::Hybrid, DetectorMode::Harris] {
            let detector = CornerDetector::new(
                DetectorConfig::default()
                    .with_mode(mode)
                    .with_gate_threshold(0.0),
            )?;
            let (keypoints, report) = detector.detect_with_report(&image)?;
            assert!(keypoints.is_empty());
            assert!(report.degenerate_response);
        }
        Ok(())
    }

    #[test]
    fn test_detect_empty_image() -> Result<(), DetectorError> {
        let detector = CornerDetector::new(DetectorConfig::default())?;
        let (keypoints, report) = detector.detect_with_report(&Image::<u8, 3>::empty())?;
        assert!(keypoints.is_empty());
        assert_eq!(report.candidates, 0);
        assert_eq!(report.image_size, ImageSize::default());
        assert!(!report.degenerate_response);

        let harris =
            CornerDetector::new(DetectorConfig::default().with_mode(DetectorMode::Harris))?;
        let (_, report) = harris.detect_with_report(&Image::<u8, 1>::empty())?;
        assert!(!report.degenerate_response);
        Ok(())
    }

    #[test]
    fn test_detect_unsupported_channels() -> Result<(), DetectorError> {
        let detector = CornerDetector::new(DetectorConfig::default())?;
        let image = Image::<u8, 2>::from_size_val([8, 8].into(), 0)?;
        assert_eq!(
            detector.detect(&image),
            Err(DetectorError::Image(ImageError::UnsupportedChannelCount(2)))
        );
        Ok(())
    }

    #[test]
    fn test_detect_invalid_strategy() -> Result<(), DetectorError> {
        let detector = CornerDetector::new(
            DetectorConfig::default().with_strategy(ExecutionStrategy::Fixed(0)),
        )?;
        assert_eq!(
            detector.detect(&dot_image()?),
            Err(DetectorError::Parallel(ParallelError::InvalidThreadCount(0)))
        );
        Ok(())
    }
}
