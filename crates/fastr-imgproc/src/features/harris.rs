use fastr_image::{Image, ImageError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Keypoint, CIRCLE_RADIUS};
use crate::{
    filter::{gaussian_blur, spatial_gradient},
    padding::PaddingMode,
    parallel,
};

/// Parameters of the Harris response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarrisConfig {
    /// Size of the Gaussian window smoothing the gradient products.
    pub gaussian_kernel_size: usize,
    /// Sigma of the Gaussian window, in both axes.
    pub gaussian_sigma: f32,
    /// Weight of the squared trace in `det - k * trace^2`.
    pub k: f32,
}

impl Default for HarrisConfig {
    fn default() -> Self {
        Self {
            gaussian_kernel_size: 5,
            gaussian_sigma: 1.0,
            k: 0.05,
        }
    }
}

impl HarrisConfig {
    /// Set the trace weight.
    pub fn with_k(mut self, k: f32) -> Self {
        self.k = k;
        self
    }

    /// Set the Gaussian window.
    pub fn with_gaussian(mut self, kernel_size: usize, sigma: f32) -> Self {
        self.gaussian_kernel_size = kernel_size;
        self.gaussian_sigma = sigma;
        self
    }
}

/// The smoothed second moment products of the image gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureTensor {
    /// Smoothed `Ix * Ix`.
    pub sxx: Image<f32, 1>,
    /// Smoothed `Iy * Iy`.
    pub syy: Image<f32, 1>,
    /// Smoothed `Ix * Iy`.
    pub sxy: Image<f32, 1>,
}

/// Compute the structure tensor of a grayscale image.
///
/// The gradient is taken with the 3x3 Sobel kernels, the products are smoothed
/// with a separable Gaussian window. Both use `border_mode` at the borders.
pub fn structure_tensor(
    src: &Image<f32, 1>,
    config: &HarrisConfig,
    border_mode: PaddingMode,
) -> Result<StructureTensor, ImageError> {
    if src.is_empty() {
        return Ok(StructureTensor {
            sxx: Image::empty(),
            syy: Image::empty(),
            sxy: Image::empty(),
        });
    }

    let mut dx = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    let mut dy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    spatial_gradient(src, &mut dx, &mut dy, border_mode)?;

    let mut dx2 = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    let mut dy2 = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    let mut dxy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    parallel::par_iter_rows_val_two(&dx, &dx, &mut dx2, |a, b, dst| *dst = a * b);
    parallel::par_iter_rows_val_two(&dy, &dy, &mut dy2, |a, b, dst| *dst = a * b);
    parallel::par_iter_rows_val_two(&dx, &dy, &mut dxy, |a, b, dst| *dst = a * b);

    let ksize = (config.gaussian_kernel_size, config.gaussian_kernel_size);
    let sigma = (config.gaussian_sigma, config.gaussian_sigma);

    let mut sxx = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    let mut syy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    let mut sxy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    gaussian_blur(&dx2, &mut sxx, ksize, sigma, border_mode)?;
    gaussian_blur(&dy2, &mut syy, ksize, sigma, border_mode)?;
    gaussian_blur(&dxy, &mut sxy, ksize, sigma, border_mode)?;

    Ok(StructureTensor { sxx, syy, sxy })
}

/// Computes the raw Harris response `det - k * trace^2` of a structure tensor.
///
/// # Arguments
///
/// * `tensor` - The structure tensor with maps of shape (H, W).
/// * `k` - The trace weight.
/// * `dst` - The response with shape (H, W).
pub fn harris_response(
    tensor: &StructureTensor,
    k: f32,
    dst: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    for map in [&tensor.syy, &tensor.sxy, &*dst] {
        if map.size() != tensor.sxx.size() {
            return Err(ImageError::InvalidImageSize(
                tensor.sxx.cols(),
                tensor.sxx.rows(),
                map.cols(),
                map.rows(),
            ));
        }
    }

    let cols = dst.cols();
    if dst.is_empty() {
        return Ok(());
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(cols)
        .zip(tensor.sxx.as_slice().par_chunks_exact(cols))
        .zip(tensor.syy.as_slice().par_chunks_exact(cols))
        .zip(tensor.sxy.as_slice().par_chunks_exact(cols))
        .for_each(|(((dst_row, sxx_row), syy_row), sxy_row)| {
            dst_row
                .iter_mut()
                .zip(sxx_row)
                .zip(syy_row)
                .zip(sxy_row)
                .for_each(|(((dst_pixel, &sxx), &syy), &sxy)| {
                    let det = sxx * syy - sxy * sxy;
                    let trace = sxx + syy;
                    *dst_pixel = det - k * trace * trace;
                });
        });

    Ok(())
}

/// Min-max normalize a response map into `[0, 1]` in place.
///
/// Returns `true` if the map is degenerate, i.e. its maximum does not exceed
/// its minimum. A degenerate map is set to zero. An empty map is left as is
/// and is not degenerate.
pub fn normalize_response(response: &mut Image<f32, 1>) -> bool {
    if response.is_empty() {
        return false;
    }

    let (min, max) = response
        .as_slice()
        .par_iter()
        .fold(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &v| (min.min(v), max.max(v)),
        )
        .reduce(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(a_min, a_max), (b_min, b_max)| (a_min.min(b_min), a_max.max(b_max)),
        );

    let degenerate = max <= min;
    let range = max - min;

    parallel::par_iter_rows_mut(response, |_, row| {
        row.iter_mut().for_each(|v| {
            *v = if degenerate { 0.0 } else { (*v - min) / range };
        });
    });

    degenerate
}

/// Harris corner strength over a normalized grayscale image.
#[derive(Debug, Clone)]
pub struct HarrisResponse {
    config: HarrisConfig,
    border_mode: PaddingMode,
}

impl Default for HarrisResponse {
    fn default() -> Self {
        Self::new(HarrisConfig::default())
    }
}

impl HarrisResponse {
    /// Create a response operator with the given parameters.
    pub fn new(config: HarrisConfig) -> Self {
        Self {
            config,
            border_mode: PaddingMode::Reflect101,
        }
    }

    /// Set the trace weight.
    pub fn with_k(mut self, k: f32) -> Self {
        self.config.k = k;
        self
    }

    /// Set the border mode of the gradient and the smoothing.
    pub fn with_border_mode(mut self, border_mode: PaddingMode) -> Self {
        self.border_mode = border_mode;
        self
    }

    /// The parameters of the operator.
    pub fn config(&self) -> &HarrisConfig {
        &self.config
    }

    /// Compute the raw response `det - k * trace^2`.
    pub fn compute(&self, src: &Image<f32, 1>) -> Result<Image<f32, 1>, ImageError> {
        let tensor = structure_tensor(src, &self.config, self.border_mode)?;
        if src.is_empty() {
            return Ok(Image::empty());
        }

        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
        harris_response(&tensor, self.config.k, &mut dst)?;
        Ok(dst)
    }

    /// Compute the response normalized into `[0, 1]`.
    ///
    /// Returns the map together with the degenerate flag of [`normalize_response`].
    pub fn compute_normalized(
        &self,
        src: &Image<f32, 1>,
    ) -> Result<(Image<f32, 1>, bool), ImageError> {
        let mut response = self.compute(src)?;
        let degenerate = normalize_response(&mut response);
        Ok((response, degenerate))
    }
}

/// Keypoints at every pixel at least [`CIRCLE_RADIUS`] away from the border
/// whose response is strictly above `threshold`, in raster order.
pub fn response_keypoints(
    response: &Image<f32, 1>,
    threshold: f32,
    keypoint_size: f32,
) -> Vec<Keypoint> {
    let r = CIRCLE_RADIUS;
    let (cols, rows) = (response.cols(), response.rows());
    if cols <= 2 * r || rows <= 2 * r {
        return Vec::new();
    }

    let data = response.as_slice();
    (r..rows - r)
        .into_par_iter()
        .flat_map_iter(|y| {
            (r..cols - r)
                .filter(move |&x| data[y * cols + x] > threshold)
                .map(move |x| Keypoint::new(x as f32, y as f32).with_size(keypoint_size))
        })
        .collect()
}
