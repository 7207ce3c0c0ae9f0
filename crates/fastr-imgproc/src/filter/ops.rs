use fastr_image::{Image, ImageError};
use rayon::prelude::*;

use super::{kernels, separable_filter};
use crate::padding::PaddingMode;

fn check_same_size<const C1: usize, const C2: usize>(
    a: &Image<f32, C1>,
    b: &Image<f32, C2>,
) -> Result<(), ImageError> {
    if a.size() != b.size() {
        return Err(ImageError::InvalidImageSize(
            a.cols(),
            a.rows(),
            b.cols(),
            b.rows(),
        ));
    }
    Ok(())
}

/// Correlate an image with a dense 2D kernel.
///
/// `dst(x, y) = sum k[j][i] * src(x + i - kw / 2, y + j - kh / 2)`, the kernel
/// is not flipped. Samples outside the image are fetched according to
/// `border_mode`.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel` - The row-major kernel taps.
/// * `kernel_size` - The size of the kernel (width, height).
/// * `border_mode` - How samples outside the image are fetched.
///
/// # Errors
///
/// Returns an error if the images differ in size or the kernel does not hold
/// `width * height > 0` taps.
pub fn filter2d<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel: &[f32],
    kernel_size: (usize, usize),
    border_mode: PaddingMode,
) -> Result<(), ImageError> {
    check_same_size(src, dst)?;

    let (kw, kh) = kernel_size;
    if kernel.is_empty() || kernel.len() != kw * kh {
        return Err(ImageError::InvalidChannelShape(kernel.len(), kw * kh));
    }

    if src.is_empty() {
        return Ok(());
    }

    let rows = src.rows();
    let cols = src.cols();
    let half_w = (kw / 2) as isize;
    let half_h = (kh / 2) as isize;
    let src_data = src.as_slice();

    dst.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, dst_row)| {
            for c in 0..cols {
                let mut acc = [0.0f32; C];
                for (j, kernel_row) in kernel.chunks_exact(kw).enumerate() {
                    let y = border_mode.map_index(r as isize + j as isize - half_h, rows);
                    for (i, &k) in kernel_row.iter().enumerate() {
                        let x = border_mode.map_index(c as isize + i as isize - half_w, cols);
                        let offset = (y * cols + x) * C;
                        for (acc_val, &v) in acc.iter_mut().zip(&src_data[offset..offset + C]) {
                            *acc_val += v * k;
                        }
                    }
                }
                dst_row[c * C..(c + 1) * C].copy_from_slice(&acc);
            }
        });

    Ok(())
}

/// Blur an image using a gaussian blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The size of the kernel (kernel_x, kernel_y).
/// * `sigma` - The sigma of the gaussian kernel.
/// * `border_mode` - How samples outside the image are fetched.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn gaussian_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_size: (usize, usize),
    sigma: (f32, f32),
    border_mode: PaddingMode,
) -> Result<(), ImageError> {
    let kernel_x = kernels::gaussian_kernel_1d(kernel_size.0, sigma.0);
    let kernel_y = kernels::gaussian_kernel_1d(kernel_size.1, sigma.1);
    separable_filter(src, dst, &kernel_x, &kernel_y, border_mode)?;
    Ok(())
}

/// Compute the first order image derivative in both x and y using a 3x3 Sobel operator.
///
/// Both kernels are evaluated in a single pass over each row. The kernels are
/// not normalized and are applied by correlation.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dx` - The horizontal derivative with shape (H, W, C).
/// * `dy` - The vertical derivative with shape (H, W, C).
/// * `border_mode` - How samples outside the image are fetched.
pub fn spatial_gradient<const C: usize>(
    src: &Image<f32, C>,
    dx: &mut Image<f32, C>,
    dy: &mut Image<f32, C>,
    border_mode: PaddingMode,
) -> Result<(), ImageError> {
    check_same_size(src, dx)?;
    check_same_size(src, dy)?;

    if src.is_empty() {
        return Ok(());
    }

    let (sobel_x, sobel_y) = kernels::sobel_kernel3();
    let rows = src.rows();
    let cols = src.cols();
    let src_data = src.as_slice();

    dx.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .zip(dy.as_slice_mut().par_chunks_exact_mut(cols * C))
        .enumerate()
        .for_each(|(r, (dx_row, dy_row))| {
            let row_idx = [-1isize, 0, 1].map(|d| border_mode.map_index(r as isize + d, rows));
            for c in 0..cols {
                let col_idx =
                    [-1isize, 0, 1].map(|d| border_mode.map_index(c as isize + d, cols));
                let mut sum_x = [0.0f32; C];
                let mut sum_y = [0.0f32; C];
                for (ky, &y) in row_idx.iter().enumerate() {
                    for (kx, &x) in col_idx.iter().enumerate() {
                        let offset = (y * cols + x) * C;
                        for ch in 0..C {
                            let v = src_data[offset + ch];
                            sum_x[ch] += v * sobel_x[ky][kx];
                            sum_y[ch] += v * sobel_y[ky][kx];
                        }
                    }
                }
                dx_row[c * C..(c + 1) * C].copy_from_slice(&sum_x);
                dy_row[c * C..(c + 1) * C].copy_from_slice(&sum_y);
            }
        });

    Ok(())
}
