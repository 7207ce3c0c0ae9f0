use fastr_image::{Image, ImageError};
use rayon::prelude::*;

use crate::padding::PaddingMode;

/// A separable 2D filter that applies horizontal and vertical 1D correlations sequentially.
///
/// This struct caches the kernel data and the tap offsets relative to the center.
struct SeparableFilter<'a> {
    kernel_x: &'a [f32],
    kernel_y: &'a [f32],
    offsets_x: Vec<isize>,
    offsets_y: Vec<isize>,
    border_mode: PaddingMode,
}

impl<'a> SeparableFilter<'a> {
    fn new(kernel_x: &'a [f32], kernel_y: &'a [f32], border_mode: PaddingMode) -> Self {
        let half_x = (kernel_x.len() / 2) as isize;
        let half_y = (kernel_y.len() / 2) as isize;

        Self {
            kernel_x,
            kernel_y,
            offsets_x: (0..kernel_x.len() as isize).map(|i| i - half_x).collect(),
            offsets_y: (0..kernel_y.len() as isize).map(|i| i - half_y).collect(),
            border_mode,
        }
    }

    /// Horizontal pass into `temp`, then vertical pass into `dst`.
    fn apply<const C: usize>(&self, src: &Image<f32, C>, dst: &mut Image<f32, C>) {
        let rows = src.rows();
        let cols = src.cols();
        let row_len = cols * C;
        let src_data = src.as_slice();

        let mut temp = vec![0.0f32; src_data.len()];

        // horizontal
        temp.par_chunks_exact_mut(row_len)
            .zip(src_data.par_chunks_exact(row_len))
            .for_each(|(temp_row, src_row)| {
                for c in 0..cols {
                    let mut acc = [0.0f32; C];
                    for (&k, &off) in self.kernel_x.iter().zip(self.offsets_x.iter()) {
                        let x = self.border_mode.map_index(c as isize + off, cols);
                        let src_pixel = &src_row[x * C..(x + 1) * C];
                        for (acc_val, &v) in acc.iter_mut().zip(src_pixel) {
                            *acc_val += v * k;
                        }
                    }
                    temp_row[c * C..(c + 1) * C].copy_from_slice(&acc);
                }
            });

        // vertical
        dst.as_slice_mut()
            .par_chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(r, dst_row)| {
                dst_row.iter_mut().for_each(|v| *v = 0.0);
                for (&k, &off) in self.kernel_y.iter().zip(self.offsets_y.iter()) {
                    let y = self.border_mode.map_index(r as isize + off, rows);
                    let temp_row = &temp[y * row_len..(y + 1) * row_len];
                    for (d, &t) in dst_row.iter_mut().zip(temp_row) {
                        *d += t * k;
                    }
                }
            });
    }
}

/// Apply a separable filter to an image.
///
/// The kernels are correlated with the image, first along the rows and then
/// along the columns. Samples outside the image are fetched according to
/// `border_mode`.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
/// * `border_mode` - How samples outside the image are fetched.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn separable_filter<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    border_mode: PaddingMode,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if src.is_empty() {
        return Ok(());
    }

    SeparableFilter::new(kernel_x, kernel_y, border_mode).apply(src, dst);

    Ok(())
}
