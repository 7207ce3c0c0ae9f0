use fastr_image::{Image, ImageError, ImageSize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A border type for the spatial padding and the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddingMode {
    /// This border type takes the outermost row or column of pixels and repeats it into the padded region.
    ///
    /// Example: ...d c b a | a a a a...
    Replicate,

    /// This border type reflects the pixel values at the boundary, starting with the pixel 'next' to the edge.
    ///
    /// Example: ...d c b a | b c d e...
    #[default]
    Reflect101,

    /// This border type reflects the pixel values at the boundary, starting with the edge pixel itself.
    ///
    /// Example: ...d c b a | a b c d...
    Reflect,
}

impl PaddingMode {
    #[inline]
    fn reflect(i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i - 1;
            } else if i >= len {
                i = 2 * len - i - 1;
            }
        }
        i as usize
    }

    #[inline]
    fn reflect101(i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i;
            } else if i >= len {
                i = 2 * len - i - 2;
            }
        }
        i as usize
    }

    /// Maps index `i` to a valid index i.e. within `[0, len)` according to the padding mode.
    ///
    /// - `Replicate`: clamp to edge
    /// - `Reflect`: mirror including edge
    /// - `Reflect101`: mirror excluding edge
    ///
    /// PRECONDITION: `len > 0`.
    ///
    /// # Arguments
    /// - `i`: The (possibly out-of-range) coordinate index.
    /// - `len`: The valid length of the dimension.
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> usize {
        match self {
            PaddingMode::Replicate => i.clamp(0, len as isize - 1) as usize,
            PaddingMode::Reflect => Self::reflect(i, len),
            PaddingMode::Reflect101 => Self::reflect101(i, len),
        }
    }
}

/// Represents 2D padding with top, bottom, left, and right values (in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding2D {
    /// Amount of padding to add on the top side.
    pub top: usize,
    /// Amount of padding to add on the bottom side.
    pub bottom: usize,
    /// Amount of padding to add on the left side.
    pub left: usize,
    /// Amount of padding to add on the right side.
    pub right: usize,
}

impl Padding2D {
    /// The same padding on all four sides.
    pub fn uniform(pad: usize) -> Self {
        Self {
            top: pad,
            bottom: pad,
            left: pad,
            right: pad,
        }
    }

    /// The size of an image of size `size` after applying this padding.
    pub fn padded_size(&self, size: ImageSize) -> ImageSize {
        ImageSize {
            width: size.width + self.left + self.right,
            height: size.height + self.top + self.bottom,
        }
    }
}

/// Pads `src` into `dst`, centering the source image and filling the border
/// according to `padding_mode`.
///
/// Every destination pixel is read from the source through
/// [`PaddingMode::map_index`], so the padding may be wider than the image.
///
/// An empty source leaves `dst` untouched.
///
/// # Errors
///
/// Returns an error if the size of `dst` does not match with the expected size
/// i.e. after applying padding specified in argument `padding` on `src`.
///
/// # Example
///
/// ```rust
/// use fastr_image::Image;
/// use fastr_imgproc::padding::{spatial_padding, Padding2D, PaddingMode};
///
/// let src = Image::<f32, 1>::new([3, 1].into(), vec![1.0, 2.0, 3.0]).unwrap();
/// let padding = Padding2D { top: 0, bottom: 0, left: 2, right: 2 };
/// let mut dst = Image::<f32, 1>::from_size_val(padding.padded_size(src.size()), 0.0).unwrap();
///
/// spatial_padding(&src, &mut dst, padding, PaddingMode::Reflect101).unwrap();
/// assert_eq!(dst.as_slice(), &[3.0, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0]);
/// ```
pub fn spatial_padding<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    padding: Padding2D,
    padding_mode: PaddingMode,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    let expected = padding.padded_size(src.size());
    if expected != dst.size() {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            expected.width,
            expected.height,
        ));
    }

    if src.is_empty() {
        return Ok(());
    }

    // source column of every destination column, shared by all rows
    let src_cols = (0..dst.cols())
        .map(|x| padding_mode.map_index(x as isize - padding.left as isize, src.cols()))
        .collect::<Vec<_>>();

    let (src_rows, src_data) = (src.rows(), src.as_slice());
    let src_row_stride = src.cols() * C;

    dst.as_slice_mut()
        .par_chunks_exact_mut(src_cols.len() * C)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let src_y = padding_mode.map_index(y as isize - padding.top as isize, src_rows);
            let src_row = &src_data[src_y * src_row_stride..(src_y + 1) * src_row_stride];

            dst_row
                .chunks_exact_mut(C)
                .zip(src_cols.iter())
                .for_each(|(dst_pixel, &src_x)| {
                    dst_pixel.copy_from_slice(&src_row[src_x * C..(src_x + 1) * C]);
                });
        });

    Ok(())
}

/// Pads `src` by `pad` pixels on every side and returns the padded image.
pub fn pad_uniform<T, const C: usize>(
    src: &Image<T, C>,
    pad: usize,
    padding_mode: PaddingMode,
) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Default + Send + Sync,
{
    if src.is_empty() {
        return Ok(Image::empty());
    }

    let padding = Padding2D::uniform(pad);
    let mut dst = Image::from_size_val(padding.padded_size(src.size()), T::default())?;
    spatial_padding(src, &mut dst, padding, padding_mode)?;

    Ok(dst)
}
