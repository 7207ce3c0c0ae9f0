use fastr_image::{Image, ImageDtype, ImageError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::parallel;

/// Define the RGB weights for the grayscale conversion.
const RW: f32 = 0.299;
const GW: f32 = 0.587;
const BW: f32 = 0.114;

/// The order in which the color channels of a pixel are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Red first, as produced by most image decoders.
    #[default]
    Rgb,
    /// Blue first, as produced by OpenCV style buffers.
    Bgr,
}

impl ChannelOrder {
    /// The storage positions of the red, green and blue channels.
    pub fn rgb_indices(&self) -> [usize; 3] {
        match self {
            ChannelOrder::Rgb => [0, 1, 2],
            ChannelOrder::Bgr => [2, 1, 0],
        }
    }
}

/// Convert an image to a single channel `f32` intensity field in `[0, 1]`.
///
/// Three and four channel images are reduced with the formula:
///
/// Y = 0.299 * R + 0.587 * G + 0.114 * B
///
/// where the position of R and B is given by `order`. A fourth channel is
/// treated as alpha and ignored.
///
/// Integer samples are divided by their full scale value. Floating samples are
/// kept as they are if the whole field lies in `[0, 1]`, otherwise the field
/// is min-max rescaled; a constant field outside `[0, 1]` becomes zero.
///
/// # Arguments
///
/// * `src` - The input image with 1, 3 or 4 channels.
/// * `order` - The channel order of color images.
///
/// # Returns
///
/// The normalized grayscale image. An empty input gives an empty output.
///
/// # Errors
///
/// Returns [`ImageError::UnsupportedChannelCount`] for 2 or more than 4 channels.
///
/// # Example
///
/// ```
/// use fastr_image::Image;
/// use fastr_imgproc::color::{gray_normalized, ChannelOrder};
///
/// let image = Image::<u8, 3>::new([2, 1].into(), vec![255, 255, 255, 0, 0, 0]).unwrap();
/// let gray = gray_normalized(&image, ChannelOrder::Rgb).unwrap();
///
/// assert_eq!(gray.num_channels(), 1);
/// assert_eq!(gray.as_slice()[1], 0.0);
/// ```
pub fn gray_normalized<T, const C: usize>(
    src: &Image<T, C>,
    order: ChannelOrder,
) -> Result<Image<f32, 1>, ImageError>
where
    T: ImageDtype,
{
    if !matches!(C, 0 | 1 | 3 | 4) {
        return Err(ImageError::UnsupportedChannelCount(C));
    }

    if src.is_empty() {
        return Ok(Image::empty());
    }

    let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;

    let [ri, gi, bi] = order.rgb_indices();
    let full_scale = T::FULL_SCALE;

    // parallelize the grayscale conversion by rows
    parallel::par_iter_rows(src, &mut dst, |src_pixel, dst_pixel| {
        let luma = if C == 1 {
            src_pixel[0].into_f32()
        } else {
            RW * src_pixel[ri].into_f32()
                + GW * src_pixel[gi].into_f32()
                + BW * src_pixel[bi].into_f32()
        };
        dst_pixel[0] = match full_scale {
            Some(scale) => (luma / scale).clamp(0.0, 1.0),
            None => luma,
        };
    });

    if full_scale.is_none() {
        rescale_to_unit_range(&mut dst);
    }

    Ok(dst)
}

/// Min-max rescale the field into `[0, 1]` unless it already lies there.
fn rescale_to_unit_range(field: &mut Image<f32, 1>) {
    let (min, max) = field
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

    if min >= 0.0 && max <= 1.0 {
        return;
    }

    let range = max - min;
    parallel::par_iter_rows_mut(field, |_, row| {
        row.iter_mut().for_each(|v| {
            *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
        });
    });
}
