/// Create a gaussian blur kernel.
///
/// The taps are normalized to sum to one.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel, empty if `kernel_size` is zero.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    if kernel_size == 0 {
        return Vec::new();
    }

    let mean = (kernel_size - 1) as f32 / 2.0;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - mean;
            (-(x * x) / two_sigma_sq).exp()
        })
        .collect::<Vec<_>>();

    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// The 3x3 Sobel kernels `(sobel_x, sobel_y)`, indexed as `kernel[row][col]`.
///
/// `sobel_y` is the transpose of `sobel_x`. Applied by correlation, the x
/// kernel responds positively where the intensity grows to the right and the
/// y kernel where it grows downwards.
pub fn sobel_kernel3() -> ([[f32; 3]; 3], [[f32; 3]; 3]) {
    let sobel_x = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    let sobel_y = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];
    (sobel_x, sobel_y)
}
