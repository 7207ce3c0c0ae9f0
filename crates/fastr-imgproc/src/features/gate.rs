use fastr_image::Image;

use super::Keypoint;

/// Keep the candidates whose normalized response is strictly above `threshold`.
///
/// The response is read at the rounded keypoint position. Candidates that fall
/// outside the response map are dropped with a warning. The result is sorted by
/// raster position, ascending `y` then `x`.
///
/// # Arguments
///
/// * `candidates` - The keypoints to filter.
/// * `response` - The normalized response map with shape (H, W).
/// * `threshold` - The gate threshold.
pub fn hybrid_gate(candidates: &[Keypoint], response: &Image<f32, 1>, threshold: f32) -> Vec<Keypoint> {
    let mut keypoints = candidates
        .iter()
        .filter(|kp| {
            let value = kp
                .pixel()
                .and_then(|(x, y)| response.get([y, x, 0]).copied());

            match value {
                Some(v) => v > threshold,
                None => {
                    log::warn!(
                        "keypoint ({}, {}) is outside the {} response map, dropped",
                        kp.x,
                        kp.y,
                        response.size()
                    );
                    false
                }
            }
        })
        .copied()
        .collect::<Vec<_>>();

    keypoints.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    keypoints
}
