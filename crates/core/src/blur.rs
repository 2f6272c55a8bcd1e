use image::{RgbImage, imageops};

/// Gaussian sigma applied to flagged frames. Matches a 75x75 kernel with
/// automatic sigma (0.3 * ((75 - 1) / 2 - 1) + 0.8).
pub const BLUR_SIGMA: f32 = 11.6;

/// Blur the whole frame. The radius does not depend on frame size or confidence.
///
/// Uses the box-filter approximation so full HD frames keep up with playback.
pub fn blur_frame(frame: &RgbImage) -> RgbImage {
    imageops::fast_blur(frame, BLUR_SIGMA)
}
