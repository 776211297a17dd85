//! Pixel inversion: map every channel value `v` to `255 - v`.
//!
//! Operating on the rasterised page rather than the PDF content stream means
//! the result is uniform across text, vector art, and embedded images — the
//! whole page flips, not just the objects a structural rewrite would reach.

use image::RgbImage;

/// Invert a rendered page in place.
///
/// Involutive: applying it twice restores the original bitmap exactly.
pub fn invert_page(image: &mut RgbImage) {
    image::imageops::invert(image);
}
