//! PDF rasterisation: parse the input bytes and render every page to an RGB
//! bitmap via pdfium.
//!
//! ## Why a 2× upscale?
//!
//! PDF pages are laid out in points (72 per inch). Rendering at page size
//! gives 72 DPI — visibly fuzzy after the raster round trip. Doubling the
//! target width lands around 144 DPI, which keeps body text legible without
//! the memory cost of a print-quality render. `max_rendered_pixels` caps the
//! longest edge regardless of physical page size so an oversized page cannot
//! exhaust memory.
//!
//! ## Why RGB8?
//!
//! pdfium renders RGBA. The alpha channel is meaningless for an opaque page
//! and per-channel negation of alpha would turn the page transparent, so
//! every bitmap is collapsed to 3-channel RGB before inversion.

use crate::config::InvertOptions;
use crate::error::InvertError;
use image::RgbImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// One rasterised page, carrying the source page geometry in points so the
/// assembly stage can recreate a page of identical dimensions.
pub struct RenderedPage {
    /// 0-based position in the source document.
    pub index: usize,
    pub width_pts: f32,
    pub height_pts: f32,
    pub image: RgbImage,
}

/// Load a document from raw bytes, mapping pdfium's errors onto the
/// pipeline taxonomy.
pub fn load_document<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
) -> Result<PdfDocument<'a>, InvertError> {
    pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let detail = format!("{e:?}");
        if detail.contains("Password") || detail.contains("password") {
            InvertError::PasswordRequired
        } else {
            InvertError::CorruptPdf { detail }
        }
    })
}

/// Rasterise every page of `document`, in original order.
pub fn rasterize_pages(
    document: &PdfDocument<'_>,
    opts: &InvertOptions,
) -> Result<Vec<RenderedPage>, InvertError> {
    let pages = document.pages();
    let total = pages.len() as usize;
    let mut results = Vec::with_capacity(total);

    for index in 0..total {
        let page = pages
            .get(index as u16)
            .map_err(|e| InvertError::RasterisationFailed {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;

        let width_pts = page.width().value;
        let height_pts = page.height().value;

        let target_width = (width_pts * opts.scale).round() as i32;
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width.clamp(1, opts.max_rendered_pixels as i32))
            .set_maximum_height(opts.max_rendered_pixels as i32);

        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| InvertError::RasterisationFailed {
                    page: index + 1,
                    detail: format!("{e:?}"),
                })?;

        let image = bitmap.as_image().to_rgb8();
        debug!(
            "rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );

        results.push(RenderedPage {
            index,
            width_pts,
            height_pts,
            image,
        });
    }

    Ok(results)
}
