//! Document assembly: build a fresh PDF whose pages are the inverted bitmaps.
//!
//! Each output page is created at the source page's dimensions in points, and
//! the bitmap is placed as a single full-bleed image object. The original
//! content streams are deliberately not carried over; the raster IS the page.

use crate::error::InvertError;
use crate::pipeline::render::RenderedPage;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// Serialise the inverted pages into a new PDF, preserving page order and
/// physical dimensions.
pub fn assemble_document(pdfium: &Pdfium, pages: &[RenderedPage]) -> Result<Vec<u8>, InvertError> {
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| InvertError::SaveFailed {
            detail: format!("could not create output document: {e:?}"),
        })?;

    for page in pages {
        let width = PdfPoints::new(page.width_pts);
        let height = PdfPoints::new(page.height_pts);

        let mut pdf_page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(|e| InvertError::ReencodeFailed {
                page: page.index + 1,
                detail: format!("could not create page: {e:?}"),
            })?;

        let image = DynamicImage::ImageRgb8(page.image.clone());
        let object = PdfPageImageObject::new_with_size(&document, &image, width, height)
            .map_err(|e| InvertError::ReencodeFailed {
                page: page.index + 1,
                detail: format!("could not build image object: {e:?}"),
            })?;

        pdf_page
            .objects_mut()
            .add_image_object(object)
            .map_err(|e| InvertError::ReencodeFailed {
                page: page.index + 1,
                detail: format!("could not place image: {e:?}"),
            })?;

        debug!(
            "assembled page {} at {:.1}x{:.1} pts",
            page.index + 1,
            page.width_pts,
            page.height_pts
        );
    }

    document
        .save_to_bytes()
        .map_err(|e| InvertError::SaveFailed {
            detail: format!("{e:?}"),
        })
}
