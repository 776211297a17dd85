//! The page-inversion pipeline.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! is independently testable and the rendering backend could be swapped
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ render ──▶ invert ──▶ assemble ──▶ bytes
//!           (pdfium)   (255-v)    (new PDF)
//! ```
//!
//! 1. [`render`]   — parse the input and rasterise every page at a 2× upscale;
//!    runs under `spawn_blocking` because pdfium is not async-safe
//! 2. [`invert`]   — negate every channel of every pixel
//! 3. [`assemble`] — place each inverted bitmap as a full-bleed image on a
//!    fresh page of the original dimensions, then serialise
//!
//! The pipeline is a pure function of its input bytes: no shared state, no
//! partial output. Any stage failure aborts the whole run with a single
//! [`InvertError`].

pub mod assemble;
pub mod invert;
pub mod render;

use crate::config::InvertOptions;
use crate::error::InvertError;
use pdfium_render::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Invert the colours of every page of a PDF.
///
/// Rasterises each page, negates every channel, and reassembles a new
/// document with the same page count and order. CPU-bound work runs on the
/// blocking thread pool.
///
/// # Errors
/// Fails if the input is not a parsable PDF, contains no pages, or any page
/// fails to rasterise or re-encode. Partial output is never returned.
pub async fn invert_pdf(input: &[u8], opts: &InvertOptions) -> Result<Vec<u8>, InvertError> {
    let bytes = input.to_vec();
    let opts = opts.clone();

    tokio::task::spawn_blocking(move || invert_pdf_blocking(&bytes, &opts))
        .await
        .map_err(|e| InvertError::Internal(format!("inversion task panicked: {e}")))?
}

/// Blocking implementation of [`invert_pdf`]. Callers outside a tokio
/// runtime (tests, batch tools) can use this directly.
pub fn invert_pdf_blocking(input: &[u8], opts: &InvertOptions) -> Result<Vec<u8>, InvertError> {
    check_magic(input)?;

    let start = Instant::now();
    let pdfium = bind_pdfium()?;

    let document = render::load_document(&pdfium, input)?;
    let page_count = document.pages().len() as usize;
    if page_count == 0 {
        return Err(InvertError::EmptyDocument);
    }
    info!("inverting {page_count} pages");

    let mut pages = render::rasterize_pages(&document, opts)?;
    for page in &mut pages {
        invert::invert_page(&mut page.image);
        debug!("inverted page {}", page.index + 1);
    }

    let output = assemble::assemble_document(&pdfium, &pages)?;
    info!(
        "inverted {page_count} pages in {}ms ({} bytes out)",
        start.elapsed().as_millis(),
        output.len()
    );
    Ok(output)
}

/// Bind to pdfium: a library next to the executable wins, then the system
/// library (honouring `PDFIUM_DYNAMIC_LIB_PATH`).
fn bind_pdfium() -> Result<Pdfium, InvertError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| InvertError::PdfiumBindingFailed(e.to_string()))
}

/// Reject anything whose first bytes are not `%PDF` before pdfium sees it,
/// so callers get a meaningful error rather than a generic parse failure.
fn check_magic(input: &[u8]) -> Result<(), InvertError> {
    let mut magic = [0u8; 4];
    let head = input.get(..4).ok_or(InvertError::NotAPdf { magic })?;
    if head != b"%PDF" {
        magic.copy_from_slice(head);
        return Err(InvertError::NotAPdf { magic });
    }
    Ok(())
}
