//! End-to-end pipeline tests against a real pdfium library.
//!
//! These run only when `INKVERT_E2E=1` is set, because they need a pdfium
//! shared library on the machine. Everything else in the suite is
//! pdfium-independent.
//!
//! The fixture is a minimal hand-assembled PDF of solid-black US Letter
//! pages, built with computed xref offsets so no external file is needed.

use inkvert::pipeline::{invert_pdf_blocking, render};
use inkvert::{InvertError, InvertOptions};
use pdfium_render::prelude::*;

fn e2e_enabled() -> bool {
    if std::env::var("INKVERT_E2E").as_deref() == Ok("1") {
        true
    } else {
        eprintln!("skipping: set INKVERT_E2E=1 to run pdfium end-to-end tests");
        false
    }
}

/// Build a valid PDF where every page is a solid black 612x792pt rectangle.
fn solid_black_pdf(page_count: usize) -> Vec<u8> {
    let content = "0 0 0 rg 0 0 612 792 re f";

    let mut objects: Vec<String> = Vec::new();
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", 3 + i * 2))
        .collect();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        page_count
    ));
    for i in 0..page_count {
        let content_obj = 4 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {content_obj} 0 R >>"
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for off in &offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

/// Mean channel value across all pages of a rendered document, 0..=255.
fn mean_luminance(pdf: &[u8]) -> f64 {
    let pdfium = Pdfium::default();
    let document = render::load_document(&pdfium, pdf).expect("load output");
    let pages =
        render::rasterize_pages(&document, &InvertOptions::default()).expect("render output");

    let mut sum = 0u64;
    let mut count = 0u64;
    for page in &pages {
        for pixel in page.image.pixels() {
            sum += pixel.0.iter().map(|&v| v as u64).sum::<u64>();
            count += 3;
        }
    }
    sum as f64 / count as f64
}

#[test]
fn black_pages_come_out_white() {
    if !e2e_enabled() {
        return;
    }

    let input = solid_black_pdf(2);
    let output = invert_pdf_blocking(&input, &InvertOptions::default()).expect("invert");

    assert!(output.starts_with(b"%PDF"), "output must be a PDF");

    let pdfium = Pdfium::default();
    let document = render::load_document(&pdfium, &output).expect("load output");
    assert_eq!(document.pages().len(), 2, "page count must be preserved");
    drop(document);

    assert!(
        mean_luminance(&output) > 200.0,
        "inverted black pages should render near-white"
    );
}

#[test]
fn double_inversion_restores_darkness() {
    if !e2e_enabled() {
        return;
    }

    let input = solid_black_pdf(1);
    let once = invert_pdf_blocking(&input, &InvertOptions::default()).expect("first pass");
    let twice = invert_pdf_blocking(&once, &InvertOptions::default()).expect("second pass");

    assert!(
        mean_luminance(&twice) < 55.0,
        "a second inversion should return the page to near-black"
    );
}

#[test]
fn zero_page_document_is_rejected() {
    if !e2e_enabled() {
        return;
    }

    // Structurally valid document, empty page tree.
    let input = solid_black_pdf(0);
    let err = invert_pdf_blocking(&input, &InvertOptions::default()).unwrap_err();
    assert!(matches!(err, InvertError::EmptyDocument), "got: {err:?}");
}

#[test]
fn corrupt_pdf_is_rejected() {
    if !e2e_enabled() {
        return;
    }

    // Correct magic, garbage structure.
    let mut input = b"%PDF-1.4\n".to_vec();
    input.extend_from_slice(&[0xAB; 256]);

    let err = invert_pdf_blocking(&input, &InvertOptions::default()).unwrap_err();
    assert!(matches!(err, InvertError::CorruptPdf { .. }), "got: {err:?}");
}

#[test]
fn output_page_dimensions_match_input() {
    if !e2e_enabled() {
        return;
    }

    let input = solid_black_pdf(1);
    let output = invert_pdf_blocking(&input, &InvertOptions::default()).expect("invert");

    let pdfium = Pdfium::default();
    let document = render::load_document(&pdfium, &output).expect("load output");
    let page = document.pages().get(0).expect("page 0");
    assert!((page.width().value - 612.0).abs() < 1.0);
    assert!((page.height().value - 792.0).abs() < 1.0);
}
