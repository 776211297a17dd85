//! Error types for the inkvert library and service.
//!
//! Three library-level error enums reflect the three failure domains:
//!
//! * [`InvertError`] — the inversion pipeline could not produce output
//!   (unparsable PDF, page failed to rasterise or re-encode). Always fatal
//!   for the whole request; partial output is never returned.
//!
//! * [`StorageError`] — the premium-token store is unavailable. Verification
//!   callers must fail closed (treat as "not premium"); issuance callers must
//!   surface the error rather than silently dropping a purchase.
//!
//! * [`PaymentError`] — the payment collaborator rejected a webhook
//!   (signature, payload) or a checkout session could not be created. No
//!   token is ever issued on any of these.
//!
//! [`ApiError`] is the HTTP-facing envelope: it wraps the three above plus
//! request validation, and renders a structured JSON body with a stable
//! machine-readable code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Fatal errors from the page-inversion pipeline.
#[derive(Debug, Error)]
pub enum InvertError {
    /// The input's first bytes are not `%PDF`.
    #[error("input is not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: [u8; 4] },

    /// pdfium could not parse the document at all.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// The document is encrypted; inversion of protected files is unsupported.
    #[error("PDF is password-protected; remove the password and retry")]
    PasswordRequired,

    /// The document parsed but contains no pages.
    #[error("PDF contains no pages")]
    EmptyDocument,

    /// pdfium returned an error while rasterising one page.
    #[error("rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The inverted bitmap could not be placed back into the output document.
    #[error("re-encoding failed for page {page}: {detail}")]
    ReencodeFailed { page: usize, detail: String },

    /// The assembled output document could not be serialised.
    #[error("failed to serialise output document: {detail}")]
    SaveFailed { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "failed to bind to the pdfium library: {0}\n\
         Install pdfium or set PDFIUM_DYNAMIC_LIB_PATH to its location."
    )]
    PdfiumBindingFailed(String),

    /// Unexpected internal error (e.g. the blocking task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Premium-token store failures (database unavailable, I/O error).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Payment-collaborator failures.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The webhook signature header is absent or not in `t=…,v1=…` form.
    #[error("malformed signature header: {detail}")]
    MalformedSignatureHeader { detail: String },

    /// The payload does not match any signature in the header.
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// The signed timestamp is outside the accepted tolerance window.
    #[error("webhook timestamp outside tolerance ({age_secs}s old)")]
    StaleTimestamp { age_secs: i64 },

    /// The webhook body is not the JSON event shape we expect.
    #[error("unparsable webhook payload: {detail}")]
    MalformedPayload { detail: String },

    /// Checkout-session creation failed at the provider.
    #[error("checkout session creation failed: {detail}")]
    CheckoutFailed { detail: String },

    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP-facing error envelope for all route handlers.
///
/// Maps each failure domain onto a status code: validation → 400, pipeline →
/// 500, payment → 400/502, storage → 500. Every variant renders as
/// `{"error": {"message", "type", "code"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Processing(#[from] InvertError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "validation_failed",
                msg.clone(),
            ),
            ApiError::Processing(e) => {
                tracing::error!("pipeline error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "processing_error",
                    "inversion_failed",
                    e.to_string(),
                )
            }
            ApiError::Payment(e) => {
                let status = match e {
                    PaymentError::CheckoutFailed { .. } | PaymentError::Http(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, "payment_error", "payment_failed", e.to_string())
            }
            ApiError::Storage(e) => {
                tracing::error!("storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "storage_unavailable",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_pdf_display_includes_magic() {
        let e = InvertError::NotAPdf {
            magic: *b"PK\x03\x04",
        };
        assert!(e.to_string().contains("not a PDF"));
    }

    #[test]
    fn rasterisation_display_includes_page() {
        let e = InvertError::RasterisationFailed {
            page: 3,
            detail: "bad content stream".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 3"), "got: {msg}");
        assert!(msg.contains("bad content stream"));
    }

    #[test]
    fn stale_timestamp_display() {
        let e = PaymentError::StaleTimestamp { age_secs: 901 };
        assert!(e.to_string().contains("901"));
    }

    #[test]
    fn validation_maps_to_400() {
        let resp = ApiError::Validation("only PDF files are allowed".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn processing_maps_to_500() {
        let resp = ApiError::Processing(InvertError::EmptyDocument).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_signature_maps_to_400() {
        let resp = ApiError::Payment(PaymentError::InvalidSignature).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn checkout_failure_maps_to_502() {
        let resp = ApiError::Payment(PaymentError::CheckoutFailed {
            detail: "HTTP 500".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
