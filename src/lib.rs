//! # inkvert
//!
//! Invert the colours of PDF documents for comfortable dark-mode reading,
//! served over HTTP with a premium tier gated by payment-provider tokens.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐    ┌──────────────────────────────┐    ┌─────────┐
//! │  bytes  │───▶│ render ─▶ invert ─▶ assemble │───▶│  bytes  │
//! └─────────┘    └──────────────────────────────┘    └─────────┘
//!                         (pipeline)
//!
//!        api ──▶ pipeline            api ──▶ payment ──▶ store
//!      (/invert)                  (checkout + webhook) (sqlite)
//! ```
//!
//! * [`pipeline`] — rasterise each page via pdfium, negate every pixel, and
//!   rebuild a PDF of identical page geometry
//! * [`api`]      — axum router and handlers
//! * [`store`]    — premium-token persistence (SQLite via sqlx)
//! * [`payment`]  — checkout sessions and signed webhook handling
//! * [`config`]   — environment-derived settings
//! * [`error`]    — error taxonomy and the HTTP error envelope
//!
//! ## Library usage
//!
//! The pipeline is usable without the service:
//!
//! ```rust,no_run
//! use inkvert::{invert_pdf, InvertOptions};
//!
//! # async fn run() -> Result<(), inkvert::InvertError> {
//! let input = std::fs::read("paper.pdf").map_err(|e| inkvert::InvertError::Internal(e.to_string()))?;
//! let output = invert_pdf(&input, &InvertOptions::default()).await?;
//! std::fs::write("inverted_paper.pdf", output).map_err(|e| inkvert::InvertError::Internal(e.to_string()))?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod payment;
pub mod pipeline;
pub mod store;

pub use config::{AppConfig, InvertOptions, StripeConfig};
pub use error::{ApiError, InvertError, PaymentError, StorageError};
pub use payment::{PaymentProvider, StripeClient, WebhookOutcome};
pub use pipeline::{invert_pdf, invert_pdf_blocking};
pub use store::{PremiumStore, SqliteStore, SubscriptionType};
