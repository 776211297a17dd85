//! Process configuration, read once at startup.
//!
//! Everything environment-derived lives in one immutable [`AppConfig`] that
//! is constructed in the binary and passed explicitly to the components that
//! need it. Nothing reads ambient environment state after startup, which
//! keeps components testable with a hand-built config.
//!
//! Rendering knobs live in [`InvertOptions`], separate from the service
//! config so library users of the pipeline can set them without touching
//! HTTP or payment settings.

use crate::store::SubscriptionType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for a single inversion run.
///
/// # Example
/// ```rust
/// use inkvert::InvertOptions;
///
/// let opts = InvertOptions::default().scale(2.0).max_rendered_pixels(3000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvertOptions {
    /// Linear upscale factor applied when rasterising each page. Default: 2.0.
    ///
    /// PDF pages are laid out in points (72/inch), so a 2× render lands at
    /// ~144 DPI — enough to keep body text legible after the round trip
    /// through raster form without ballooning memory use.
    pub scale: f32,

    /// Maximum rendered dimension (width or height) in pixels. Default: 4000.
    ///
    /// A safety cap independent of `scale`: a 2× render of an A0 poster would
    /// otherwise allocate hundreds of megapixels. Either dimension is capped,
    /// the other scales proportionally.
    pub max_rendered_pixels: u32,
}

impl Default for InvertOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            max_rendered_pixels: 4000,
        }
    }
}

impl InvertOptions {
    /// Set the upscale factor, clamped to 1.0–4.0.
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale.clamp(1.0, 4.0);
        self
    }

    /// Set the pixel cap, floored at 100.
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.max_rendered_pixels = px.max(100);
        self
    }
}

/// Payment-provider settings.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key used for checkout-session creation.
    pub secret_key: String,
    /// Endpoint secret shared with the webhook sender.
    pub webhook_secret: String,
    /// API origin. Overridable so tests can point at a local stub.
    pub api_base: String,
    pub success_url: String,
    pub cancel_url: String,
    pub lifetime_price_id: String,
    pub monthly_price_id: String,
    pub yearly_price_id: String,
}

impl StripeConfig {
    /// Look up the configured price id for a plan. Empty ids count as
    /// unconfigured and return `None`.
    pub fn price_id_for(&self, plan: SubscriptionType) -> Option<&str> {
        let id = match plan {
            SubscriptionType::Lifetime => &self.lifetime_price_id,
            SubscriptionType::Monthly => &self.monthly_price_id,
            SubscriptionType::Yearly => &self.yearly_price_id,
        };
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }
}

/// Immutable process-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
    /// Upload size cap enforced at the HTTP boundary. Default: 50 MiB.
    pub max_upload_bytes: usize,
    pub render: InvertOptions,
    pub stripe: StripeConfig,
}

impl AppConfig {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// Missing variables fall back to development defaults; none of them are
    /// fatal at load time so the pipeline-only paths work without any payment
    /// configuration.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let port = env_or("INKVERT_PORT", "8080").parse().unwrap_or(8080);

        let max_upload_bytes = env_or("INKVERT_MAX_UPLOAD_BYTES", "")
            .parse()
            .unwrap_or(50 * 1024 * 1024);

        Self {
            port,
            database_path: resolve_database_path(),
            max_upload_bytes,
            render: InvertOptions::default(),
            stripe: StripeConfig {
                secret_key: env_or("STRIPE_SECRET_KEY", ""),
                webhook_secret: env_or("STRIPE_WEBHOOK_SECRET", ""),
                api_base: env_or("STRIPE_API_BASE", "https://api.stripe.com"),
                success_url: env_or(
                    "INKVERT_SUCCESS_URL",
                    "http://localhost:8080/success?session_id={CHECKOUT_SESSION_ID}",
                ),
                cancel_url: env_or("INKVERT_CANCEL_URL", "http://localhost:8080/?canceled=true"),
                lifetime_price_id: env_or("STRIPE_LIFETIME_PRICE_ID", ""),
                monthly_price_id: env_or("STRIPE_MONTHLY_PRICE_ID", ""),
                yearly_price_id: env_or("STRIPE_YEARLY_PRICE_ID", ""),
            },
        }
    }
}

/// The database lives in the ephemeral writable directory on serverless
/// hosts (only `/tmp` is writable there) and next to the binary otherwise.
/// Not durable across redeploys on such hosts — a known limitation.
fn resolve_database_path() -> PathBuf {
    if let Ok(path) = std::env::var("INKVERT_DATABASE_PATH") {
        return PathBuf::from(path);
    }
    let ephemeral_host =
        std::env::var("VERCEL").is_ok() || std::env::var("VERCEL_ENV").is_ok();
    if ephemeral_host {
        PathBuf::from("/tmp/premium_tokens.db")
    } else {
        PathBuf::from("premium_tokens.db")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_options_defaults() {
        let opts = InvertOptions::default();
        assert_eq!(opts.scale, 2.0);
        assert_eq!(opts.max_rendered_pixels, 4000);
    }

    #[test]
    fn scale_is_clamped() {
        assert_eq!(InvertOptions::default().scale(0.1).scale, 1.0);
        assert_eq!(InvertOptions::default().scale(10.0).scale, 4.0);
    }

    #[test]
    fn pixel_cap_has_a_floor() {
        assert_eq!(InvertOptions::default().max_rendered_pixels(1).max_rendered_pixels, 100);
    }

    #[test]
    fn empty_price_id_is_unconfigured() {
        let cfg = StripeConfig {
            secret_key: String::new(),
            webhook_secret: String::new(),
            api_base: "https://api.stripe.com".into(),
            success_url: String::new(),
            cancel_url: String::new(),
            lifetime_price_id: "price_123".into(),
            monthly_price_id: String::new(),
            yearly_price_id: String::new(),
        };
        assert_eq!(cfg.price_id_for(SubscriptionType::Lifetime), Some("price_123"));
        assert_eq!(cfg.price_id_for(SubscriptionType::Monthly), None);
    }
}
