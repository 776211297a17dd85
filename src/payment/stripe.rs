//! Stripe implementation of [`PaymentProvider`].
//!
//! Checkout sessions are created with a form-encoded POST to
//! `/v1/checkout/sessions`; the API origin is configurable so tests can point
//! the client at a local stub.
//!
//! Webhook verification follows Stripe's documented scheme: the
//! `Stripe-Signature` header carries `t=<unix ts>,v1=<hex hmac>` pairs, and
//! the expected signature is HMAC-SHA256 over `"{t}.{raw payload}"` keyed by
//! the endpoint secret. Comparison is constant-time via `Mac::verify_slice`,
//! and timestamps older than [`SIGNATURE_TOLERANCE_SECS`] are rejected to
//! blunt replay of captured deliveries.

use crate::config::StripeConfig;
use crate::error::PaymentError;
use crate::payment::{CheckoutSession, PaymentProvider, WebhookEvent};
use crate::store::SubscriptionType;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (and clock skew) of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    api_base: String,
    success_url: String,
    cancel_url: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        }
    }

    /// Signature verification against an explicit "now", so expiry behaviour
    /// is testable without waiting.
    fn verify_signature_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_ts: i64,
    ) -> Result<(), PaymentError> {
        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp =
                        Some(value.parse().map_err(|_| {
                            PaymentError::MalformedSignatureHeader {
                                detail: format!("bad timestamp: {value}"),
                            }
                        })?);
                }
                Some(("v1", value)) => candidates.push(value),
                // v0 and unknown schemes are skipped, per the provider docs.
                Some(_) => {}
                None => {
                    return Err(PaymentError::MalformedSignatureHeader {
                        detail: format!("expected key=value, got: {part}"),
                    })
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| PaymentError::MalformedSignatureHeader {
            detail: "missing t= element".into(),
        })?;
        if candidates.is_empty() {
            return Err(PaymentError::MalformedSignatureHeader {
                detail: "missing v1= element".into(),
            });
        }

        let age = now_ts - timestamp;
        if age.abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(PaymentError::StaleTimestamp { age_secs: age });
        }

        for candidate in candidates {
            let Ok(sig_bytes) = hex::decode(candidate) else {
                continue;
            };
            let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
                .expect("HMAC accepts keys of any length");
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            if mac.verify_slice(&sig_bytes).is_ok() {
                return Ok(());
            }
        }

        warn!("webhook signature did not match any v1 candidate");
        Err(PaymentError::InvalidSignature)
    }
}

/// Compute the hex v1 signature for a payload. Exposed so tests and local
/// tooling can construct valid `Stripe-Signature` headers.
pub fn sign(webhook_secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[async_trait::async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        price_id: &str,
        plan: SubscriptionType,
    ) -> Result<CheckoutSession, PaymentError> {
        // One-time purchase for lifetime, recurring for the rest.
        let mode = match plan {
            SubscriptionType::Lifetime => "payment",
            SubscriptionType::Monthly | SubscriptionType::Yearly => "subscription",
        };

        let params: Vec<(&str, &str)> = vec![
            ("mode", mode),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", &self.success_url),
            ("cancel_url", &self.cancel_url),
            ("metadata[subscription_type]", plan.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::CheckoutFailed {
                detail: format!("HTTP {status}: {body}"),
            });
        }

        let session: SessionResponse = response.json().await?;
        let url = session.url.ok_or_else(|| PaymentError::CheckoutFailed {
            detail: "session response carried no redirect URL".into(),
        })?;

        debug!(session_id = %session.id, mode, "checkout session created");
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.verify_signature_at(payload, signature_header, Utc::now().timestamp())?;

        let event: EventPayload =
            serde_json::from_slice(payload).map_err(|e| PaymentError::MalformedPayload {
                detail: e.to_string(),
            })?;

        let subscription_type = event
            .data
            .object
            .metadata
            .subscription_type
            .as_deref()
            .and_then(|s| s.parse().ok());

        Ok(WebhookEvent {
            id: event.id,
            kind: event.kind,
            subscription_type,
        })
    }
}

// ── Wire shapes ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct EventPayload {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: EventData,
}

#[derive(Deserialize, Default)]
struct EventData {
    #[serde(default)]
    object: EventObject,
}

#[derive(Deserialize, Default)]
struct EventObject {
    #[serde(default)]
    metadata: EventMetadata,
}

#[derive(Deserialize, Default)]
struct EventMetadata {
    subscription_type: Option<String>,
}
