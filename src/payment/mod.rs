//! Payment collaborator boundary.
//!
//! The service never inspects payment internals: it asks the provider for a
//! checkout session, and it hands raw webhook bytes plus the signature
//! header back to the provider for verification and parsing. Everything
//! behind [`PaymentProvider`] is replaceable by a test double without
//! touching the HTTP layer or the store.

pub mod stripe;

pub use stripe::StripeClient;

use crate::error::{ApiError, PaymentError};
use crate::store::{PremiumStore, SubscriptionType};
use serde::Serialize;

/// Event type that grants premium access.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// A pending purchase at the payment provider.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Where to redirect the buyer to complete payment.
    pub url: String,
}

/// A verified, parsed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Provider-assigned event id; the idempotency key for issuance.
    pub id: String,
    /// Event type string, e.g. `checkout.session.completed`.
    pub kind: String,
    /// Plan carried in the checkout session's metadata, when present.
    pub subscription_type: Option<SubscriptionType>,
}

/// Capability set of the payment collaborator.
#[async_trait::async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session for the given price. Lifetime plans use a
    /// one-time payment; monthly/yearly use the provider's subscription mode.
    async fn create_checkout_session(
        &self,
        price_id: &str,
        plan: SubscriptionType,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Verify the payload against the signature header and parse the event.
    /// Any verification or parse failure means the payload is untrusted and
    /// must have no side effects.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, PaymentError>;
}

/// Result of processing a verified webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A completed checkout: premium token issued (or re-returned for a
    /// redelivered event).
    TokenIssued(String),
    /// A verified event of a type we do not act on.
    Ignored,
}

/// Handle a webhook delivery end to end: verify, then issue on completed
/// checkouts, deduplicated by event id.
///
/// Failure modes follow the boundary contract: a bad signature or payload
/// returns before any side effect; a storage failure during issuance
/// propagates so the purchase is not silently dropped.
pub async fn handle_callback(
    provider: &dyn PaymentProvider,
    store: &dyn PremiumStore,
    payload: &[u8],
    signature_header: &str,
) -> Result<WebhookOutcome, ApiError> {
    let event = provider.verify_webhook(payload, signature_header)?;

    if event.kind != CHECKOUT_COMPLETED {
        tracing::debug!(kind = %event.kind, "webhook event ignored");
        return Ok(WebhookOutcome::Ignored);
    }

    let plan = event.subscription_type.unwrap_or(SubscriptionType::Lifetime);
    let token = store.issue_for_event(&event.id, plan).await?;
    tracing::info!(event_id = %event.id, plan = plan.as_str(), "checkout completed, token issued");

    Ok(WebhookOutcome::TokenIssued(token))
}
