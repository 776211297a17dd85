//! Premium-token persistence.
//!
//! One small table maps an opaque bearer token to an expiry timestamp and an
//! active flag. Tokens are only ever inserted and read — never updated — so
//! the store is append-mostly and needs no locking beyond what the pool
//! provides.
//!
//! The [`PremiumStore`] trait is the seam for test doubles: handlers and the
//! webhook path hold an `Arc<dyn PremiumStore>` and never know which backend
//! is underneath.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StorageError;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription plan attached to a premium token. Immutable after issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    /// One-time purchase; expiry is set ~100 years out.
    Lifetime,
    Monthly,
    Yearly,
}

impl SubscriptionType {
    /// Validity period added to the issuance time.
    pub fn duration(self) -> Duration {
        match self {
            // "Lifetime" is modelled as a far-future expiry rather than a
            // NULL so that verify() stays a single uniform comparison.
            SubscriptionType::Lifetime => Duration::days(36_500),
            SubscriptionType::Monthly => Duration::days(30),
            SubscriptionType::Yearly => Duration::days(365),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionType::Lifetime => "lifetime",
            SubscriptionType::Monthly => "monthly",
            SubscriptionType::Yearly => "yearly",
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lifetime" => Ok(SubscriptionType::Lifetime),
            "monthly" => Ok(SubscriptionType::Monthly),
            "yearly" => Ok(SubscriptionType::Yearly),
            _ => Err(()),
        }
    }
}

/// A persisted premium token row.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PremiumToken {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub subscription_type: String,
    pub is_active: bool,
}

/// Capability set of the premium-token store.
#[async_trait]
pub trait PremiumStore: Send + Sync {
    /// Idempotently ensure the tables exist. Safe to call on every start.
    async fn initialize(&self) -> Result<(), StorageError>;

    /// Generate a fresh token, persist it with `expires_at = now + plan
    /// duration`, and return it. Fails only on storage I/O.
    async fn issue(&self, plan: SubscriptionType) -> Result<String, StorageError>;

    /// Issue at most one token per payment-provider event: redelivery of an
    /// already-processed event, sequential or concurrent, returns the
    /// originally issued token.
    async fn issue_for_event(
        &self,
        event_id: &str,
        plan: SubscriptionType,
    ) -> Result<String, StorageError>;

    /// Fail-closed verification: true only for a known, active token whose
    /// expiry is strictly in the future. `None`, empty, and unknown inputs
    /// are all false. Storage errors propagate; callers must treat them as
    /// "not premium".
    async fn verify(&self, token: Option<&str>) -> Result<bool, StorageError>;
}

/// Generate an opaque bearer token: 32 bytes from the OS CSPRNG, URL-safe
/// base64 without padding (43 characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_match_plan_terms() {
        assert_eq!(SubscriptionType::Monthly.duration(), Duration::days(30));
        assert_eq!(SubscriptionType::Yearly.duration(), Duration::days(365));
        assert!(SubscriptionType::Lifetime.duration() > Duration::days(99 * 365));
    }

    #[test]
    fn plan_round_trips_through_str() {
        for plan in [
            SubscriptionType::Lifetime,
            SubscriptionType::Monthly,
            SubscriptionType::Yearly,
        ] {
            assert_eq!(plan.as_str().parse::<SubscriptionType>(), Ok(plan));
        }
        assert!("weekly".parse::<SubscriptionType>().is_err());
    }

    #[test]
    fn tokens_are_url_safe_and_long() {
        let token = generate_token();
        // 32 bytes → 43 base64url chars, no padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tokens_do_not_collide() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
    }
}
