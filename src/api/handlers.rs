//! Route handlers.
//!
//! Handlers stay thin: extract and validate the request, call into the
//! pipeline/store/payment layers, shape the response. All failure paths go
//! through [`ApiError`] so every route renders the same error envelope.

use crate::api::AppState;
use crate::error::ApiError;
use crate::payment::{handle_callback, WebhookOutcome};
use crate::pipeline;
use crate::store::SubscriptionType;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::header::{self, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// `POST /invert` — multipart upload, field `file`, response is the inverted
/// document as an attachment.
pub async fn invert(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("unreadable multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .ok_or_else(|| ApiError::Validation("file field has no filename".into()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read upload: {e}")))?;
        upload = Some((filename, data));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(ApiError::Validation("no file part in request".into()));
    };

    // Extension check happens before any parsing so obviously wrong uploads
    // are bounced cheaply with a clear message.
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(ApiError::Validation(
            "only PDF files are allowed".into(),
        ));
    }
    if data.is_empty() {
        return Err(ApiError::Validation("uploaded file is empty".into()));
    }

    info!(filename, bytes = data.len(), "inversion requested");
    let output = pipeline::invert_pdf(&data, &state.config.render).await?;

    let safe_name = sanitise_filename(&filename);
    let disposition = format!("attachment; filename=\"inverted_{safe_name}\"");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output,
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct CheckPremiumRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct CheckPremiumResponse {
    pub is_premium: bool,
}

/// `POST /check-premium` — validity check for a stored token.
///
/// Fails closed: a store error is logged and reported as "not premium"
/// rather than surfaced, so a database hiccup degrades the premium feature
/// instead of breaking the client.
pub async fn check_premium(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckPremiumRequest>,
) -> Json<CheckPremiumResponse> {
    let is_premium = match state.store.verify(req.token.as_deref()).await {
        Ok(valid) => valid,
        Err(e) => {
            warn!("premium check failed closed: {e}");
            false
        }
    };
    Json(CheckPremiumResponse { is_premium })
}

#[derive(Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub plan: Option<String>,
}

#[derive(Serialize)]
pub struct CreateCheckoutResponse {
    pub session_id: String,
    pub url: String,
}

/// `POST /create-checkout` — start a purchase for the requested plan
/// (default: lifetime).
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    let plan: SubscriptionType = match req.plan.as_deref() {
        None | Some("") => SubscriptionType::Lifetime,
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::Validation(format!("unknown plan: {raw}")))?,
    };

    let price_id = state
        .config
        .stripe
        .price_id_for(plan)
        .ok_or_else(|| {
            ApiError::Validation(format!("no price configured for plan: {}", plan.as_str()))
        })?
        .to_string();

    let session = state
        .payments
        .create_checkout_session(&price_id, plan)
        .await?;

    Ok(Json(CreateCheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// `POST /stripe-webhook` — signed provider callback.
///
/// The raw body bytes are verified exactly as received; any re-serialisation
/// before verification would break the signature.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Validation("missing Stripe-Signature header".into()))?;

    let outcome =
        handle_callback(state.payments.as_ref(), state.store.as_ref(), &body, signature).await?;

    Ok(Json(match outcome {
        WebhookOutcome::TokenIssued(token) => {
            serde_json::json!({ "status": "success", "token": token })
        }
        WebhookOutcome::Ignored => serde_json::json!({ "status": "ignored" }),
    }))
}

/// Reduce a client-supplied filename to something safe to echo in a header:
/// strip any path components, keep only `[A-Za-z0-9._-]`, and fall back to a
/// constant when nothing survives.
fn sanitise_filename(raw: &str) -> String {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    }
}
