use crate::AppState;
use crate::error::ApiError;
use crate::services::webhook::{
    EVENT_HEADER, PushPayload, SIGNATURE_HEADER, SignatureError, is_relevant, verify_signature,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Serialize, Debug)]
pub struct WebhookAck {
    pub message: &'static str,
}

#[derive(Serialize, Debug)]
pub struct WebhookRevalidated {
    pub revalidated: bool,
    pub timestamp: String,
    pub message: &'static str,
    pub commits: usize,
}

pub fn webhook_router() -> Router<AppState> {
    Router::new().route("/webhook/github", post(github_webhook_handler))
}

// the body stays raw bytes until the signature is checked, GitHub signs exactly what it sent
async fn github_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let failed = || ApiError::internal("Webhook processing failed");

    let Some(secret) = state.config.webhook_secret.as_deref() else {
        error!("webhook called without a configured secret");
        return Err(failed());
    };

    // a header that isn't valid UTF-8 can't match, treat it as a wrong signature
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|value| value.to_str().unwrap_or_default());

    match verify_signature(secret, signature, &body, state.config.require_signature) {
        Ok(()) => {}
        Err(SignatureError::InvalidKey) => {
            error!("webhook secret rejected by HMAC");
            return Err(failed());
        }
        Err(e) => {
            warn!(reason = %e, "webhook rejected");
            return Err(ApiError::unauthorized("Invalid signature"));
        }
    }

    if headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok()) == Some("ping") {
        info!("webhook ping received");
        return Ok(Json(WebhookAck { message: "pong" }).into_response());
    }

    let payload: PushPayload = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "webhook payload is not valid JSON");
        failed()
    })?;

    if !is_relevant(&payload, &state.config.posts_folder, state.config.relevance) {
        info!(commits = payload.commits.len(), "webhook ignored: no post changes");
        return Ok(Json(WebhookAck {
            message: "Webhook received but no blog changes detected",
        })
        .into_response());
    }

    state.revalidator.revalidate_content().await.map_err(|e| {
        error!(error = ?e, "webhook revalidation failed");
        failed()
    })?;

    info!(commits = payload.commits.len(), action = ?payload.action, "blog revalidated via webhook");

    Ok(Json(WebhookRevalidated {
        revalidated: true,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        message: "Blog revalidated via GitHub webhook",
        commits: payload.commits.len(),
    })
    .into_response())
}
