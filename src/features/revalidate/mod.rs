use crate::AppState;
use crate::error::ApiError;
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Deserialize, Debug)]
pub struct RevalidateParams {
    pub secret: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub timestamp: String,
    pub message: &'static str,
}

pub fn revalidate_router() -> Router<AppState> {
    Router::new().route("/revalidate", get(revalidate_handler))
}

async fn revalidate_handler(
    State(state): State<AppState>,
    Query(params): Query<RevalidateParams>,
) -> Result<Json<RevalidateResponse>, ApiError> {
    if params.secret.as_deref() != Some(state.config.revalidate_secret.as_str()) {
        warn!("revalidation rejected: invalid secret");
        return Err(ApiError::unauthorized("Invalid secret"));
    }

    state.revalidator.revalidate_content().await.map_err(|e| {
        error!(error = ?e, "manual revalidation failed");
        ApiError::internal("Failed to revalidate")
    })?;

    info!("manual revalidation complete");

    Ok(Json(RevalidateResponse {
        revalidated: true,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        message: "Blog cache revalidated successfully",
    }))
}
