use crate::config::{PosthookConfig, SourceConfig};
use crate::io::ContentSource;
use crate::io::github::GitHubContentSource;
use crate::io::local::LocalContentSource;
use crate::services::cache::PostCache;
use crate::services::revalidation::{
    CacheInvalidator, ForwardingInvalidator, PathInvalidator, Revalidator,
};
use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod config;
mod domain;
mod error;
mod features;
mod io;
mod parser;
mod services;
mod telemetry;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PosthookConfig>,
    pub cache: Arc<PostCache>,
    pub revalidator: Arc<Revalidator>,
}

impl AppState {
    pub fn from_config(config: PosthookConfig) -> Self {
        let source: Arc<dyn ContentSource> = match &config.source {
            SourceConfig::GitHub {
                api_url,
                owner,
                repo,
                branch,
                token,
            } => Arc::new(GitHubContentSource::new(
                api_url.clone(),
                owner.clone(),
                repo.clone(),
                branch.clone(),
                token.clone(),
            )),
            SourceConfig::Local { root } => Arc::new(LocalContentSource::new(root.clone())),
        };

        let cache = Arc::new(PostCache::new(
            source,
            config.posts_folder.clone(),
            config.cache_ttl,
        ));

        let mut invalidators: Vec<Arc<dyn PathInvalidator>> =
            vec![Arc::new(CacheInvalidator::new(cache.clone()))];
        if let Some(url) = &config.forward_url {
            invalidators.push(Arc::new(ForwardingInvalidator::new(
                url.clone(),
                config.revalidate_secret.clone(),
            )));
        }

        Self {
            config: Arc::new(config),
            cache,
            revalidator: Arc::new(Revalidator::new(invalidators)),
        }
    }
}

// api router, where features are composed
pub fn app_router(state: AppState) -> Router {
    let mut api_router = Router::new()
        .merge(features::posts::posts_router())
        .merge(features::revalidate::revalidate_router());

    // an unsigned webhook never gets mounted, config validation enforces the secret
    if state.config.webhook_enabled {
        api_router = api_router.merge(features::webhook::webhook_router());
    }

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "posts_fetched_at": state.cache.last_fetched().await,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // determine environment variables
    dotenv::dotenv().ok();

    // fail fast on missing secrets before anything listens
    let config = PosthookConfig::from_env()?;

    telemetry::init(config.json_logs)?;

    let bind_addr = config.bind_addr;
    let state = AppState::from_config(config);

    info!(
        folder = %state.config.posts_folder,
        ttl_secs = state.config.cache_ttl.as_secs(),
        webhook = state.config.webhook_enabled,
        "starting posthook"
    );

    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
