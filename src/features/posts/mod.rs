use crate::AppState;
use crate::domain::{Post, PostMeta};
use crate::error::ApiError;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::error;

pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts_handler))
        .route("/posts/{slug}", get(get_post_handler))
        .route("/tags", get(list_tags_handler))
}

#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    #[serde(default)]
    pub refresh: bool,
}

async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PostMeta>>, ApiError> {
    let posts = state.cache.get_posts(params.refresh).await.map_err(|e| {
        error!(error = ?e, "failed to load posts");
        ApiError::internal("Failed to load posts")
    })?;

    Ok(Json(posts))
}

async fn get_post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    match state.cache.get_post(&slug).await {
        Err(e) => {
            error!(error = ?e, slug, "failed to load post");
            Err(ApiError::internal("Failed to load post"))
        }

        Ok(None) => Err(ApiError::not_found("Post not found")),

        Ok(Some(post)) => Ok(Json(post)),
    }
}

async fn list_tags_handler(
    State(state): State<AppState>,
) -> Result<Json<BTreeSet<String>>, ApiError> {
    let tags = state.cache.get_tags(false).await.map_err(|e| {
        error!(error = ?e, "failed to load tags");
        ApiError::internal("Failed to load tags")
    })?;

    Ok(Json(tags))
}
