use crate::services::cache::{POST_DETAIL_PATH, POSTS_LISTING_PATH, PostCache};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Every route whose cached data goes stale when the posts folder changes.
pub const CONTENT_PATHS: [&str; 2] = [POSTS_LISTING_PATH, POST_DETAIL_PATH];

#[async_trait]
pub trait PathInvalidator: Send + Sync {
    async fn invalidate_path(&self, path: &str) -> Result<()>;
}

pub struct CacheInvalidator {
    cache: Arc<PostCache>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<PostCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl PathInvalidator for CacheInvalidator {
    async fn invalidate_path(&self, path: &str) -> Result<()> {
        if !self.cache.invalidate_path(path).await {
            warn!(path, "no cached route matches path");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ForwardedRevalidation<'a> {
    path: &'a str,
}

/// Passes invalidations on to a downstream renderer (e.g. a frontend's own revalidate hook).
pub struct ForwardingInvalidator {
    pub client: Client,
    pub url: String,
    pub secret: String,
}

impl ForwardingInvalidator {
    pub fn new(url: String, secret: String) -> Self {
        Self {
            client: Client::new(),
            url,
            secret,
        }
    }
}

#[async_trait]
impl PathInvalidator for ForwardingInvalidator {
    async fn invalidate_path(&self, path: &str) -> Result<()> {
        info!(url = %self.url, path, "forwarding revalidation");
        let res = self
            .client
            .post(&self.url)
            .bearer_auth(&self.secret)
            .json(&ForwardedRevalidation { path })
            .send()
            .await;

        match res {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                anyhow::bail!("Downstream rejected revalidation of {}. Status: {}", path, response.status());
            }
            Err(e) => {
                anyhow::bail!("Failed to reach downstream revalidation hook: {}", e);
            }
        }
    }
}

/// Invalidates every content path through each configured invalidator, in order.
/// The first failure aborts the run; nothing is retried.
pub struct Revalidator {
    invalidators: Vec<Arc<dyn PathInvalidator>>,
}

impl Revalidator {
    pub fn new(invalidators: Vec<Arc<dyn PathInvalidator>>) -> Self {
        Self { invalidators }
    }

    pub async fn revalidate_content(&self) -> Result<()> {
        for path in CONTENT_PATHS {
            for invalidator in &self.invalidators {
                invalidator
                    .invalidate_path(path)
                    .await
                    .with_context(|| format!("Failed to invalidate {}", path))?;
            }
        }
        info!(paths = ?CONTENT_PATHS, "content paths revalidated");
        Ok(())
    }
}
