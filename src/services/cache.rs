use crate::domain::{Post, PostMeta};
use crate::io::ContentSource;
use crate::parser::markdown::{
    build_post_meta, compile_markdown_to_html, extract_frontmatter, resolve_post_link,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub const POSTS_LISTING_PATH: &str = "/api/posts";
pub const POST_DETAIL_PATH: &str = "/api/posts/{slug}";

/// One fetch of the posts folder.
#[derive(Debug)]
pub struct PostsSnapshot {
    pub posts: Vec<PostMeta>,
    pub tags: BTreeSet<String>,
    pub fetched_at: Instant,
    pub fetched_at_utc: DateTime<Utc>,
}

impl PostsSnapshot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

struct CachedPost {
    post: Post,
    fetched_at: Instant,
}

// read-through cache in front of the content store. locks are never held across a fetch,
// so concurrent refreshes can each hit the store. a fetch that started before an
// invalidation is handed back to its caller but never stored.
pub struct PostCache {
    source: Arc<dyn ContentSource>,
    posts_folder: String,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<PostsSnapshot>>>,
    details: RwLock<HashMap<String, CachedPost>>,
    // bumped under the matching write lock on every invalidation
    listing_generation: AtomicU64,
    details_generation: AtomicU64,
}

impl PostCache {
    pub fn new(source: Arc<dyn ContentSource>, posts_folder: String, ttl: Duration) -> Self {
        Self {
            source,
            posts_folder,
            ttl,
            snapshot: RwLock::new(None),
            details: RwLock::new(HashMap::new()),
            listing_generation: AtomicU64::new(0),
            details_generation: AtomicU64::new(0),
        }
    }

    /// Published posts, newest first. Served from memory while the last fetch is younger
    /// than the TTL unless `force_refresh` is set.
    pub async fn get_posts(&self, force_refresh: bool) -> Result<Vec<PostMeta>> {
        Ok(self.snapshot(force_refresh).await?.posts.clone())
    }

    pub async fn get_tags(&self, force_refresh: bool) -> Result<BTreeSet<String>> {
        Ok(self.snapshot(force_refresh).await?.tags.clone())
    }

    /// When the held listing was fetched, if there is one.
    pub async fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .map(|snapshot| snapshot.fetched_at_utc)
    }

    pub async fn snapshot(&self, force_refresh: bool) -> Result<Arc<PostsSnapshot>> {
        if !force_refresh {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref().filter(|s| s.is_fresh(self.ttl)) {
                debug!(posts = snapshot.posts.len(), "serving posts from cache");
                return Ok(snapshot.clone());
            }
        }

        let generation = self.listing_generation.load(Ordering::Acquire);
        let fresh = Arc::new(self.fetch_snapshot().await?);

        let mut guard = self.snapshot.write().await;
        if self.listing_generation.load(Ordering::Acquire) == generation {
            *guard = Some(fresh.clone());
        } else {
            debug!("listing invalidated during fetch, not caching it");
        }

        Ok(fresh)
    }

    /// Resolves `slug` through the listing and renders the post, caching the result
    /// under the same TTL as the listing.
    pub async fn get_post(&self, slug: &str) -> Result<Option<Post>> {
        {
            let details = self.details.read().await;
            if let Some(cached) = details.get(slug) {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(Some(cached.post.clone()));
                }
            }
        }

        let generation = self.details_generation.load(Ordering::Acquire);
        let snapshot = self.snapshot(false).await?;
        let Some(meta) = snapshot.posts.iter().find(|p| p.slug == slug).cloned() else {
            return Ok(None);
        };

        let raw_markdown = self.source.read_to_string(&meta.path).await?;
        let (_, md_content) = extract_frontmatter(&raw_markdown, &meta.path)?;
        let html_content = compile_markdown_to_html(&md_content, resolve_post_link)?;

        let post = Post {
            meta,
            md_content,
            html_content,
        };

        let mut details = self.details.write().await;
        if self.details_generation.load(Ordering::Acquire) == generation {
            details.insert(
                slug.to_string(),
                CachedPost {
                    post: post.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }

        Ok(Some(post))
    }

    /// Drops everything held so the next read goes to the content store.
    pub async fn clear(&self) {
        self.drop_listing().await;
        self.drop_details().await;
        info!("post cache cleared");
    }

    async fn drop_listing(&self) {
        let mut guard = self.snapshot.write().await;
        *guard = None;
        self.listing_generation.fetch_add(1, Ordering::AcqRel);
    }

    async fn drop_details(&self) {
        let mut details = self.details.write().await;
        details.clear();
        self.details_generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Drops the data backing one of the content routes. Returns false for paths this
    /// cache does not serve.
    pub async fn invalidate_path(&self, path: &str) -> bool {
        match path {
            POSTS_LISTING_PATH => {
                self.drop_listing().await;
                info!(path, "post listing invalidated");
                true
            }
            POST_DETAIL_PATH => {
                self.drop_details().await;
                info!(path, "post details invalidated");
                true
            }
            _ => false,
        }
    }

    async fn fetch_snapshot(&self) -> Result<PostsSnapshot> {
        let files = self
            .source
            .list_markdown_files(&self.posts_folder)
            .await
            .with_context(|| format!("Failed to list posts under {}", self.posts_folder))?;

        let mut posts = Vec::with_capacity(files.len());
        let mut slugs = HashSet::new();
        for file in files {
            let raw_markdown = self.source.read_to_string(&file.path).await?;

            // one broken header only hides that post
            let frontmatter = match extract_frontmatter(&raw_markdown, &file.path) {
                Ok((frontmatter, _)) => frontmatter,
                Err(e) => {
                    error!(error = %e, path = %file.path, "skipping post with invalid frontmatter");
                    continue;
                }
            };

            let meta = build_post_meta(frontmatter, &file.path);
            if !meta.published {
                continue;
            }

            // first file in listing order keeps the slug
            if !slugs.insert(meta.slug.clone()) {
                warn!(slug = %meta.slug, path = %file.path, "skipping post with duplicate slug");
                continue;
            }

            posts.push(meta);
        }

        // newest first, undated posts last
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));

        let tags = posts
            .iter()
            .flat_map(|post| post.tags.iter().cloned())
            .collect();

        info!(posts = posts.len(), folder = %self.posts_folder, "fetched posts from content store");

        Ok(PostsSnapshot {
            posts,
            tags,
            fetched_at: Instant::now(),
            fetched_at_utc: Utc::now(),
        })
    }
}
