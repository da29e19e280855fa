use crate::errors::FetchError;
use crate::model::{PageRecord, SiteConfig};
use crate::tenant::TenantIdentity;
use async_trait::async_trait;
use moka::future::Cache;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Value of the `X-Cache-Status` response header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Fallback,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Fallback => "FALLBACK",
        }
    }
}

/// Why no site config could be fetched from the CMS.
#[derive(thiserror::Error, Debug)]
pub enum ConfigMiss {
    #[error("CMS is not configured")]
    NotConfigured,
    #[error("no site record matches the tenant")]
    NoMatch,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type ConfigFetch<'a> = Pin<Box<dyn Future<Output = Result<SiteConfig, ConfigMiss>> + Send + 'a>>;

/// Per-tenant site config cache.
///
/// Only successful fetches are stored. Concurrent misses for the same key
/// share one fetch.
#[async_trait]
pub trait ConfigCache: Send + Sync {
    /// Returns the cached config, or runs `fetch` and caches its result.
    /// The status is `Hit` or `Miss`.
    async fn get_or_fetch(
        &self,
        key: &str,
        fetch: ConfigFetch<'_>,
    ) -> Result<(SiteConfig, CacheStatus), Arc<ConfigMiss>>;

    /// Drops every entry for the site `slug`, whether it was cached under its
    /// slug or under a host that resolved to it.
    async fn invalidate_site(&self, slug: &str);

    async fn invalidate_all(&self);
}

pub struct InMemoryConfigCache {
    cache: Cache<String, SiteConfig>,
}

impl InMemoryConfigCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        InMemoryConfigCache {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .support_invalidation_closures()
                .build(),
        }
    }
}

#[async_trait]
impl ConfigCache for InMemoryConfigCache {
    async fn get_or_fetch(
        &self,
        key: &str,
        fetch: ConfigFetch<'_>,
    ) -> Result<(SiteConfig, CacheStatus), Arc<ConfigMiss>> {
        let entry = self.cache.entry_by_ref(key).or_try_insert_with(fetch).await?;
        let status = if entry.is_fresh() {
            CacheStatus::Miss
        } else {
            CacheStatus::Hit
        };
        Ok((entry.into_value(), status))
    }

    async fn invalidate_site(&self, slug: &str) {
        let key = TenantIdentity::from_slug(slug).cache_key();
        self.cache.invalidate(&key).await;

        let slug = slug.to_string();
        if let Err(error) = self
            .cache
            .invalidate_entries_if(move |_, config| config.slug.as_deref() == Some(slug.as_str()))
        {
            tracing::warn!(%error, "could not invalidate cached site configs");
        }
    }

    async fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

/// Published pages keyed by tenant cache key and normalized path.
/// Lookups that find nothing are not stored.
pub struct PageCache {
    cache: Cache<(String, String), PageRecord>,
}

impl PageCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        PageCache {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .support_invalidation_closures()
                .build(),
        }
    }

    pub async fn get_or_fetch<F>(&self, tenant: &str, path: &str, fetch: F) -> Option<PageRecord>
    where
        F: Future<Output = Option<PageRecord>>,
    {
        self.cache
            .entry((tenant.to_string(), path.to_string()))
            .or_optionally_insert_with(fetch)
            .await
            .map(|entry| entry.into_value())
    }

    /// Drops the page at `path` for every tenant.
    pub fn invalidate_path(&self, path: &str) {
        let path = path.to_string();
        if let Err(error) = self
            .cache
            .invalidate_entries_if(move |(_, cached_path), _| *cached_path == path)
        {
            tracing::warn!(%error, "could not invalidate cached pages");
        }
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
