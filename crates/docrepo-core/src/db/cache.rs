use crate::{config::CacheOptions, error::ConfigError};
use async_trait::async_trait;
use std::time::Instant;

///
/// Cache
///
/// Process-local key/value cache consumed by `CachedRepository`.
/// The expiry policy belongs to the implementation.
///

#[async_trait]
pub trait Cache<V>: Send + Sync {
    async fn get(&self, key: &str) -> Option<V>;

    async fn insert(&self, key: String, value: V);

    async fn invalidate(&self, key: &str);
}

///
/// MemoryCache
///
/// Bounded cache with sliding (time-to-idle) and absolute (time-to-live)
/// expiry. A disabled cache misses every lookup and drops every insert.
///

pub struct MemoryCache<V> {
    inner: Option<moka::future::Cache<String, V>>,
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Build from validated options; a zero expiry or capacity is rejected.
    pub fn new(options: &CacheOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        if options.disable_cache {
            return Ok(Self { inner: None });
        }

        let inner = moka::future::Cache::builder()
            .max_capacity(options.max_item_count)
            .time_to_idle(options.sliding_expiration())
            .time_to_live(options.time_to_live())
            .build();

        Ok(Self { inner: Some(inner) })
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

#[async_trait]
impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let cache = self.inner.as_ref()?;
        let started = Instant::now();
        let found = cache.get(key).await;

        tracing::debug!(
            key,
            hit = found.is_some(),
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "cache lookup"
        );

        found
    }

    async fn insert(&self, key: String, value: V) {
        if let Some(cache) = &self.inner {
            cache.insert(key, value).await;
        }
    }

    async fn invalidate(&self, key: &str) {
        if let Some(cache) = &self.inner {
            cache.invalidate(key).await;
        }
    }
}
