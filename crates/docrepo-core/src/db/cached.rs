use crate::{
    db::{
        Cache, StorageAccessor,
        repository::{ReadRepository, WriteRepository, key_value},
    },
    error::Error,
    query::Filter,
};
use serde::Serialize;
use std::{fmt::Display, sync::Arc};

/// Cached value for one key; `None` records a confirmed absence.
pub type CachedEntity<E> = Option<E>;

///
/// CachedRepository
///
/// Read-through cache in front of a repository's read path. Lookups go
/// by one equality field (the key field unless configured otherwise).
/// Writes never invalidate; callers call `invalidate` themselves.
///

pub struct CachedRepository<R: ReadRepository> {
    inner: R,
    cache: Arc<dyn Cache<CachedEntity<R::Entity>>>,
    lookup_field: String,
    default_prefix: String,
}

impl<R: ReadRepository> CachedRepository<R> {
    pub fn new(inner: R, cache: Arc<dyn Cache<CachedEntity<R::Entity>>>) -> Self {
        let lookup_field = inner.descriptor().key_field.to_string();
        let default_prefix = inner.descriptor().type_name.to_string();

        Self {
            inner,
            cache,
            lookup_field,
            default_prefix,
        }
    }

    #[must_use]
    pub fn with_lookup_field(mut self, field: impl Into<String>) -> Self {
        self.lookup_field = field.into();
        self
    }

    #[must_use]
    pub fn with_default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = prefix.into();
        self
    }

    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.inner
    }

    /// `{prefix}-{id}`, falling back to the default prefix when `prefix`
    /// is absent or blank.
    pub fn cache_key(&self, id: &(impl Display + ?Sized), prefix: Option<&str>) -> String {
        let prefix = prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.default_prefix);

        format!("{prefix}-{id}")
    }

    /// Cached lookup by the configured equality field. A miss queries the
    /// read handle and caches the result, including an absence.
    pub async fn cached_get<K>(
        &self,
        id: &K,
        prefix: Option<&str>,
    ) -> Result<Option<R::Entity>, Error>
    where
        K: Serialize + Display + Sync + ?Sized,
    {
        let key = self.cache_key(id, prefix);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }

        let filter = Filter::eq(self.lookup_field.clone(), key_value(id)?);
        let found = self.inner.find_one(&filter).await?;
        tracing::debug!(key = %key, found = found.is_some(), "cache filled");
        self.cache.insert(key, found.clone()).await;

        Ok(found)
    }

    pub async fn invalidate<K>(&self, id: &K, prefix: Option<&str>)
    where
        K: Display + Sync + ?Sized,
    {
        let key = self.cache_key(id, prefix);
        self.cache.invalidate(&key).await;
    }
}

impl<R: ReadRepository> ReadRepository for CachedRepository<R> {
    type Entity = R::Entity;

    fn accessor(&self) -> &StorageAccessor<R::Entity> {
        self.inner.accessor()
    }
}

impl<R: WriteRepository> WriteRepository for CachedRepository<R> {}
