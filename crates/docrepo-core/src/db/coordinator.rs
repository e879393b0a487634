use crate::{
    error::{ConfigError, Error},
    schema::{EntityDescriptor, ResolveContext, resolve},
    store::NamespaceKey,
    traits::Entity,
};
use dashmap::{DashMap, DashSet};
use std::{any::TypeId, future::Future, sync::Arc};

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct DescriptorKey {
    entity: TypeId,
    prefix: String,
    suffix: String,
    default_database: Option<String>,
}

///
/// BuildCoordinator
///
/// Process-scoped record of namespaces whose indexes were provisioned,
/// plus a cache of resolved descriptors.
///
/// Skipping a known namespace is an optimization only: concurrent first
/// callers may both build, and index creation is idempotent underneath.
///

#[derive(Debug, Default)]
pub struct BuildCoordinator {
    built: DashSet<NamespaceKey>,
    descriptors: DashMap<DescriptorKey, Arc<EntityDescriptor>>,
}

impl BuildCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Run `build` unless `key` was already built. Returns whether it ran.
    /// A failed build leaves `key` unmarked.
    pub async fn get_or_build<F, Fut>(&self, key: &NamespaceKey, build: F) -> Result<bool, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        if self.built.contains(key) {
            return Ok(false);
        }

        build().await?;
        self.built.insert(key.clone());

        Ok(true)
    }

    #[must_use]
    pub fn is_built(&self, key: &NamespaceKey) -> bool {
        self.built.contains(key)
    }

    #[must_use]
    pub fn built_count(&self) -> usize {
        self.built.len()
    }

    /// Resolve (or fetch the cached) descriptor for `E` under `ctx`.
    pub fn descriptor<E: Entity>(
        &self,
        ctx: &ResolveContext<'_>,
    ) -> Result<Arc<EntityDescriptor>, ConfigError> {
        let key = DescriptorKey {
            entity: TypeId::of::<E>(),
            prefix: ctx.prefix.to_string(),
            suffix: ctx.suffix.to_string(),
            default_database: ctx.default_database.map(str::to_string),
        };
        if let Some(found) = self.descriptors.get(&key) {
            return Ok(Arc::clone(&found));
        }

        let descriptor = Arc::new(resolve(E::MODEL, ctx)?);
        self.descriptors.insert(key, Arc::clone(&descriptor));

        Ok(descriptor)
    }

    /// Forget every built namespace and cached descriptor.
    /// Not synchronized with builds already in flight.
    pub fn reset(&self) {
        self.built.clear();
        self.descriptors.clear();
    }
}
