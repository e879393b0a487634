use crate::{
    config::StoreOptions,
    db::{BuildCoordinator, CustomIndexBuilder, TenantResolver},
    error::Error,
    schema::{EntityDescriptor, ResolveContext, plan_indexes, submit_indexes},
    store::{ClientFactory, DocumentCollection},
    traits::Entity,
};
use std::{future::Future, marker::PhantomData, sync::Arc, time::Duration};
use tracing::Instrument;

///
/// StorageAccessor
///
/// Resolved descriptor plus read, write and audit handles for one entity
/// type. The write handle provisions indexes the first time it is asked
/// for in a namespace; the read handle never does.
///

pub struct StorageAccessor<E: Entity> {
    descriptor: Arc<EntityDescriptor>,
    read: Arc<dyn DocumentCollection>,
    write: Arc<dyn DocumentCollection>,
    audit: Arc<dyn DocumentCollection>,
    coordinator: Arc<BuildCoordinator>,
    custom_index: Option<Arc<dyn CustomIndexBuilder>>,
    timeout: Option<Duration>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> StorageAccessor<E> {
    #[must_use]
    pub fn builder(
        options: StoreOptions,
        factory: Arc<dyn ClientFactory>,
        coordinator: Arc<BuildCoordinator>,
    ) -> StorageAccessorBuilder<E> {
        StorageAccessorBuilder {
            options,
            factory,
            coordinator,
            tenant: None,
            custom_index: None,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub const fn coordinator(&self) -> &Arc<BuildCoordinator> {
        &self.coordinator
    }

    /// Read handle; available regardless of provisioning state.
    #[must_use]
    pub fn read_handle(&self) -> &dyn DocumentCollection {
        self.read.as_ref()
    }

    /// Write handle, provisioning the namespace's indexes on first use.
    pub async fn write_handle(&self) -> Result<&dyn DocumentCollection, Error> {
        let key = self.descriptor.namespace_key();
        self.coordinator
            .get_or_build(&key, || {
                self.provision()
                    .instrument(tracing::info_span!("provision", namespace = %key))
            })
            .await?;

        Ok(self.write.as_ref())
    }

    /// Audit collection on the write endpoint. Never provisions.
    #[must_use]
    pub fn audit_handle(&self) -> &dyn DocumentCollection {
        self.audit.as_ref()
    }

    /// Await `fut`, bounded by the configured operation timeout.
    pub async fn run<T, Er, F>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Er>>,
        Error: From<Er>,
    {
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => fut.await,
        };

        Ok(output?)
    }

    async fn provision(&self) -> Result<(), Error> {
        let namespace = &self.descriptor.namespace;
        let requests = plan_indexes(&self.descriptor);
        let planned = requests.len();
        let created = submit_indexes(self.write.as_ref(), requests).await?;

        tracing::info!(
            entity = self.descriptor.type_name,
            namespace = %namespace,
            planned,
            created,
            "indexes provisioned"
        );

        if let Some(custom) = &self.custom_index {
            for result in custom.build_customized_index().await? {
                tracing::info!(
                    database = %result.database,
                    collection = %result.collection,
                    "custom indexes built"
                );
            }
        }

        Ok(())
    }
}

///
/// StorageAccessorBuilder
///

pub struct StorageAccessorBuilder<E: Entity> {
    options: StoreOptions,
    factory: Arc<dyn ClientFactory>,
    coordinator: Arc<BuildCoordinator>,
    tenant: Option<Arc<dyn TenantResolver>>,
    custom_index: Option<Arc<dyn CustomIndexBuilder>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> StorageAccessorBuilder<E> {
    #[must_use]
    pub fn tenant(mut self, tenant: Arc<dyn TenantResolver>) -> Self {
        self.tenant = Some(tenant);
        self
    }

    #[must_use]
    pub fn custom_index(mut self, builder: Arc<dyn CustomIndexBuilder>) -> Self {
        self.custom_index = Some(builder);
        self
    }

    pub fn build(self) -> Result<StorageAccessor<E>, Error> {
        self.options.validate()?;

        let (prefix, suffix) = self
            .tenant
            .as_ref()
            .map(|tenant| (tenant.prefix(), tenant.suffix()))
            .unwrap_or_default();
        let ctx = ResolveContext {
            prefix: &prefix,
            suffix: &suffix,
            default_database: self.options.default_database.as_deref(),
        };
        let descriptor = self.coordinator.descriptor::<E>(&ctx)?;

        let read_client = self.factory.client(self.options.read_endpoint())?;
        let write_client = self.factory.client(&self.options.read_write_connection)?;

        tracing::debug!(
            entity = descriptor.type_name,
            namespace = %descriptor.namespace,
            "storage accessor ready"
        );

        Ok(StorageAccessor {
            read: read_client.collection(&descriptor.namespace),
            write: write_client.collection(&descriptor.namespace),
            audit: write_client.collection(&descriptor.audit_namespace()),
            descriptor,
            coordinator: self.coordinator,
            custom_index: self.custom_index,
            timeout: self.options.operation_timeout(),
            _entity: PhantomData,
        })
    }
}
