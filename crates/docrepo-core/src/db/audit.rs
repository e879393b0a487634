use crate::{
    db::{
        StorageAccessor,
        repository::{ReadRepository, WriteRepository, to_document},
    },
    error::Error,
    query::Document,
    traits::Entity,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use time::OffsetDateTime;

///
/// AuditOperation
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuditOperation {
    Add,
    Update,
    Delete,
}

impl AuditOperation {
    /// `"{operation} {description}"` with trailing whitespace removed.
    #[must_use]
    pub fn label(self, description: Option<&str>) -> String {
        format!("{self} {}", description.unwrap_or_default())
            .trim_end()
            .to_string()
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Add => "Add",
            Self::Update => "Update",
            Self::Delete => "Delete",
        };

        write!(f, "{label}")
    }
}

///
/// AuditRecord
///
/// One append-only audit entry. Images are the JSON text of the entity
/// before and after the mutation; extra fields supplied by the provider
/// are stored alongside.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AuditRecord {
    pub collection: String,
    pub old_item: Option<String>,
    pub new_item: Option<String>,
    pub operation: String,
    pub operated_by: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub operated_at: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub extra: Document,
}

impl AuditRecord {
    pub fn new(operation: impl Into<String>, operated_by: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            operated_by: operated_by.into(),
            ..Self::default()
        }
    }
}

///
/// AuditInfoProvider
///
/// Supplies a fresh record (actor, extra fields) for an operation label.
///

pub trait AuditInfoProvider: Send + Sync {
    fn audit_shell(&self, operation: &str) -> AuditRecord;
}

///
/// AuditedRepository
///
/// Writes an audit record after each successful mutation. Audit
/// persistence failures are logged and never reach the caller; the
/// mutation and its audit record are not atomic.
///

pub struct AuditedRepository<R: WriteRepository> {
    inner: R,
    provider: Arc<dyn AuditInfoProvider>,
}

impl<R: WriteRepository> AuditedRepository<R> {
    pub fn new(inner: R, provider: Arc<dyn AuditInfoProvider>) -> Self {
        Self { inner, provider }
    }

    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.inner
    }

    pub async fn add_with_audit(
        &self,
        entity: R::Entity,
        description: Option<&str>,
        audit: Option<AuditRecord>,
    ) -> Result<R::Entity, Error> {
        let added = self.inner.add(entity).await?;
        self.record(AuditOperation::Add, description, audit, None, Some(&added))
            .await;

        Ok(added)
    }

    /// Update and audit both images. The prior image is fetched unless
    /// `old_entity` is supplied.
    pub async fn update_with_audit(
        &self,
        entity: R::Entity,
        old_entity: Option<R::Entity>,
        description: Option<&str>,
        audit: Option<AuditRecord>,
    ) -> Result<R::Entity, Error> {
        let old = match old_entity {
            Some(old) => Some(old),
            None => self.inner.get(&entity.key()).await?,
        };
        let updated = self.inner.update(entity).await?;
        self.record(
            AuditOperation::Update,
            description,
            audit,
            old.as_ref(),
            Some(&updated),
        )
        .await;

        Ok(updated)
    }

    /// Delete and audit the removed image. Nothing removed means no record.
    pub async fn delete_with_audit(
        &self,
        id: &<R::Entity as Entity>::Key,
        description: Option<&str>,
        audit: Option<AuditRecord>,
    ) -> Result<Option<R::Entity>, Error> {
        let Some(removed) = self.inner.find_and_delete(id).await? else {
            return Ok(None);
        };

        let described;
        let description = match description {
            Some(text) => Some(text),
            None => {
                described = removed.describe();
                Some(described.as_str())
            }
        };
        self.record(AuditOperation::Delete, description, audit, Some(&removed), None)
            .await;

        Ok(Some(removed))
    }

    async fn record(
        &self,
        operation: AuditOperation,
        description: Option<&str>,
        audit: Option<AuditRecord>,
        old: Option<&R::Entity>,
        new: Option<&R::Entity>,
    ) {
        let mut record = audit.unwrap_or_else(|| {
            self.provider
                .audit_shell(&operation.label(description))
        });
        record.collection = self.descriptor().namespace.full_name();
        record.operated_at = Some(OffsetDateTime::now_utc());

        if let Err(err) = self.persist(&mut record, old, new).await {
            let serialized = serde_json::to_string(&record).unwrap_or_default();
            tracing::error!(
                error = %err,
                record = %serialized,
                "audit persistence failed"
            );
        }
    }

    async fn persist(
        &self,
        record: &mut AuditRecord,
        old: Option<&R::Entity>,
        new: Option<&R::Entity>,
    ) -> Result<(), Error> {
        record.old_item = old.map(serde_json::to_string).transpose()?;
        record.new_item = new.map(serde_json::to_string).transpose()?;

        let doc = to_document(record)?;
        let accessor = self.accessor();

        accessor.run(accessor.audit_handle().insert_one(doc)).await
    }
}

impl<R: WriteRepository> ReadRepository for AuditedRepository<R> {
    type Entity = R::Entity;

    fn accessor(&self) -> &StorageAccessor<R::Entity> {
        self.inner.accessor()
    }
}

impl<R: WriteRepository> WriteRepository for AuditedRepository<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::StoreOptions,
        db::{BuildCoordinator, ReadWriteRepository},
        store::memory::MemoryEngine,
        test_fixtures::{Customer, accessor, audit_ns, customer, customers_ns},
    };
    use serde_json::{Value, json};

    struct Actor;

    impl AuditInfoProvider for Actor {
        fn audit_shell(&self, operation: &str) -> AuditRecord {
            let mut record = AuditRecord::new(operation, "tester");
            record.extra.insert("tenant".to_string(), json!("acme"));
            record
        }
    }

    fn audited(engine: &MemoryEngine) -> AuditedRepository<ReadWriteRepository<Customer>> {
        let accessor = accessor(engine, &BuildCoordinator::shared(), StoreOptions::new("rw"));

        AuditedRepository::new(ReadWriteRepository::new(accessor), Arc::new(Actor))
    }

    async fn records(engine: &MemoryEngine) -> Vec<AuditRecord> {
        engine
            .documents(&audit_ns())
            .await
            .into_iter()
            .map(|doc| serde_json::from_value(Value::Object(doc)).unwrap())
            .collect()
    }

    #[test]
    fn labels_drop_trailing_whitespace() {
        assert_eq!(AuditOperation::Add.label(None), "Add");
        assert_eq!(AuditOperation::Update.label(Some("")), "Update");
        assert_eq!(AuditOperation::Delete.label(Some("order 7 ")), "Delete order 7");
    }

    #[tokio::test]
    async fn add_records_new_image() {
        let engine = MemoryEngine::new();
        let repo = audited(&engine);

        repo.add_with_audit(customer("c1", " Ada ", 36), None, None)
            .await
            .unwrap();

        let records = records(&engine).await;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.operation, "Add");
        assert_eq!(record.operated_by, "tester");
        assert_eq!(record.collection, customers_ns().full_name());
        assert!(record.old_item.is_none());
        assert!(record.operated_at.is_some());
        assert_eq!(record.extra.get("tenant"), Some(&json!("acme")));

        let image: Customer = serde_json::from_str(record.new_item.as_deref().unwrap()).unwrap();
        assert_eq!(image.name, "Ada");
    }

    #[tokio::test]
    async fn update_fetches_prior_image_when_not_supplied() {
        let engine = MemoryEngine::new();
        let repo = audited(&engine);
        repo.add(customer("c1", "Ada", 36)).await.unwrap();

        repo.update_with_audit(customer("c1", "Ada", 37), None, Some("birthday"), None)
            .await
            .unwrap();

        let records = records(&engine).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, "Update birthday");
        let old: Customer = serde_json::from_str(records[0].old_item.as_deref().unwrap()).unwrap();
        let new: Customer = serde_json::from_str(records[0].new_item.as_deref().unwrap()).unwrap();
        assert_eq!((old.age, new.age), (36, 37));
    }

    #[tokio::test]
    async fn supplied_record_replaces_provider_shell() {
        let engine = MemoryEngine::new();
        let repo = audited(&engine);
        let prior = customer("c1", "Ada", 35);

        repo.update_with_audit(
            customer("c1", "Ada", 36),
            Some(prior),
            None,
            Some(AuditRecord::new("Correction", "admin")),
        )
        .await
        .unwrap();

        let records = records(&engine).await;
        assert_eq!(records[0].operation, "Correction");
        assert_eq!(records[0].operated_by, "admin");
        assert!(records[0].old_item.as_deref().unwrap().contains("35"));
    }

    #[tokio::test]
    async fn delete_describes_removed_entity() {
        let engine = MemoryEngine::new();
        let repo = audited(&engine);
        repo.add(customer("c1", "Ada", 36)).await.unwrap();

        let removed = repo
            .delete_with_audit(&"c1".to_string(), None, None)
            .await
            .unwrap();
        let missing = repo
            .delete_with_audit(&"c1".to_string(), None, None)
            .await
            .unwrap();

        assert_eq!(removed.map(|c| c.id), Some("c1".to_string()));
        assert!(missing.is_none());
        let records = records(&engine).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, "Delete Customer with Id: c1");
        assert!(records[0].new_item.is_none());
    }

    #[tokio::test]
    async fn audit_failure_does_not_fail_the_mutation() {
        let engine = MemoryEngine::new();
        let repo = audited(&engine);
        engine.fail_writes(&audit_ns());

        let added = repo
            .add_with_audit(customer("c1", "Ada", 36), None, None)
            .await
            .unwrap();

        assert_eq!(added.id, "c1");
        assert_eq!(engine.documents(&customers_ns()).await.len(), 1);
        assert!(engine.documents(&audit_ns()).await.is_empty());
    }
}
