use super::*;
use crate::{
    config::StoreOptions,
    db::{BuildCoordinator, CustomIndexBuilder, CustomIndexResult, StorageAccessor},
    error::ErrorClass,
    query::{QueryError, Sort},
    store::{FindAndModifyOptions, memory::MemoryEngine},
    test_fixtures::{Customer, accessor, customer, customers_ns},
};
use async_trait::async_trait;
use serde_json::{Map, json};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

///
/// SETUP
///

struct Harness {
    engine: MemoryEngine,
    coordinator: Arc<BuildCoordinator>,
}

impl Harness {
    fn new() -> Self {
        Self {
            engine: MemoryEngine::new(),
            coordinator: BuildCoordinator::shared(),
        }
    }

    fn accessor(&self, options: StoreOptions) -> StorageAccessor<Customer> {
        accessor(&self.engine, &self.coordinator, options)
    }

    fn read_write(&self) -> ReadWriteRepository<Customer> {
        ReadWriteRepository::new(self.accessor(StoreOptions::new("rw")))
    }

    fn read_only(&self) -> ReadOnlyRepository<Customer> {
        ReadOnlyRepository::new(self.accessor(StoreOptions::new("rw")))
    }

    async fn seed(&self, repo: &ReadWriteRepository<Customer>) {
        for (id, name, age) in [("c3", "Cy", 52), ("c1", "Ada", 36), ("c2", "Bo", 28)] {
            repo.add(customer(id, name, age)).await.unwrap();
        }
    }
}

fn ids(items: &[Customer]) -> Vec<&str> {
    items.iter().map(|c| c.id.as_str()).collect()
}

fn fields(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Map::new(),
    }
}

///
/// WRITES
///

#[tokio::test]
async fn add_trims_text_and_reads_back() {
    let h = Harness::new();
    let repo = h.read_write();

    let mut padded = customer(" c1 ", "  Ada ", 36);
    padded.email = Some(" ada@example.com\t".to_string());
    let added = repo.add(padded).await.unwrap();

    assert_eq!(added.id, "c1");
    assert_eq!(added.name, "Ada");
    let stored = repo.get(&"c1".to_string()).await.unwrap().unwrap();
    assert_eq!(stored, added);
    assert_eq!(stored.email.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn first_write_provisions_once() {
    let h = Harness::new();
    let repo = h.read_write();
    let key = customers_ns().key();

    assert!(!h.coordinator.is_built(&key));
    repo.add(customer("c1", "Ada", 36)).await.unwrap();
    repo.add(customer("c2", "Bo", 28)).await.unwrap();

    let stats = h.engine.stats(&customers_ns());
    assert!(h.coordinator.is_built(&key));
    assert_eq!(stats.list_indexes, 1);
    assert_eq!(stats.create_indexes, 2);

    let names: Vec<_> = h
        .engine
        .indexes(&customers_ns())
        .await
        .into_iter()
        .map(|index| index.name)
        .collect();
    assert_eq!(names, ["City", "Name"]);
}

#[tokio::test]
async fn read_only_repository_never_provisions() {
    let h = Harness::new();
    let repo = h.read_only();

    assert!(repo.get(&"c1".to_string()).await.unwrap().is_none());
    assert!(repo.get_all(&Filter::All, None, None, None).await.unwrap().is_empty());
    assert_eq!(repo.count(&Filter::All).await.unwrap(), 0);

    let stats = h.engine.stats(&customers_ns());
    assert_eq!(stats.list_indexes + stats.create_indexes, 0);
    assert_eq!(h.coordinator.built_count(), 0);
}

#[tokio::test]
async fn reads_and_writes_use_their_own_endpoints() {
    let h = Harness::new();
    let repo = ReadWriteRepository::new(h.accessor(StoreOptions::new("rw").with_read_only("ro")));

    repo.add(customer("c1", "Ada", 36)).await.unwrap();
    repo.get(&"c1".to_string()).await.unwrap();

    assert_eq!(h.engine.endpoint_stats("rw").inserts, 1);
    assert_eq!(h.engine.endpoint_stats("rw").finds, 0);
    assert_eq!(h.engine.endpoint_stats("ro").finds, 1);
    assert_eq!(h.engine.endpoint_stats("ro").writes(), 0);
}

#[tokio::test]
async fn duplicate_key_reaches_caller() {
    let h = Harness::new();
    let repo = h.read_write();

    repo.add(customer("c1", "Ada", 36)).await.unwrap();
    let err = repo.add(customer("c2", "ADA", 40)).await.unwrap_err();

    assert!(err.is_duplicate_key());
    assert_eq!(err.class(), ErrorClass::Conflict);
    assert_eq!(repo.count(&Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn add_range_inserts_all_sanitized() {
    let h = Harness::new();
    let repo = h.read_write();

    let added = repo
        .add_range(vec![customer("c1", " Ada", 36), customer("c2", "Bo ", 28)])
        .await
        .unwrap();

    assert_eq!(added[0].name, "Ada");
    assert_eq!(added[1].name, "Bo");
    assert_eq!(repo.count(&Filter::All).await.unwrap(), 2);
}

#[tokio::test]
async fn update_replaces_or_inserts_by_key() {
    let h = Harness::new();
    let repo = h.read_write();

    repo.update(customer("c1", "Ada", 36)).await.unwrap();
    repo.update(customer("c1", "Ada Lovelace", 37)).await.unwrap();

    let all = repo.get_all(&Filter::All, None, None, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Ada Lovelace");
    assert_eq!(all[0].age, 37);
}

#[tokio::test]
async fn delete_reports_whether_anything_was_removed() {
    let h = Harness::new();
    let repo = h.read_write();
    h.seed(&repo).await;

    assert!(repo.delete(&"c1".to_string()).await.unwrap());
    assert!(!repo.delete(&"c1".to_string()).await.unwrap());

    let removed = repo.find_and_delete(&"c2".to_string()).await.unwrap();
    assert_eq!(removed.map(|c| c.name), Some("Bo".to_string()));
    assert!(repo.find_and_delete(&"c2".to_string()).await.unwrap().is_none());
    assert_eq!(repo.count(&Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn update_with_version_checks_the_stored_version() {
    let h = Harness::new();
    let repo = h.read_write();
    let mut stored = customer("c1", "Ada", 36);
    stored.version = 1;
    repo.add(stored.clone()).await.unwrap();

    let mut stale = stored.clone();
    stale.version = 6;
    stale.age = 99;
    let (written, _) = repo
        .update_with_version(stale, "version", Some(5), ReplaceOptions::default())
        .await
        .unwrap();
    assert!(!written);
    assert_eq!(repo.get(&"c1".to_string()).await.unwrap().unwrap().age, 36);

    let mut next = stored.clone();
    next.version = 2;
    next.age = 37;
    let (written, entity) = repo
        .update_with_version(next, "version", Some(1), ReplaceOptions::default())
        .await
        .unwrap();
    assert!(written);
    assert_eq!(entity.version, 2);
    assert_eq!(repo.get(&"c1".to_string()).await.unwrap().unwrap().age, 37);

    let mut forced = stored;
    forced.age = 50;
    let (written, _) = repo
        .update_with_version(forced, "version", None, ReplaceOptions::default())
        .await
        .unwrap();
    assert!(written);
    assert_eq!(repo.get(&"c1".to_string()).await.unwrap().unwrap().age, 50);
}

#[tokio::test]
async fn stale_version_never_upserts_a_second_copy() {
    let h = Harness::new();
    let repo = h.read_write();
    let upsert = ReplaceOptions { upsert: true };
    let mut stored = customer("c1", "Ada", 36);
    stored.version = 3;
    repo.add(stored.clone()).await.unwrap();

    let mut next = stored.clone();
    next.version = 4;
    let (written, _) = repo
        .update_with_version(next, "version", Some(3), upsert)
        .await
        .unwrap();
    assert!(written);

    let mut replay = stored.clone();
    replay.age = 99;
    let (written, entity) = repo
        .update_with_version(replay, "version", Some(3), upsert)
        .await
        .unwrap();
    assert!(!written);
    assert_eq!(entity.age, 99);

    let docs = h.engine.documents(&customers_ns()).await;
    assert_eq!(docs.len(), 1);
    assert_eq!((docs[0]["version"].clone(), docs[0]["age"].clone()), (json!(4), json!(36)));

    let mut fresh = customer("c2", "Bo", 20);
    fresh.version = 1;
    let (written, _) = repo
        .update_with_version(fresh, "version", Some(0), upsert)
        .await
        .unwrap();
    assert!(written);
    assert_eq!(repo.get(&"c2".to_string()).await.unwrap().map(|c| c.version), Some(1));
}

#[tokio::test]
async fn upsert_replaces_the_first_match() {
    let h = Harness::new();
    let repo = h.read_write();
    h.seed(&repo).await;

    let replaced = repo
        .upsert(
            customer("c1", "Ada King", 36),
            &Filter::eq("id", "c1"),
            FindAndModifyOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(replaced.map(|c| c.name), Some("Ada King".to_string()));

    let missing = repo
        .upsert(
            customer("c9", "Nobody", 1),
            &Filter::eq("id", "c9"),
            FindAndModifyOptions {
                upsert: false,
                ..FindAndModifyOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(missing.is_none());
    assert_eq!(repo.count(&Filter::All).await.unwrap(), 3);
}

#[tokio::test]
async fn find_or_create_only_seeds_new_documents() {
    let h = Harness::new();
    let repo = h.read_write();
    let filter = Filter::eq("id", "c9");

    let created = repo
        .find_or_create(
            &filter,
            fields(json!({ "name": "Neo", "age": 40 })),
            FindAndModifyOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!((created.id.as_str(), created.name.as_str()), ("c9", "Neo"));

    let existing = repo
        .find_or_create(
            &filter,
            fields(json!({ "name": "Other" })),
            FindAndModifyOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.name, "Neo");

    let updated = repo
        .find_and_update(&filter, fields(json!({ "age": 41 })), FindAndModifyOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!((updated.name.as_str(), updated.age), ("Neo", 41));

    let again = repo
        .find_and_update(&filter, fields(json!({ "age": 42 })), FindAndModifyOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.age, 42);
    assert_eq!(repo.get(&"c9".to_string()).await.unwrap().map(|c| c.age), Some(42));
    assert_eq!(repo.count(&Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_fields_fail_before_reaching_storage() {
    let h = Harness::new();
    let repo = h.read_write();

    let err = repo
        .find_and_update(
            &Filter::eq("id", "c1"),
            fields(json!({ "shoe": 42 })),
            FindAndModifyOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Query(QueryError::UnknownField { ref field, .. }) if field == "shoe"
    ));

    let err = repo
        .update_with_version(
            customer("c1", "Ada", 36),
            "revision",
            Some(1),
            ReplaceOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::InvalidInput);

    let stats = h.engine.stats(&customers_ns());
    assert_eq!(stats.writes() + stats.create_indexes, 0);
}

#[tokio::test]
async fn unavailable_engine_surfaces_as_error() {
    let h = Harness::new();
    let repo = h.read_write();
    h.engine.fail_writes(&customers_ns());

    let err = repo.add(customer("c1", "Ada", 36)).await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Unavailable);
}

///
/// READS
///

#[tokio::test]
async fn get_all_sorts_by_key_and_pages() {
    let h = Harness::new();
    let repo = h.read_write();
    h.seed(&repo).await;

    let all = repo.get_all(&Filter::All, None, None, None).await.unwrap();
    assert_eq!(ids(&all), ["c1", "c2", "c3"]);

    let page = repo
        .get_all(&Filter::All, None, Some(2), Some(2))
        .await
        .unwrap();
    assert_eq!(ids(&page), ["c3"]);

    let clamped = repo
        .get_all(&Filter::All, None, Some(0), Some(-5))
        .await
        .unwrap();
    assert_eq!(ids(&clamped), ["c1"]);

    let unpaged = repo.get_all(&Filter::All, None, Some(2), None).await.unwrap();
    assert_eq!(unpaged.len(), 3);

    let by_age = repo
        .get_all(&Filter::All, Some(&Sort::descending("age")), None, None)
        .await
        .unwrap();
    assert_eq!(ids(&by_age), ["c3", "c1", "c2"]);
}

#[tokio::test]
async fn get_many_returns_known_keys_in_key_order() {
    let h = Harness::new();
    let repo = h.read_write();
    h.seed(&repo).await;

    let found = repo
        .get_many(&["c3".to_string(), "c1".to_string(), "zz".to_string()])
        .await
        .unwrap();

    assert_eq!(ids(&found), ["c1", "c3"]);
}

#[tokio::test]
async fn text_queries_parse_filters_and_sorts() {
    let h = Harness::new();
    let repo = h.read_write();
    h.seed(&repo).await;

    let older = repo
        .get_all_text(r#"{"age": {"$gte": 30}}"#, Some(r#"{"age": -1}"#), None, None)
        .await
        .unwrap();
    assert_eq!(ids(&older), ["c3", "c1"]);

    assert_eq!(repo.count_text("  ").await.unwrap(), 3);
    assert_eq!(repo.count_text(r#"{"name": "Bo"}"#).await.unwrap(), 1);

    let one = repo.find_one_text(r#"{"id": "c2"}"#).await.unwrap();
    assert_eq!(one.map(|c| c.age), Some(28));

    let err = repo.count_text("{not json").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::InvalidInput);
}

#[tokio::test]
async fn get_paginated_resolves_sort_field() {
    let h = Harness::new();
    let repo = h.read_write();
    h.seed(&repo).await;

    let result = repo
        .get_paginated(&Filter::All, Some(1), Some(2), Some("AGE"), true)
        .await
        .unwrap();
    assert_eq!(ids(&result.items), ["c3", "c1"]);
    assert_eq!(
        result.page_info,
        PageInfo {
            page_number: Some(1),
            page_size: Some(2),
            total_count: 3,
            sort_by: "age".to_string(),
            descending: true,
        }
    );

    for sort_by in [None, Some("null"), Some("undefined")] {
        let result = repo
            .get_paginated(&Filter::All, None, None, sort_by, false)
            .await
            .unwrap();
        assert_eq!(result.page_info.sort_by, "id");
        assert_eq!(ids(&result.items), ["c1", "c2", "c3"]);
    }

    let err = repo
        .get_paginated(&Filter::All, None, None, Some("shoe"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::UnknownField { .. })));
}

///
/// PROVISIONING
///

struct FlakyIndexes {
    calls: AtomicUsize,
}

#[async_trait]
impl CustomIndexBuilder for FlakyIndexes {
    async fn build_customized_index(&self) -> Result<Vec<CustomIndexResult>, Error> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(crate::store::StoreError::Unavailable {
                endpoint: "rw".to_string(),
                reason: "index build interrupted".to_string(),
            }
            .into());
        }

        Ok(vec![CustomIndexResult {
            database: "Crm".to_string(),
            collection: "Customers".to_string(),
        }])
    }
}

#[tokio::test]
async fn failed_provisioning_is_retried_by_the_next_write() {
    let h = Harness::new();
    let flaky = Arc::new(FlakyIndexes {
        calls: AtomicUsize::new(0),
    });
    let accessor = StorageAccessor::builder(
        StoreOptions::new("rw"),
        Arc::new(h.engine.clone()),
        Arc::clone(&h.coordinator),
    )
    .custom_index(Arc::clone(&flaky) as Arc<dyn CustomIndexBuilder>)
    .build()
    .unwrap();
    let repo = ReadWriteRepository::new(accessor);

    assert!(repo.add(customer("c1", "Ada", 36)).await.is_err());
    assert!(!h.coordinator.is_built(&customers_ns().key()));
    assert_eq!(repo.count(&Filter::All).await.unwrap(), 0);

    repo.add(customer("c1", "Ada", 36)).await.unwrap();
    repo.add(customer("c2", "Bo", 28)).await.unwrap();

    assert!(h.coordinator.is_built(&customers_ns().key()));
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn slow_operations_time_out() {
    let h = Harness::new();
    let accessor = h.accessor(StoreOptions::new("rw").with_timeout_ms(5));

    let err = accessor
        .run(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, Error>(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(limit) if limit == Duration::from_millis(5)));
    assert_eq!(err.class(), ErrorClass::Timeout);
}
