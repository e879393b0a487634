//! In-memory storage engine.
//!
//! Every endpoint of one `MemoryEngine` sees the same namespaces, so a
//! read-only endpoint observes writes made through the read-write one.
//! Expiry indexes are recorded but documents never expire.

use crate::{
    query::{Document, Filter, UpdateDocument, set_path, values_at},
    store::{
        ClientFactory, Collation, DOCUMENT_ID, DocumentCollection, FindAndModifyOptions, FindQuery,
        IndexRequest, Namespace, ReplaceOutcome, ReturnDocument, StorageClient, StoreError,
    },
};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::RwLock;

const ID_INDEX: &str = "_id_";

///
/// OpStats
///
/// Snapshot of operation counters for one namespace or endpoint.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OpStats {
    pub finds: u64,
    pub counts: u64,
    pub inserts: u64,
    pub replaces: u64,
    pub deletes: u64,
    pub updates: u64,
    pub list_indexes: u64,
    pub create_indexes: u64,
}

impl OpStats {
    #[must_use]
    pub const fn reads(&self) -> u64 {
        self.finds + self.counts
    }

    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.inserts + self.replaces + self.deletes + self.updates
    }
}

#[derive(Default)]
struct OpCounters {
    finds: AtomicU64,
    counts: AtomicU64,
    inserts: AtomicU64,
    replaces: AtomicU64,
    deletes: AtomicU64,
    updates: AtomicU64,
    list_indexes: AtomicU64,
    create_indexes: AtomicU64,
}

impl OpCounters {
    fn snapshot(&self) -> OpStats {
        OpStats {
            finds: self.finds.load(Ordering::Relaxed),
            counts: self.counts.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            replaces: self.replaces.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            list_indexes: self.list_indexes.load(Ordering::Relaxed),
            create_indexes: self.create_indexes.load(Ordering::Relaxed),
        }
    }
}

#[derive(Default)]
struct CollectionData {
    docs: Vec<Document>,
    indexes: Vec<IndexRequest>,
}

#[derive(Default)]
struct EngineState {
    collections: DashMap<Namespace, Arc<RwLock<CollectionData>>>,
    namespace_ops: DashMap<Namespace, Arc<OpCounters>>,
    endpoint_ops: DashMap<String, Arc<OpCounters>>,
    failing: DashSet<Namespace>,
}

///
/// MemoryEngine
///

#[derive(Clone, Default)]
pub struct MemoryEngine {
    state: Arc<EngineState>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self, namespace: &Namespace) -> OpStats {
        self.state
            .namespace_ops
            .get(namespace)
            .map(|ops| ops.snapshot())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn endpoint_stats(&self, endpoint: &str) -> OpStats {
        self.state
            .endpoint_ops
            .get(endpoint)
            .map(|ops| ops.snapshot())
            .unwrap_or_default()
    }

    /// Make every subsequent write to `namespace` fail as unavailable.
    pub fn fail_writes(&self, namespace: &Namespace) {
        self.state.failing.insert(namespace.clone());
    }

    pub fn restore_writes(&self, namespace: &Namespace) {
        self.state.failing.remove(namespace);
    }

    pub async fn documents(&self, namespace: &Namespace) -> Vec<Document> {
        let data = self.data(namespace);
        let guard = data.read().await;

        guard.docs.clone()
    }

    pub async fn indexes(&self, namespace: &Namespace) -> Vec<IndexRequest> {
        let data = self.data(namespace);
        let guard = data.read().await;

        guard.indexes.clone()
    }

    #[must_use]
    pub fn namespaces(&self) -> Vec<Namespace> {
        let mut out: Vec<_> = self
            .state
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        out.sort();

        out
    }

    fn data(&self, namespace: &Namespace) -> Arc<RwLock<CollectionData>> {
        self.state
            .collections
            .entry(namespace.clone())
            .or_default()
            .clone()
    }

    fn namespace_counters(&self, namespace: &Namespace) -> Arc<OpCounters> {
        self.state
            .namespace_ops
            .entry(namespace.clone())
            .or_default()
            .clone()
    }

    fn endpoint_counters(&self, endpoint: &str) -> Arc<OpCounters> {
        self.state
            .endpoint_ops
            .entry(endpoint.to_string())
            .or_default()
            .clone()
    }
}

impl ClientFactory for MemoryEngine {
    fn client(&self, endpoint: &str) -> Result<Arc<dyn StorageClient>, StoreError> {
        Ok(Arc::new(MemoryClient {
            engine: self.clone(),
            endpoint: endpoint.to_string(),
        }))
    }
}

///
/// MemoryClient
///

pub struct MemoryClient {
    engine: MemoryEngine,
    endpoint: String,
}

impl StorageClient for MemoryClient {
    fn collection(&self, namespace: &Namespace) -> Arc<dyn DocumentCollection> {
        Arc::new(MemoryCollection {
            namespace: namespace.clone(),
            endpoint: self.endpoint.clone(),
            data: self.engine.data(namespace),
            namespace_ops: self.engine.namespace_counters(namespace),
            endpoint_ops: self.engine.endpoint_counters(&self.endpoint),
            engine: self.engine.clone(),
        })
    }
}

///
/// MemoryCollection
///

pub struct MemoryCollection {
    namespace: Namespace,
    endpoint: String,
    data: Arc<RwLock<CollectionData>>,
    namespace_ops: Arc<OpCounters>,
    endpoint_ops: Arc<OpCounters>,
    engine: MemoryEngine,
}

impl MemoryCollection {
    fn record(&self, pick: impl Fn(&OpCounters) -> &AtomicU64) {
        pick(&self.namespace_ops).fetch_add(1, Ordering::Relaxed);
        pick(&self.endpoint_ops).fetch_add(1, Ordering::Relaxed);
    }

    fn check_writable(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.engine.state.failing.contains(&self.namespace) {
            return Err(StoreError::Unavailable {
                endpoint: self.endpoint.clone(),
                reason: format!("{operation} on {} failed", self.namespace),
            });
        }

        Ok(())
    }

    fn duplicate(&self, index: &str, key: &Value) -> StoreError {
        StoreError::DuplicateKey {
            namespace: self.namespace.full_name(),
            index: index.to_string(),
            key: key.to_string(),
        }
    }

    // Validate `candidate` against the id and every unique index, ignoring
    // the document at `replacing`.
    fn check_unique(
        &self,
        data: &CollectionData,
        candidate: &Document,
        replacing: Option<usize>,
    ) -> Result<(), StoreError> {
        let others = || {
            data.docs
                .iter()
                .enumerate()
                .filter(move |(pos, _)| Some(*pos) != replacing)
                .map(|(_, doc)| doc)
        };

        if let Some(id) = candidate.get(DOCUMENT_ID)
            && others().any(|doc| doc.get(DOCUMENT_ID) == Some(id))
        {
            return Err(self.duplicate(ID_INDEX, id));
        }

        for index in data.indexes.iter().filter(|index| index.unique) {
            if !in_partial(index, candidate) {
                continue;
            }
            let key = unique_key(index, candidate);
            if others().any(|doc| in_partial(index, doc) && unique_key(index, doc) == key) {
                return Err(self.duplicate(&index.name, &key));
            }
        }

        Ok(())
    }

    fn insert_locked(&self, data: &mut CollectionData, mut doc: Document) -> Result<(), StoreError> {
        ensure_id(&mut doc);
        self.check_unique(data, &doc, None)?;
        data.docs.push(doc);

        Ok(())
    }

    // Replace the document at `pos`, keeping its engine id.
    fn replace_at(
        &self,
        data: &mut CollectionData,
        pos: usize,
        mut doc: Document,
    ) -> Result<Document, StoreError> {
        if let Some(id) = data.docs[pos].get(DOCUMENT_ID).cloned() {
            doc.insert(DOCUMENT_ID.to_string(), id);
        }
        self.check_unique(data, &doc, Some(pos))?;

        Ok(std::mem::replace(&mut data.docs[pos], doc))
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn find(&self, query: FindQuery) -> Result<Vec<Document>, StoreError> {
        self.record(|c| &c.finds);
        let data = self.data.read().await;

        let mut docs: Vec<Document> = data
            .docs
            .iter()
            .filter(|doc| query.filter.matches(doc))
            .cloned()
            .collect();
        if !query.sort.is_empty() {
            docs.sort_by(|a, b| query.sort.compare(a, b));
        }

        let skip = usize::try_from(query.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.record(|c| &c.counts);
        let data = self.data.read().await;
        let count = data.docs.iter().filter(|doc| filter.matches(doc)).count();

        Ok(count as u64)
    }

    async fn insert_one(&self, doc: Document) -> Result<(), StoreError> {
        self.record(|c| &c.inserts);
        self.check_writable("insert")?;
        let mut data = self.data.write().await;

        self.insert_locked(&mut data, doc)
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<(), StoreError> {
        self.record(|c| &c.inserts);
        self.check_writable("insert")?;
        let mut data = self.data.write().await;

        for doc in docs {
            self.insert_locked(&mut data, doc)?;
        }

        Ok(())
    }

    async fn replace_one(
        &self,
        filter: &Filter,
        doc: Document,
        upsert: bool,
    ) -> Result<ReplaceOutcome, StoreError> {
        self.record(|c| &c.replaces);
        self.check_writable("replace")?;
        let mut data = self.data.write().await;

        if let Some(pos) = position(&data, filter) {
            let previous = self.replace_at(&mut data, pos, doc)?;
            let modified = u64::from(previous != data.docs[pos]);

            return Ok(ReplaceOutcome {
                matched: 1,
                modified,
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(ReplaceOutcome::default());
        }

        let mut doc = seed_replacement(filter, doc);
        ensure_id(&mut doc);
        let id = doc.get(DOCUMENT_ID).cloned();
        self.insert_locked(&mut data, doc)?;

        Ok(ReplaceOutcome {
            matched: 0,
            modified: 0,
            upserted_id: id,
        })
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        Ok(u64::from(self.find_one_and_delete(filter).await?.is_some()))
    }

    async fn find_one_and_delete(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.record(|c| &c.deletes);
        self.check_writable("delete")?;
        let mut data = self.data.write().await;

        Ok(position(&data, filter).map(|pos| data.docs.remove(pos)))
    }

    async fn find_one_and_replace(
        &self,
        filter: &Filter,
        doc: Document,
        options: FindAndModifyOptions,
    ) -> Result<Option<Document>, StoreError> {
        self.record(|c| &c.replaces);
        self.check_writable("replace")?;
        let mut data = self.data.write().await;

        if let Some(pos) = position(&data, filter) {
            let previous = self.replace_at(&mut data, pos, doc)?;

            return Ok(Some(match options.return_document {
                ReturnDocument::Before => previous,
                ReturnDocument::After => data.docs[pos].clone(),
            }));
        }

        if !options.upsert {
            return Ok(None);
        }

        let mut doc = seed_replacement(filter, doc);
        ensure_id(&mut doc);
        self.insert_locked(&mut data, doc.clone())?;

        Ok(match options.return_document {
            ReturnDocument::Before => None,
            ReturnDocument::After => Some(doc),
        })
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &UpdateDocument,
        options: FindAndModifyOptions,
    ) -> Result<Option<Document>, StoreError> {
        self.record(|c| &c.updates);
        self.check_writable("update")?;
        let mut data = self.data.write().await;

        if let Some(pos) = position(&data, filter) {
            let mut next = data.docs[pos].clone();
            update.apply(&mut next, false);
            let previous = self.replace_at(&mut data, pos, next)?;

            return Ok(Some(match options.return_document {
                ReturnDocument::Before => previous,
                ReturnDocument::After => data.docs[pos].clone(),
            }));
        }

        if !options.upsert {
            return Ok(None);
        }

        let mut doc = Document::new();
        for (path, value) in filter.equality_fields() {
            set_path(&mut doc, path, value.clone());
        }
        update.apply(&mut doc, true);
        ensure_id(&mut doc);
        self.insert_locked(&mut data, doc.clone())?;

        Ok(match options.return_document {
            ReturnDocument::Before => None,
            ReturnDocument::After => Some(doc),
        })
    }

    async fn list_index_names(&self) -> Result<Vec<String>, StoreError> {
        self.record(|c| &c.list_indexes);
        let data = self.data.read().await;

        let mut names = vec![ID_INDEX.to_string()];
        names.extend(data.indexes.iter().map(|index| index.name.clone()));

        Ok(names)
    }

    async fn create_index(&self, request: &IndexRequest) -> Result<(), StoreError> {
        self.record(|c| &c.create_indexes);
        let mut data = self.data.write().await;

        if let Some(existing) = data.indexes.iter().find(|i| i.name == request.name) {
            if existing.same_definition(request) {
                return Ok(());
            }
            return Err(StoreError::IndexConflict {
                namespace: self.namespace.full_name(),
                index: request.name.clone(),
            });
        }

        if request.unique {
            let mut seen: Vec<Value> = Vec::new();
            for doc in data.docs.iter().filter(|doc| in_partial(request, doc)) {
                let key = unique_key(request, doc);
                if seen.contains(&key) {
                    return Err(self.duplicate(&request.name, &key));
                }
                seen.push(key);
            }
        }

        data.indexes.push(request.clone());

        Ok(())
    }
}

fn position(data: &CollectionData, filter: &Filter) -> Option<usize> {
    data.docs.iter().position(|doc| filter.matches(doc))
}

fn ensure_id(doc: &mut Document) {
    if !doc.contains_key(DOCUMENT_ID) {
        doc.insert(
            DOCUMENT_ID.to_string(),
            Value::String(ulid::Ulid::new().to_string()),
        );
    }
}

// A replacement upsert only inherits the engine id from the filter.
fn seed_replacement(filter: &Filter, mut doc: Document) -> Document {
    if !doc.contains_key(DOCUMENT_ID)
        && let Some((_, id)) = filter
            .equality_fields()
            .into_iter()
            .find(|(path, _)| *path == DOCUMENT_ID)
    {
        doc.insert(DOCUMENT_ID.to_string(), id.clone());
    }

    doc
}

fn in_partial(index: &IndexRequest, doc: &Document) -> bool {
    index
        .partial_filter
        .as_ref()
        .and_then(|partial| Filter::from_document(partial).ok())
        .is_none_or(|filter| filter.matches(doc))
}

fn unique_key(index: &IndexRequest, doc: &Document) -> Value {
    let fold = index
        .collation
        .as_ref()
        .is_some_and(Collation::is_case_insensitive);

    Value::Array(
        index
            .keys
            .iter()
            .map(|key| {
                let value = values_at(doc, &key.field)
                    .into_iter()
                    .next()
                    .cloned()
                    .unwrap_or(Value::Null);
                match value {
                    Value::String(s) if fold => Value::String(s.to_lowercase()),
                    other => other,
                }
            })
            .collect(),
    )
}
