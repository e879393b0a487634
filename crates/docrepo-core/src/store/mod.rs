//! Module: store
//! Responsibility: the storage port consumed by repositories, plus the
//! in-memory engine that implements it.
//! Does not own: index derivation or provisioning policy.
//! Boundary: everything below a collection handle is a black box.

mod index;
pub mod memory;
mod namespace;

pub use index::{Collation, IndexKey, IndexKind, IndexRequest};
pub use namespace::{Namespace, NamespaceKey};

use crate::{
    error::ErrorClass,
    query::{Document, Filter, Sort, UpdateDocument},
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error as ThisError;

/// Name of the engine-level identifier every stored document carries.
pub const DOCUMENT_ID: &str = "_id";

///
/// StoreError
///
/// Errors raised by a storage engine. Carried to callers unchanged.
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("duplicate key on index '{index}' in {namespace}: {key}")]
    DuplicateKey {
        namespace: String,
        index: String,
        key: String,
    },

    #[error("index '{index}' already exists in {namespace} with different options")]
    IndexConflict { namespace: String, index: String },

    #[error("endpoint '{endpoint}' unavailable: {reason}")]
    Unavailable { endpoint: String, reason: String },

    #[error("{operation} rejected by {namespace}: {reason}")]
    Rejected {
        namespace: String,
        operation: &'static str,
        reason: String,
    },
}

impl StoreError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateKey { .. } => ErrorClass::Conflict,
            Self::IndexConflict { .. } => ErrorClass::Configuration,
            Self::Unavailable { .. } => ErrorClass::Unavailable,
            Self::Rejected { .. } => ErrorClass::Internal,
        }
    }
}

///
/// FindQuery
///

#[derive(Clone, Debug, Default)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Sort,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindQuery {
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub const fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

///
/// ReturnDocument
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReturnDocument {
    #[default]
    After,
    Before,
}

///
/// FindAndModifyOptions
///
/// Options for the atomic find-and-replace / find-and-update primitives.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FindAndModifyOptions {
    pub upsert: bool,
    pub return_document: ReturnDocument,
}

impl Default for FindAndModifyOptions {
    fn default() -> Self {
        Self {
            upsert: true,
            return_document: ReturnDocument::After,
        }
    }
}

///
/// ReplaceOutcome
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplaceOutcome {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<serde_json::Value>,
}

///
/// DocumentCollection
///
/// Handle to one collection on one endpoint.
///

#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn namespace(&self) -> &Namespace;

    async fn find(&self, query: FindQuery) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let mut found = self.find(FindQuery::new(filter.clone()).limit(1)).await?;

        Ok(found.pop())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn insert_one(&self, doc: Document) -> Result<(), StoreError>;

    /// Ordered insert; stops at the first failure.
    async fn insert_many(&self, docs: Vec<Document>) -> Result<(), StoreError>;

    async fn replace_one(
        &self,
        filter: &Filter,
        doc: Document,
        upsert: bool,
    ) -> Result<ReplaceOutcome, StoreError>;

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn find_one_and_delete(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;

    async fn find_one_and_replace(
        &self,
        filter: &Filter,
        doc: Document,
        options: FindAndModifyOptions,
    ) -> Result<Option<Document>, StoreError>;

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &UpdateDocument,
        options: FindAndModifyOptions,
    ) -> Result<Option<Document>, StoreError>;

    async fn list_index_names(&self) -> Result<Vec<String>, StoreError>;

    async fn create_index(&self, request: &IndexRequest) -> Result<(), StoreError>;
}

///
/// StorageClient
///

pub trait StorageClient: Send + Sync {
    fn collection(&self, namespace: &Namespace) -> Arc<dyn DocumentCollection>;
}

///
/// ClientFactory
///
/// Produces clients per connection endpoint. Pool construction lives
/// behind this seam.
///

pub trait ClientFactory: Send + Sync {
    fn client(&self, endpoint: &str) -> Result<Arc<dyn StorageClient>, StoreError>;
}
