//! Repository layers: a read contract, a write contract built on it, and
//! the plain structs implementing them over a `StorageAccessor`.

mod page;
mod read;
mod write;

#[cfg(test)]
mod tests;

pub use page::{PageInfo, PaginatedResult};
pub use read::ReadRepository;
pub use write::{ReplaceOptions, WriteRepository};

use crate::{
    db::StorageAccessor,
    error::Error,
    query::{Document, Filter},
    schema::EntityDescriptor,
    traits::Entity,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

///
/// ReadOnlyRepository
///

pub struct ReadOnlyRepository<E: Entity> {
    accessor: StorageAccessor<E>,
}

impl<E: Entity> ReadOnlyRepository<E> {
    #[must_use]
    pub const fn new(accessor: StorageAccessor<E>) -> Self {
        Self { accessor }
    }
}

impl<E: Entity> ReadRepository for ReadOnlyRepository<E> {
    type Entity = E;

    fn accessor(&self) -> &StorageAccessor<E> {
        &self.accessor
    }
}

///
/// ReadWriteRepository
///

pub struct ReadWriteRepository<E: Entity> {
    accessor: StorageAccessor<E>,
}

impl<E: Entity> ReadWriteRepository<E> {
    #[must_use]
    pub const fn new(accessor: StorageAccessor<E>) -> Self {
        Self { accessor }
    }
}

impl<E: Entity> ReadRepository for ReadWriteRepository<E> {
    type Entity = E;

    fn accessor(&self) -> &StorageAccessor<E> {
        &self.accessor
    }
}

impl<E: Entity> WriteRepository for ReadWriteRepository<E> {}

///
/// DOCUMENT CONVERSION
///

pub(crate) fn to_document<T: Serialize + ?Sized>(value: &T) -> Result<Document, Error> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(Error::Serialize(<serde_json::Error as serde::ser::Error>::custom(
            "entity must serialize to a JSON object",
        ))),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, Error> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

pub(crate) fn key_value<K: Serialize + ?Sized>(key: &K) -> Result<Value, Error> {
    Ok(serde_json::to_value(key)?)
}

pub(crate) fn key_filter<K: Serialize + ?Sized>(
    descriptor: &EntityDescriptor,
    key: &K,
) -> Result<Filter, Error> {
    Ok(Filter::eq(descriptor.key_field, key_value(key)?))
}
