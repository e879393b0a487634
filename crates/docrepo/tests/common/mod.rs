#![allow(dead_code)]

use docrepo::{
    config::StoreOptions,
    db::{BuildCoordinator, FixedTenant, StorageAccessor},
    prelude::*,
    store::{Namespace, memory::MemoryEngine},
};
use std::sync::Arc;

///
/// Order
///

#[derive(Clone, Debug, Default, Deserialize, Entity, PartialEq, Serialize)]
#[entity(
    database = "Shop",
    collection = "Orders",
    audit = "OrderAudit",
    index(name = "ByRegion", field = "shipping.region")
)]
#[serde(default, rename_all = "camelCase")]
pub struct Order {
    #[entity(key)]
    pub order_no: String,

    #[entity(index(name = "CustomerDay", unique, case_insensitive))]
    pub customer_name: String,

    #[entity(index(name = "CustomerDay", unique))]
    pub placed_on: String,

    #[entity(index(name = "Status", partial_filter = r#"{"status": {"$ne": "void"}}"#))]
    pub status: String,

    pub total: i64,
    pub version: i64,

    #[entity(expire)]
    pub expires_at: Option<String>,

    #[entity(geo)]
    pub location: Option<Vec<f64>>,

    #[entity(nested)]
    pub shipping: Option<Shipping>,

    #[entity(nested)]
    pub lines: Vec<Line>,

    #[serde(skip)]
    pub scratch: String,
}

#[derive(Clone, Debug, Default, Deserialize, Nested, PartialEq, Serialize)]
#[serde(default)]
pub struct Shipping {
    pub region: String,
    pub street: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Nested, PartialEq, Serialize)]
#[serde(default)]
pub struct Line {
    #[entity(index(name = "Sku"))]
    pub sku: String,
    pub qty: i64,
}

///
/// Note
/// Keyed by convention on `id`, stored under the engine id.
///

#[derive(Clone, Debug, Default, Deserialize, Entity, PartialEq, Serialize)]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: String,
    #[entity(index)]
    pub title: String,
}

///
/// HELPERS
///

pub fn order(order_no: &str, customer: &str, placed_on: &str) -> Order {
    Order {
        order_no: order_no.to_string(),
        customer_name: customer.to_string(),
        placed_on: placed_on.to_string(),
        status: "open".to_string(),
        ..Order::default()
    }
}

pub fn orders_ns() -> Namespace {
    Namespace::new("Shop", "Orders")
}

pub fn order_audit_ns() -> Namespace {
    Namespace::new("Shop", "OrderAudit")
}

///
/// Harness
///

pub struct Harness {
    pub engine: MemoryEngine,
    pub coordinator: Arc<BuildCoordinator>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            engine: MemoryEngine::new(),
            coordinator: BuildCoordinator::shared(),
        }
    }

    pub fn accessor<E: docrepo::traits::Entity>(&self, options: StoreOptions) -> StorageAccessor<E> {
        StorageAccessor::builder(options, Arc::new(self.engine.clone()), Arc::clone(&self.coordinator))
            .build()
            .unwrap()
    }

    pub fn tenant_accessor<E: docrepo::traits::Entity>(&self, prefix: &str) -> StorageAccessor<E> {
        StorageAccessor::builder(
            StoreOptions::new("rw"),
            Arc::new(self.engine.clone()),
            Arc::clone(&self.coordinator),
        )
        .tenant(Arc::new(FixedTenant::new(prefix, "")))
        .build()
        .unwrap()
    }

    pub fn orders(&self) -> ReadWriteRepository<Order> {
        ReadWriteRepository::new(self.accessor(StoreOptions::new("rw")))
    }
}
