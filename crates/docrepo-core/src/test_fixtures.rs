use crate::{
    config::StoreOptions,
    db::{BuildCoordinator, StorageAccessor},
    model::{
        entity::EntityModel,
        field::{FieldKind, FieldModel, ShapeModel},
        index::IndexMarker,
    },
    sanitize::Sanitize,
    store::{Namespace, memory::MemoryEngine},
    traits::{Entity, Shape},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

///
/// Address
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct Address {
    pub(crate) city: String,
}

static ADDRESS_SHAPE: ShapeModel = ShapeModel {
    name: "Address",
    fields: &[FieldModel {
        indexes: &[IndexMarker::named("City")],
        ..FieldModel::plain("city", FieldKind::Text)
    }],
};

impl Shape for Address {
    const SHAPE: &'static ShapeModel = &ADDRESS_SHAPE;
}

impl Sanitize for Address {
    fn sanitize(&mut self) {
        self.city.sanitize();
    }
}

///
/// Customer
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct Customer {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: Option<String>,
    pub(crate) age: i64,
    pub(crate) version: i64,
    pub(crate) address: Option<Address>,
}

static CUSTOMER_SHAPE: ShapeModel = ShapeModel {
    name: "Customer",
    fields: &[
        FieldModel::plain("id", FieldKind::Text),
        FieldModel {
            indexes: &[IndexMarker::named("Name").unique().case_insensitive()],
            ..FieldModel::plain("name", FieldKind::Text)
        },
        FieldModel::plain("email", FieldKind::Text),
        FieldModel::plain("age", FieldKind::Value),
        FieldModel::plain("version", FieldKind::Value),
        FieldModel::plain("address", FieldKind::Nested(&ADDRESS_SHAPE)),
    ],
};

static CUSTOMER_MODEL: EntityModel = EntityModel {
    type_name: "Customer",
    database: Some("Crm"),
    collection: Some("Customers"),
    audit_collection: None,
    key_field: Some("id"),
    shape: &CUSTOMER_SHAPE,
    indexes: &[],
};

impl Shape for Customer {
    const SHAPE: &'static ShapeModel = &CUSTOMER_SHAPE;
}

impl Sanitize for Customer {
    fn sanitize(&mut self) {
        self.id.sanitize();
        self.name.sanitize();
        self.email.sanitize();
        self.address.sanitize();
    }
}

impl Entity for Customer {
    type Key = String;

    const MODEL: &'static EntityModel = &CUSTOMER_MODEL;

    fn key(&self) -> String {
        self.id.clone()
    }
}

///
/// HELPERS
///

pub(crate) fn customer(id: &str, name: &str, age: i64) -> Customer {
    Customer {
        id: id.to_string(),
        name: name.to_string(),
        age,
        ..Customer::default()
    }
}

pub(crate) fn customers_ns() -> Namespace {
    Namespace::new("Crm", "Customers")
}

pub(crate) fn audit_ns() -> Namespace {
    Namespace::new("Crm", "Audit")
}

pub(crate) fn accessor(
    engine: &MemoryEngine,
    coordinator: &Arc<BuildCoordinator>,
    options: StoreOptions,
) -> StorageAccessor<Customer> {
    StorageAccessor::builder(options, Arc::new(engine.clone()), Arc::clone(coordinator))
        .build()
        .unwrap()
}
