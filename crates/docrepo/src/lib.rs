//! ## Crate layout
//! - `config`: connection, timeout and cache options.
//! - `db`: storage accessors, build-once provisioning, and the repository
//!   layers (read-only, read-write, cached, audited).
//! - `model` / `schema`: static entity metadata and its resolution into
//!   namespaces and index plans.
//! - `query`: filters, sorts and update documents.
//! - `store`: the storage port and the in-memory engine.
//!
//! `#[derive(Entity)]` and `#[derive(Nested)]` generate the metadata tables;
//! the `prelude` brings the repository traits and the derives into scope.

pub use docrepo_core::{Error, config, db, error, model, query, sanitize, schema, store, traits};
pub use docrepo_derive::{Entity, Nested};

// generated code names `::docrepo`
extern crate self as docrepo;

/// re-exports
///
/// dependencies generated code and downstream implementors commonly need,
/// so they need not be listed in every Cargo.toml
pub mod __reexports {
    pub use async_trait;
    pub use serde;
    pub use serde_json;
}

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        db::{
            AuditedRepository, CachedRepository, ReadOnlyRepository, ReadRepository as _,
            ReadWriteRepository, StorageAccessor, WriteRepository as _,
        },
        query::{Document, Filter, Sort, SortDirection},
        traits::{Entity as _, Shape as _},
    };
    pub use docrepo_derive::{Entity, Nested};
    pub use serde::{Deserialize, Serialize};
}
