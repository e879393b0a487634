//! Core runtime for docrepo: entity metadata, the query vocabulary, the
//! storage port, schema resolution, and the repository layers exported
//! via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod query;
pub mod sanitize;
pub mod schema;
pub mod store;
pub mod traits;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::Error;

///
/// Prelude
///
/// Domain vocabulary and the repository contracts. Engines, caches and
/// configuration are imported from their modules.
///

pub mod prelude {
    pub use crate::{
        db::{ReadRepository, WriteRepository},
        query::{Document, Filter, Sort, SortDirection},
        sanitize::Sanitize,
        traits::{Entity, Shape},
    };
}
