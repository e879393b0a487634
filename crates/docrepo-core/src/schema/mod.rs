//! Module: schema
//! Responsibility: resolve static entity models into descriptors and turn
//! descriptors into index-creation requests.
//! Does not own: deciding when provisioning runs (see `db::coordinator`).
//! Boundary: pure functions over `model` tables, plus one submit step
//! against a collection handle.

mod descriptor;
mod plan;
mod resolve;


pub use descriptor::{EntityDescriptor, IndexGroup};
pub use plan::{plan_indexes, submit_indexes};
pub use resolve::{DEFAULT_AUDIT_COLLECTION, ResolveContext, resolve};
