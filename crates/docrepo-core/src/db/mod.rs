//! Module: db
//! Responsibility: storage accessors, build-once provisioning, and the
//! repository layers callers use (read-only, read-write, cached, audited).
//! Does not own: index derivation (`schema`) or engine behaviour (`store`).
//! Boundary: everything here talks to storage through `DocumentCollection`.

mod accessor;
mod audit;
mod cache;
mod cached;
mod coordinator;
mod custom_index;
pub mod repository;
mod tenant;

pub use accessor::{StorageAccessor, StorageAccessorBuilder};
pub use audit::{AuditInfoProvider, AuditOperation, AuditRecord, AuditedRepository};
pub use cache::{Cache, MemoryCache};
pub use cached::{CachedEntity, CachedRepository};
pub use coordinator::BuildCoordinator;
pub use custom_index::{CustomIndexBuilder, CustomIndexResult};
pub use repository::{
    PageInfo, PaginatedResult, ReadOnlyRepository, ReadRepository, ReadWriteRepository,
    ReplaceOptions, WriteRepository,
};
pub use tenant::{FixedTenant, TenantResolver};
