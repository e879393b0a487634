use crate::error::Error;
use async_trait::async_trait;

///
/// CustomIndexResult
/// A namespace the custom builder reports having indexed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CustomIndexResult {
    pub database: String,
    pub collection: String,
}

///
/// CustomIndexBuilder
///
/// Caller-supplied index provisioning, run alongside the declared plan
/// the first time a namespace's write handle is requested.
///

#[async_trait]
pub trait CustomIndexBuilder: Send + Sync {
    async fn build_customized_index(&self) -> Result<Vec<CustomIndexResult>, Error>;
}
