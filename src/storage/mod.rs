pub mod gist;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Aggregate;

pub use gist::GistStore;
pub use memory::MemoryStore;

/// The result of [`AggregateStore::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAggregate {
    /// Identifier of the storage location the aggregate lives in.
    pub location: String,
    /// True when the location did not exist and was created by this load.
    /// The operator must persist `location` for later runs.
    pub created: bool,
    pub aggregate: Aggregate,
}

/// Whole-document persistence for the [`Aggregate`].
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Fetch the persisted aggregate, creating an empty storage location
    /// first if none is configured.
    async fn load(&mut self) -> Result<LoadedAggregate>;

    /// Replace the persisted aggregate wholesale.
    async fn save(&self, aggregate: &Aggregate) -> Result<()>;
}
