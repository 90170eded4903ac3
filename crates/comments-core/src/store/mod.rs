//! Store boundary
//!
//! The engine never owns persistence. It talks to a generic record store
//! addressed by collection name and criteria, and to a configuration store
//! holding the remote configuration document.

#[cfg(test)]
pub mod memory;

use crate::error::Result;
use crate::query::Criteria;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Collection holding comment records
pub const COMMENTS_COLLECTION: &str = "plugin::comments.comment";

/// Trait for record store implementations
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First record matching the criteria
    async fn find_one(&self, collection: &str, criteria: &Criteria) -> Result<Option<Value>>;

    /// All records matching the criteria
    async fn find_many(&self, collection: &str, criteria: &Criteria) -> Result<Vec<Value>>;

    /// Matching page of records plus the total count ignoring offset/limit
    async fn find_with_count(&self, collection: &str, criteria: &Criteria)
        -> Result<(Vec<Value>, u64)>;

    /// Number of records matching the criteria, ignoring offset/limit
    async fn count(&self, collection: &str, criteria: &Criteria) -> Result<u64>;

    /// Apply `patch` to every matching record, returning the updated records
    async fn update_many(
        &self,
        collection: &str,
        criteria: &Criteria,
        patch: &Map<String, Value>,
    ) -> Result<Vec<Value>>;
}

/// Trait for configuration store implementations
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Document stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>>;
}
