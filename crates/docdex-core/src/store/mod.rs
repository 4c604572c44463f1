//! Module: store
//! Responsibility: the key-value store port the indexing layer drives, plus an
//! in-process implementation.
//! Does not own: connection lifecycle, retries or timeouts (backend concerns).
//!
//! The port exposes only hash-map and sorted-set commands and atomic batch
//! execution. Every lifecycle write reaches the store as exactly one `exec`.

mod batch;
mod error;
mod memory;

pub use batch::{Batch, Mutation};
pub use error::StoreError;
pub use memory::{MemoryStore, MemoryValue};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

///
/// Direction
/// Range order of a sorted-set read. Descending is `ZREVRANGE`.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

///
/// KvStore
///
/// Hash and sorted-set store with atomic batches. Indices given to `zrange`
/// follow Redis: inclusive, negative values count from the end.
///

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Returns whether the field existed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// One value per requested field, in request order.
    async fn hmget(&self, key: &str, fields: &[String])
    -> Result<Vec<Option<String>>, StoreError>;

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError>;

    /// Returns whether the member existed.
    async fn zrem(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        direction: Direction,
    ) -> Result<Vec<String>, StoreError>;

    /// Apply every mutation of `batch` or none of them.
    async fn exec(&self, batch: Batch) -> Result<(), StoreError>;
}
