//! Module: db::list
//! Responsibility: page through a sorted-set index and resolve the members
//! to stored entities.

use crate::{
    config::ListConfig,
    db::DbError,
    entity::Entity,
    obs::sink::{self, MetricsEvent},
    store::{Direction, KvStore},
};
use serde::{Deserialize, Serialize};

///
/// ListOptions
///
/// `index` is the full key of the sorted set to read; the collection's
/// `created` order is used when unset. Pages are 1-based; `0` reads as the
/// first page and a `0` size as the configured default.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ListOptions {
    pub index: Option<String>,
    pub page: u32,
    pub size: u32,
    pub order: Direction,
}

impl ListOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn index(mut self, key: impl Into<String>) -> Self {
        self.index = Some(key.into());
        self
    }

    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub const fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub const fn order(mut self, order: Direction) -> Self {
        self.order = order;
        self
    }

    /// Inclusive `(start, stop)` rank range for these options.
    #[must_use]
    pub fn range(&self, config: &ListConfig) -> (i64, i64) {
        let size = match self.size {
            0 => config.default_page_size,
            size => size.min(config.max_page_size),
        };

        page_range(self.page.max(1), size)
    }
}

/// `start = size * (page - 1)`, `stop = start + size - 1`.
#[must_use]
pub fn page_range(page: u32, size: u32) -> (i64, i64) {
    let size = i64::from(size);
    let start = size * (i64::from(page) - 1);

    (start, start + size - 1)
}

/// Read one page of `key` and resolve its members through `collection`.
pub(crate) async fn list_key<S: KvStore + ?Sized>(
    store: &S,
    collection: &str,
    config: &ListConfig,
    key: &str,
    opts: &ListOptions,
) -> Result<Vec<Entity>, DbError> {
    let ids = list_ids(store, config, key, opts).await?;
    let records = get_many(store, collection, &ids).await?;

    let mut entities = Vec::with_capacity(records.len());
    for (id, record) in ids.iter().zip(records) {
        if let Some(entity) = record {
            entities.push(entity);
        } else {
            sink::record(MetricsEvent::DanglingMember { collection });
            tracing::warn!(collection, index = key, id = %id, "index member has no record");
        }
    }

    sink::record(MetricsEvent::ListPage {
        collection,
        rows: entities.len() as u64,
    });

    Ok(entities)
}

/// Read one page of member identifiers from `key`.
pub(crate) async fn list_ids<S: KvStore + ?Sized>(
    store: &S,
    config: &ListConfig,
    key: &str,
    opts: &ListOptions,
) -> Result<Vec<String>, DbError> {
    let (start, stop) = opts.range(config);

    Ok(store.zrange(key, start, stop, opts.order).await?)
}

/// Fetch and decode records by identifier, in order. Makes no store call
/// when `ids` is empty.
pub(crate) async fn get_many<S: KvStore + ?Sized>(
    store: &S,
    collection: &str,
    ids: &[String],
) -> Result<Vec<Option<Entity>>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    store
        .hmget(collection, ids)
        .await?
        .into_iter()
        .map(|record| {
            record
                .map(|record| Entity::from_record(&record))
                .transpose()
                .map_err(DbError::from)
        })
        .collect()
}

///
/// TESTS
///
