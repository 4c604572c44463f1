//! Module: db
//! Responsibility: the runtime handle tying a store, the index registry,
//! configuration and field defaults together, and the operations built on
//! them (index maintenance, uniqueness, relations, listing, lifecycle).

pub mod collection;
pub mod index;
pub mod list;
pub mod relation;
pub mod unique;

#[cfg(test)]
mod tests;

pub use collection::Collection;
pub use index::IndexDelta;
pub use list::ListOptions;
pub use relation::Relation;

use crate::{
    config::{ConfigError, DocdexConfig},
    defaults::{FieldDefaults, SystemDefaults},
    error::{ConflictError, InternalError},
    model::{EntityModel, IndexRegistry, Schema},
    store::{KvStore, StoreError},
};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// DbError
///

#[derive(Debug, ThisError)]
pub enum DbError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

///
/// Db
///
/// Handle to one store and the collections registered against it.
///
/// Registration happens once at setup through `&mut self`; afterwards the
/// handle is shared read-only and hands out `Collection` and `Relation`
/// contexts that own clones of the shared parts.
///

pub struct Db<S: KvStore> {
    store: Arc<S>,
    registry: IndexRegistry,
    config: Arc<DocdexConfig>,
    defaults: Arc<dyn FieldDefaults>,
}

impl<S: KvStore> Db<S> {
    /// Validate `config` and wrap `store`.
    pub fn new(store: S, config: DocdexConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            store: Arc::new(store),
            registry: IndexRegistry::new(),
            config: Arc::new(config),
            defaults: Arc::new(SystemDefaults),
        })
    }

    /// Replace the identifier and timestamp source.
    #[must_use]
    pub fn with_defaults(mut self, defaults: impl FieldDefaults + 'static) -> Self {
        self.defaults = Arc::new(defaults);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &DocdexConfig {
        &self.config
    }

    /// Derive and register the model declared by `schema`.
    pub fn register(
        &mut self,
        collection: impl Into<String>,
        schema: &Schema,
    ) -> Result<Collection<S>, InternalError> {
        let model = EntityModel::from_schema(collection, schema, &self.config)?;

        self.register_model(model)
    }

    pub fn register_model(&mut self, model: EntityModel) -> Result<Collection<S>, InternalError> {
        let model = self.registry.register(model)?;
        tracing::debug!(
            collection = model.collection(),
            indexes = model.indexes().len(),
            "collection registered"
        );

        Ok(self.context(model))
    }

    /// Lifecycle context for a registered collection.
    pub fn collection(&self, name: &str) -> Result<Collection<S>, InternalError> {
        self.registry.try_get(name).map(|model| self.context(model))
    }

    /// Many-to-many relation between two registered collections.
    pub fn intersects(&self, left: &str, right: &str) -> Result<Relation<S>, InternalError> {
        let left = self.collection(left)?;
        let right = self.collection(right)?;

        left.intersects(&right)
    }

    fn context(&self, model: Arc<EntityModel>) -> Collection<S> {
        Collection::new(
            Arc::clone(&self.store),
            model,
            Arc::clone(&self.config),
            Arc::clone(&self.defaults),
        )
    }
}
