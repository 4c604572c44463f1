use crate::{error::InternalError, model::entity::EntityModel};
use std::{collections::BTreeMap, sync::Arc};

///
/// IndexRegistry
///
/// Collection name -> entity model. Populated at setup, read per request.
///

#[derive(Clone, Debug, Default)]
pub struct IndexRegistry(BTreeMap<String, Arc<EntityModel>>);

impl IndexRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Register a model under its collection name.
    pub fn register(&mut self, model: EntityModel) -> Result<Arc<EntityModel>, InternalError> {
        let collection = model.collection().to_string();
        if self.0.contains_key(&collection) {
            return Err(InternalError::schema_conflict(format!(
                "collection '{collection}' already registered"
            )));
        }

        let model = Arc::new(model);
        self.0.insert(collection, Arc::clone(&model));

        Ok(model)
    }

    #[must_use]
    pub fn get(&self, collection: &str) -> Option<Arc<EntityModel>> {
        self.0.get(collection).cloned()
    }

    pub fn try_get(&self, collection: &str) -> Result<Arc<EntityModel>, InternalError> {
        self.get(collection)
            .ok_or_else(|| InternalError::unknown_collection(collection))
    }
}
