use crate::{
    config::DocdexConfig,
    db::{
        DbError,
        list::{self, ListOptions},
    },
    defaults::FieldDefaults,
    entity::Entity,
    error::InternalError,
    model::{RelationModel, RelationSide},
    obs::sink::{self, MetricsEvent},
    store::{Batch, KvStore},
};
use std::sync::Arc;

///
/// Relation
///
/// Handle over one many-to-many relation. Every link and unlink writes both
/// directions in a single batch, so the two sets always mirror each other.
///

pub struct Relation<S: KvStore> {
    store: Arc<S>,
    model: RelationModel,
    config: Arc<DocdexConfig>,
    defaults: Arc<dyn FieldDefaults>,
}

impl<S: KvStore> Relation<S> {
    pub(crate) const fn new(
        store: Arc<S>,
        model: RelationModel,
        config: Arc<DocdexConfig>,
        defaults: Arc<dyn FieldDefaults>,
    ) -> Self {
        Self {
            store,
            model,
            config,
            defaults,
        }
    }

    #[must_use]
    pub const fn model(&self) -> &RelationModel {
        &self.model
    }

    /// Link `left_id` and `right_id`, scored by the link time. Linking an
    /// existing pair only refreshes its score.
    pub async fn link(&self, left_id: &str, right_id: &str) -> Result<(), DbError> {
        let (rights, lefts) = self.keys(left_id, right_id)?;
        let score = self.link_score();

        let mut batch = Batch::new();
        batch.zadd(rights, score, right_id);
        batch.zadd(lefts, score, left_id);
        self.submit(batch, 1, 0).await
    }

    pub async fn link_entities(&self, left: &Entity, right: &Entity) -> Result<(), DbError> {
        let (left_id, right_id) = self.entity_ids(left, right)?;

        self.link(&left_id, &right_id).await
    }

    pub async fn unlink(&self, left_id: &str, right_id: &str) -> Result<(), DbError> {
        let (rights, lefts) = self.keys(left_id, right_id)?;

        let mut batch = Batch::new();
        batch.zrem(rights, right_id);
        batch.zrem(lefts, left_id);
        self.submit(batch, 0, 1).await
    }

    pub async fn unlink_entities(&self, left: &Entity, right: &Entity) -> Result<(), DbError> {
        let (left_id, right_id) = self.entity_ids(left, right)?;

        self.unlink(&left_id, &right_id).await
    }

    /// Right-side entities linked to `left_id`.
    pub async fn list_right(
        &self,
        left_id: &str,
        opts: &ListOptions,
    ) -> Result<Vec<Entity>, DbError> {
        let key = self.model.rights_key(left_id)?;

        self.list_side(self.model.right(), &key, opts).await
    }

    /// Left-side entities linked to `right_id`.
    pub async fn list_left(
        &self,
        right_id: &str,
        opts: &ListOptions,
    ) -> Result<Vec<Entity>, DbError> {
        let key = self.model.lefts_key(right_id)?;

        self.list_side(self.model.left(), &key, opts).await
    }

    pub async fn right_ids(
        &self,
        left_id: &str,
        opts: &ListOptions,
    ) -> Result<Vec<String>, DbError> {
        let key = self.model.rights_key(left_id)?;

        list::list_ids(self.store.as_ref(), &self.config.list, &key, opts).await
    }

    pub async fn left_ids(
        &self,
        right_id: &str,
        opts: &ListOptions,
    ) -> Result<Vec<String>, DbError> {
        let key = self.model.lefts_key(right_id)?;

        list::list_ids(self.store.as_ref(), &self.config.list, &key, opts).await
    }

    async fn list_side(
        &self,
        side: &RelationSide,
        key: &str,
        opts: &ListOptions,
    ) -> Result<Vec<Entity>, DbError> {
        list::list_key(
            self.store.as_ref(),
            &side.collection,
            &self.config.list,
            key,
            opts,
        )
        .await
    }

    async fn submit(&self, batch: Batch, links: u64, unlinks: u64) -> Result<(), DbError> {
        let (left, right) = (
            self.model.left().collection.as_str(),
            self.model.right().collection.as_str(),
        );
        tracing::debug!(left, right, mutations = batch.len(), "submitting relation batch");

        self.store.exec(batch).await?;
        sink::record(MetricsEvent::RelationDelta {
            left,
            right,
            links,
            unlinks,
        });

        Ok(())
    }

    fn keys(&self, left_id: &str, right_id: &str) -> Result<(String, String), InternalError> {
        if left_id.is_empty() || right_id.is_empty() {
            return Err(InternalError::relation_invariant(format!(
                "relation {} <-> {} needs both identifiers",
                self.model.left().collection,
                self.model.right().collection
            )));
        }

        Ok((
            self.model.rights_key(left_id)?,
            self.model.lefts_key(right_id)?,
        ))
    }

    fn entity_ids(
        &self,
        left: &Entity,
        right: &Entity,
    ) -> Result<(String, String), InternalError> {
        let id = |side: &RelationSide, entity: &Entity| {
            entity.scalar(&side.id_field).ok_or_else(|| {
                InternalError::relation_invariant(format!(
                    "'{}' entity has no usable '{}'",
                    side.collection, side.id_field
                ))
            })
        };

        Ok((id(self.model.left(), left)?, id(self.model.right(), right)?))
    }

    #[allow(clippy::cast_precision_loss)]
    fn link_score(&self) -> f64 {
        self.defaults.timestamp() as f64
    }
}
