use crate::{
    config::DocdexConfig,
    db::{
        DbError,
        index::{self, IndexDelta},
        list::{self, ListOptions},
        relation::Relation,
        unique::enforce_unique,
    },
    defaults::FieldDefaults,
    entity::Entity,
    error::{ConflictError, InternalError},
    model::{EntityModel, RelationModel},
    obs::sink::{self, ExecKind, MetricsEvent},
    path::FieldPath,
    store::{Batch, KvStore},
};
use serde_json::{Map, Value};
use std::sync::Arc;

///
/// Collection
///
/// Lifecycle context for one registered collection. Every write is checked
/// for uniqueness, then submitted as one batch holding the primary record
/// and its index mutations.
///

pub struct Collection<S: KvStore> {
    store: Arc<S>,
    model: Arc<EntityModel>,
    config: Arc<DocdexConfig>,
    defaults: Arc<dyn FieldDefaults>,
}

impl<S: KvStore> Clone for Collection<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            model: Arc::clone(&self.model),
            config: Arc::clone(&self.config),
            defaults: Arc::clone(&self.defaults),
        }
    }
}

impl<S: KvStore> Collection<S> {
    pub(crate) const fn new(
        store: Arc<S>,
        model: Arc<EntityModel>,
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
    pub fn name(&self) -> &str {
        self.model.collection()
    }

    #[must_use]
    pub fn model(&self) -> &EntityModel {
        &self.model
    }

    //
    // Reads
    //

    pub async fn get(&self, id: &str) -> Result<Option<Entity>, DbError> {
        let record = self.store.hget(self.name(), id).await?;

        Ok(record.map(|r| Entity::from_record(&r)).transpose()?)
    }

    /// One slot per requested id, `None` where no record exists.
    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<Option<Entity>>, DbError> {
        list::get_many(self.store.as_ref(), self.name(), ids).await
    }

    /// Look an entity up through the unique index declared on `field`.
    pub async fn get_by(&self, field: &str, value: &str) -> Result<Option<Entity>, DbError> {
        let index = self.model.unique_index(field).ok_or_else(|| {
            InternalError::query_unsupported(format!(
                "'{}' has no unique index on '{field}'",
                self.name()
            ))
        })?;
        let key = index.key.fill(&[])?;

        match self.store.hget(&key, value).await? {
            Some(id) => self.get(&id).await,
            None => Ok(None),
        }
    }

    /// List entities through the secondary index declared on `field`.
    pub async fn list_by(
        &self,
        field: &str,
        value: &str,
        opts: &ListOptions,
    ) -> Result<Vec<Entity>, DbError> {
        let index = self.model.secondary_index(field).ok_or_else(|| {
            InternalError::query_unsupported(format!(
                "'{}' has no secondary index on '{field}'",
                self.name()
            ))
        })?;
        let key = index.key.fill(&[value])?;

        self.list_key(&key, opts).await
    }

    /// List one page of `opts.index`, or of the created order when unset.
    pub async fn list(&self, opts: &ListOptions) -> Result<Vec<Entity>, DbError> {
        let key = opts
            .index
            .as_deref()
            .unwrap_or_else(|| self.model.default_list_index());

        self.list_key(key, opts).await
    }

    async fn list_key(&self, key: &str, opts: &ListOptions) -> Result<Vec<Entity>, DbError> {
        list::list_key(
            self.store.as_ref(),
            self.name(),
            &self.config.list,
            key,
            opts,
        )
        .await
    }

    //
    // Writes
    //

    /// Store a new entity. The id, created and modified fields are filled in
    /// when absent.
    pub async fn insert(&self, data: impl Into<Entity>) -> Result<Entity, DbError> {
        let mut entity = data.into();
        let fields = self.field_paths()?;

        if !entity.has(self.model.id_field()) {
            entity.set(self.model.id_field(), self.defaults.identifier());
        }
        let now = self.defaults.timestamp();
        if !entity.has(&fields.created) {
            entity.set(&fields.created, now);
        }
        if !entity.has(&fields.modified) {
            entity.set(&fields.modified, now);
        }

        let id = self.id_of(&entity)?;
        if self.store.hget(self.name(), &id).await?.is_some() {
            return Err(ConflictError {
                collection: self.name().to_string(),
                field: self.model.id_field().to_string(),
                value: id.clone(),
                owner: id,
            }
            .into());
        }
        enforce_unique(self.store.as_ref(), &self.model, &entity).await?;

        let mut batch = Batch::new();
        batch.hset(self.name(), &id, entity.to_record()?);
        let delta = index::index(&mut batch, &self.model, &entity)?;
        self.submit(ExecKind::Insert, batch, delta).await?;

        Ok(entity)
    }

    /// Replace the stored entity `id` with `data`. `None` when no record
    /// exists. The stored created timestamp is kept unless `data` sets one.
    pub async fn replace(
        &self,
        id: &str,
        data: impl Into<Entity>,
    ) -> Result<Option<Entity>, DbError> {
        let Some(orig) = self.get(id).await? else {
            return Ok(None);
        };
        let fields = self.field_paths()?;

        let mut entity = data.into();
        entity.set(self.model.id_field(), id);
        if !entity.has(&fields.created)
            && let Some(created) = orig.get(&fields.created)
        {
            entity.set(&fields.created, created.clone());
        }
        entity.set(&fields.modified, self.defaults.timestamp());

        self.rewrite(ExecKind::Replace, entity, &orig).await.map(Some)
    }

    /// Merge `partial` into the stored entity `id`. `None` when no record
    /// exists. Changes to the id field are ignored.
    pub async fn patch(
        &self,
        id: &str,
        partial: &Map<String, Value>,
    ) -> Result<Option<Entity>, DbError> {
        let Some(orig) = self.get(id).await? else {
            return Ok(None);
        };
        let fields = self.field_paths()?;

        let mut entity = orig.clone();
        entity.merge(partial);
        entity.set(self.model.id_field(), id);
        entity.set(&fields.modified, self.defaults.timestamp());

        self.rewrite(ExecKind::Patch, entity, &orig).await.map(Some)
    }

    /// Remove the entity `id` and its index entries. `false` when no record
    /// exists.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let Some(orig) = self.get(id).await? else {
            return Ok(false);
        };

        let mut batch = Batch::new();
        batch.hdel(self.name(), id);
        let delta = index::deindex(&mut batch, &self.model, &orig)?;
        self.submit(ExecKind::Delete, batch, delta).await?;

        Ok(true)
    }

    //
    // Relations
    //

    /// Many-to-many relation with `other`, this collection on the left.
    pub fn intersects(&self, other: &Self) -> Result<Relation<S>, InternalError> {
        let model = RelationModel::between(&self.model, &other.model, &self.config.keys.separator)?;

        Ok(Relation::new(
            Arc::clone(&self.store),
            model,
            Arc::clone(&self.config),
            Arc::clone(&self.defaults),
        ))
    }

    //
    // Internals
    //

    async fn rewrite(
        &self,
        kind: ExecKind,
        entity: Entity,
        orig: &Entity,
    ) -> Result<Entity, DbError> {
        let id = self.id_of(&entity)?;
        enforce_unique(self.store.as_ref(), &self.model, &entity).await?;

        let mut batch = Batch::new();
        batch.hset(self.name(), &id, entity.to_record()?);
        let delta = index::reindex(&mut batch, &self.model, &entity, orig)?;
        self.submit(kind, batch, delta).await?;

        Ok(entity)
    }

    async fn submit(
        &self,
        kind: ExecKind,
        batch: Batch,
        delta: IndexDelta,
    ) -> Result<(), DbError> {
        let collection = self.name();
        sink::record(MetricsEvent::ExecStart { kind, collection });
        tracing::debug!(
            collection,
            ?kind,
            mutations = batch.len(),
            index_inserts = delta.inserts,
            index_removes = delta.removes,
            "submitting batch"
        );

        self.store.exec(batch).await?;
        sink::record(MetricsEvent::IndexDelta {
            collection,
            inserts: delta.inserts,
            removes: delta.removes,
        });

        Ok(())
    }

    fn id_of(&self, entity: &Entity) -> Result<String, InternalError> {
        self.model.id_of(entity).ok_or_else(|| {
            InternalError::index_invariant(format!(
                "'{}' entity has no usable '{}'",
                self.name(),
                self.model.id_field()
            ))
        })
    }

    fn field_paths(&self) -> Result<TimestampPaths, InternalError> {
        Ok(TimestampPaths {
            created: FieldPath::parse(self.config.fields.created.as_str())?,
            modified: FieldPath::parse(self.config.fields.modified.as_str())?,
        })
    }
}

struct TimestampPaths {
    created: FieldPath,
    modified: FieldPath,
}
