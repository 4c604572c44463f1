use crate::{
    config::DocdexConfig,
    entity::Entity,
    error::InternalError,
    model::{
        index::{FieldSpec, HashIndex, IndexDescriptor, IndexKind, SortedSetIndex},
        schema::{OrderConfig, Schema},
    },
    path::FieldPath,
    template::{KeyExpr, KeyTemplate, Segment, TemplateArg},
};
use std::collections::BTreeMap;

///
/// EntityModel
///
/// Runtime model for one collection: identifier field, ordered index
/// descriptors, and the accessor maps that back the generic
/// get-by-unique-field and list-by-secondary-field operations.
///

#[derive(Clone, Debug)]
pub struct EntityModel {
    collection: String,
    id_field: FieldPath,
    indexes: Vec<IndexDescriptor>,
    unique_fields: BTreeMap<String, usize>,
    secondary_fields: BTreeMap<String, usize>,
    default_list_index: String,
}

impl EntityModel {
    pub fn builder(
        collection: impl Into<String>,
        config: &DocdexConfig,
    ) -> Result<EntityModelBuilder, InternalError> {
        EntityModelBuilder::new(collection, config)
    }

    /// Build a model by walking a declared schema.
    ///
    /// Every flagged field becomes one descriptor per flag. The configured
    /// `created` and `modified` fields get an ordered index unless the schema
    /// declares them itself.
    pub fn from_schema(
        collection: impl Into<String>,
        schema: &Schema,
        config: &DocdexConfig,
    ) -> Result<Self, InternalError> {
        let mut builder = EntityModelBuilder::new(collection, config)?;

        if let Some(id_field) = &schema.id_field {
            builder = builder.id_field(id_field)?;
        }

        for decl in &schema.fields {
            let name = decl.name.as_str();
            let field = &decl.config;
            let score = field.score.as_deref();

            if field.unique {
                builder = builder.index_unique(name)?;
            }
            if field.secondary {
                builder = builder.index_secondary(name, score)?;
            }
            match &field.order {
                Some(OrderConfig::Flag(true)) => builder = builder.index_order(name)?,
                Some(OrderConfig::By(score_field)) => {
                    builder = builder.index_order_by(name, score_field)?;
                }
                Some(OrderConfig::Flag(false)) | None => {}
            }
            if let Some(target) = &field.reference {
                builder = builder.index_reference(name, target, score)?;
            }
        }

        for timestamp in [&config.fields.created, &config.fields.modified] {
            if !schema.declares(timestamp) {
                builder = builder.index_order(timestamp)?;
            }
        }

        Ok(builder.build())
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub const fn id_field(&self) -> &FieldPath {
        &self.id_field
    }

    #[must_use]
    pub fn indexes(&self) -> &[IndexDescriptor] {
        &self.indexes
    }

    /// Sorted set listed when no index is requested (`<collection>:created`).
    #[must_use]
    pub fn default_list_index(&self) -> &str {
        &self.default_list_index
    }

    #[must_use]
    pub fn id_of(&self, entity: &Entity) -> Option<String> {
        entity.scalar(&self.id_field)
    }

    /// Hash index backing `get_by(field, ..)`.
    #[must_use]
    pub fn unique_index(&self, field: &str) -> Option<&HashIndex> {
        let pos = *self.unique_fields.get(field)?;
        match &self.indexes.get(pos)?.kind {
            IndexKind::Hash(index) => Some(index),
            IndexKind::SortedSet(_) => None,
        }
    }

    /// Sorted-set index backing `list_by(field, ..)`.
    #[must_use]
    pub fn secondary_index(&self, field: &str) -> Option<&SortedSetIndex> {
        let pos = *self.secondary_fields.get(field)?;
        match &self.indexes.get(pos)?.kind {
            IndexKind::SortedSet(index) => Some(index),
            IndexKind::Hash(_) => None,
        }
    }

    /// Every uniquely constrained hash index, in declaration order.
    pub fn unique_indexes(&self) -> impl Iterator<Item = &HashIndex> {
        self.indexes.iter().filter_map(|descriptor| match &descriptor.kind {
            IndexKind::Hash(index) if index.unique => Some(index),
            _ => None,
        })
    }
}

///
/// EntityModelBuilder
///
/// Registration-time declarations. Called once per collection at setup.
///

#[derive(Debug)]
pub struct EntityModelBuilder {
    collection: String,
    separator: String,
    id_field: FieldPath,
    created: FieldPath,
    modified: FieldPath,
    indexes: Vec<IndexDescriptor>,
    unique_fields: BTreeMap<String, usize>,
    secondary_fields: BTreeMap<String, usize>,
}

impl EntityModelBuilder {
    pub fn new(
        collection: impl Into<String>,
        config: &DocdexConfig,
    ) -> Result<Self, InternalError> {
        let collection = collection.into();
        if collection.is_empty() {
            return Err(InternalError::schema_unsupported("collection name is empty"));
        }

        Ok(Self {
            collection,
            separator: config.keys.separator.clone(),
            id_field: FieldPath::parse(config.fields.id.as_str())?,
            created: FieldPath::parse(config.fields.created.as_str())?,
            modified: FieldPath::parse(config.fields.modified.as_str())?,
            indexes: Vec::new(),
            unique_fields: BTreeMap::new(),
            secondary_fields: BTreeMap::new(),
        })
    }

    /// Override the identifier field. Must precede index declarations, which
    /// capture the identifier as their member or value.
    pub fn id_field(mut self, field: &str) -> Result<Self, InternalError> {
        self.id_field = FieldPath::parse(field)?;
        Ok(self)
    }

    /// Register an arbitrary descriptor.
    pub fn define_index(mut self, descriptor: IndexDescriptor) -> Result<Self, InternalError> {
        self.push(descriptor)?;
        Ok(self)
    }

    /// `<collection>:<field>` hash mapping the field's value to the id.
    pub fn index_unique(mut self, field: &str) -> Result<Self, InternalError> {
        let path = FieldPath::parse(field)?;
        let descriptor = IndexDescriptor::hash(
            format!("unique:{field}"),
            HashIndex {
                key: KeyExpr::literal(self.join(&[self.collection.as_str(), field])),
                field: FieldSpec::Path(path),
                value: FieldSpec::Path(self.id_field.clone()),
                unique: true,
            },
        );

        let pos = self.push(descriptor)?;
        self.unique_fields.insert(field.to_string(), pos);
        Ok(self)
    }

    /// `<collection>:<field>:<value>` sorted set of ids, scored by
    /// `score_field` (default: the modified timestamp).
    pub fn index_secondary(
        mut self,
        field: &str,
        score_field: Option<&str>,
    ) -> Result<Self, InternalError> {
        let path = FieldPath::parse(field)?;
        let score = Self::score_or(score_field, &self.modified)?;
        let prefix = format!("{}{}", self.join(&[self.collection.as_str(), field]), self.separator);
        let key = KeyExpr::new(
            KeyTemplate::new([Segment::Literal(prefix), Segment::Deref]),
            vec![TemplateArg::path(path)],
        )?;
        let descriptor = IndexDescriptor::sorted_set(
            format!("secondary:{field}"),
            SortedSetIndex {
                key,
                score,
                member: FieldSpec::Path(self.id_field.clone()),
            },
        );

        let pos = self.push(descriptor)?;
        self.secondary_fields.insert(field.to_string(), pos);
        Ok(self)
    }

    /// `<target>:<value>:<collection>` sorted set of ids referencing one
    /// target entity, scored by `score_field` (default: the created timestamp).
    pub fn index_reference(
        mut self,
        field: &str,
        target: &str,
        score_field: Option<&str>,
    ) -> Result<Self, InternalError> {
        if target.is_empty() {
            return Err(InternalError::schema_unsupported(format!(
                "reference field '{field}' names an empty collection"
            )));
        }

        let path = FieldPath::parse(field)?;
        let score = Self::score_or(score_field, &self.created)?;
        let key = KeyExpr::new(
            KeyTemplate::new([
                Segment::Literal(format!("{target}{}", self.separator)),
                Segment::Deref,
                Segment::Literal(format!("{}{}", self.separator, self.collection)),
            ]),
            vec![TemplateArg::path(path)],
        )?;
        let descriptor = IndexDescriptor::sorted_set(
            format!("reference:{field}"),
            SortedSetIndex {
                key,
                score,
                member: FieldSpec::Path(self.id_field.clone()),
            },
        );

        self.push(descriptor)?;
        Ok(self)
    }

    /// `<collection>:<score_field>` sorted set of every id, scored by the
    /// field itself.
    pub fn index_order(self, score_field: &str) -> Result<Self, InternalError> {
        self.index_order_by(score_field, score_field)
    }

    /// `<collection>:<field>` sorted set of every id, scored by `score_field`.
    pub fn index_order_by(mut self, field: &str, score_field: &str) -> Result<Self, InternalError> {
        let score = FieldPath::parse(score_field)?;
        let descriptor = IndexDescriptor::sorted_set(
            format!("order:{field}"),
            SortedSetIndex {
                key: KeyExpr::literal(self.join(&[self.collection.as_str(), field])),
                score,
                member: FieldSpec::Path(self.id_field.clone()),
            },
        );

        self.push(descriptor)?;
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> EntityModel {
        let default_list_index = self.join(&[self.collection.as_str(), self.created.as_str()]);

        EntityModel {
            collection: self.collection,
            id_field: self.id_field,
            indexes: self.indexes,
            unique_fields: self.unique_fields,
            secondary_fields: self.secondary_fields,
            default_list_index,
        }
    }

    fn push(&mut self, descriptor: IndexDescriptor) -> Result<usize, InternalError> {
        if self.indexes.iter().any(|d| d.name == descriptor.name) {
            return Err(InternalError::schema_conflict(format!(
                "index '{}' already declared on '{}'",
                descriptor.name, self.collection
            )));
        }
        if let Some(existing) = self
            .indexes
            .iter()
            .find(|d| d.key().template().same_shape(descriptor.key().template()))
        {
            return Err(InternalError::schema_conflict(format!(
                "index '{}' on '{}' would share the key '{}' with '{}'",
                descriptor.name,
                self.collection,
                descriptor.key(),
                existing.name
            )));
        }

        self.indexes.push(descriptor);
        Ok(self.indexes.len() - 1)
    }

    fn join(&self, parts: &[&str]) -> String {
        parts.join(&self.separator)
    }

    fn score_or(
        score_field: Option<&str>,
        fallback: &FieldPath,
    ) -> Result<FieldPath, InternalError> {
        score_field.map_or_else(|| Ok(fallback.clone()), FieldPath::parse)
    }
}
