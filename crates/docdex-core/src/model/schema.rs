use serde::{Deserialize, Serialize};

///
/// Schema
///
/// Declared field configuration for one collection, in declaration order.
/// Loading schemas from disk is a caller concern; this type only needs to
/// deserialize.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    /// Overrides the configured identifier field.
    #[serde(default)]
    pub id_field: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            config,
        });
        self
    }

    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|decl| decl.name == name)
    }
}

///
/// FieldDecl
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name: String,

    #[serde(flatten)]
    pub config: FieldConfig,
}

///
/// FieldConfig
///
/// Indexing flags for one field. A field may carry several; each produces its
/// own descriptor.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct FieldConfig {
    pub unique: bool,
    pub secondary: bool,
    pub order: Option<OrderConfig>,
    pub reference: Option<String>,

    /// Score field for secondary and reference indexes.
    pub score: Option<String>,
}

impl FieldConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn secondary(mut self) -> Self {
        self.secondary = true;
        self
    }

    /// Order the collection by this field's own value.
    #[must_use]
    pub fn ordered(mut self) -> Self {
        self.order = Some(OrderConfig::Flag(true));
        self
    }

    /// Order the collection under this field's name, scored by another field.
    #[must_use]
    pub fn ordered_by(mut self, score_field: impl Into<String>) -> Self {
        self.order = Some(OrderConfig::By(score_field.into()));
        self
    }

    /// Index this field as a reference into `collection`.
    #[must_use]
    pub fn references(mut self, collection: impl Into<String>) -> Self {
        self.reference = Some(collection.into());
        self
    }

    #[must_use]
    pub fn scored_by(mut self, score_field: impl Into<String>) -> Self {
        self.score = Some(score_field.into());
        self
    }
}

///
/// OrderConfig
///
/// `true` scores by the field itself; a string names the score field.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderConfig {
    Flag(bool),
    By(String),
}
