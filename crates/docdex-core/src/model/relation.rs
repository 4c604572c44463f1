use crate::{
    error::InternalError,
    model::entity::EntityModel,
    path::FieldPath,
    template::{KeyTemplate, Segment},
};

///
/// RelationSide
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationSide {
    pub collection: String,
    pub id_field: FieldPath,
}

impl RelationSide {
    #[must_use]
    pub fn of(model: &EntityModel) -> Self {
        Self {
            collection: model.collection().to_string(),
            id_field: model.id_field().clone(),
        }
    }
}

///
/// RelationModel
///
/// Many-to-many association stored as two symmetric sorted sets:
/// `<left>:<left id>:<right>` holds right ids, `<right>:<right id>:<left>`
/// holds left ids.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationModel {
    left: RelationSide,
    right: RelationSide,
    rights_key: KeyTemplate,
    lefts_key: KeyTemplate,
}

impl RelationModel {
    #[must_use]
    pub fn new(left: RelationSide, right: RelationSide, separator: &str) -> Self {
        let rights_key = side_template(&left.collection, &right.collection, separator);
        let lefts_key = side_template(&right.collection, &left.collection, separator);

        Self {
            left,
            right,
            rights_key,
            lefts_key,
        }
    }

    /// Relation between two registered models. Rejected when either side's
    /// key could coincide with an index key of either model, since links and
    /// index entries would then share one sorted set.
    pub fn between(
        left: &EntityModel,
        right: &EntityModel,
        separator: &str,
    ) -> Result<Self, InternalError> {
        let relation = Self::new(RelationSide::of(left), RelationSide::of(right), separator);

        for model in [left, right] {
            for descriptor in model.indexes() {
                let key = descriptor.key().template();
                if key.same_shape(&relation.rights_key) || key.same_shape(&relation.lefts_key) {
                    return Err(InternalError::schema_conflict(format!(
                        "relation {} <-> {} shares its keys with index '{}' on '{}' ({})",
                        relation.left.collection,
                        relation.right.collection,
                        descriptor.name,
                        model.collection(),
                        descriptor.key()
                    )));
                }
            }
        }

        Ok(relation)
    }

    #[must_use]
    pub const fn left(&self) -> &RelationSide {
        &self.left
    }

    #[must_use]
    pub const fn right(&self) -> &RelationSide {
        &self.right
    }

    /// Key of the set holding the right ids linked to `left_id`.
    pub fn rights_key(&self, left_id: &str) -> Result<String, InternalError> {
        self.rights_key.fill(&[left_id])
    }

    /// Key of the set holding the left ids linked to `right_id`.
    pub fn lefts_key(&self, right_id: &str) -> Result<String, InternalError> {
        self.lefts_key.fill(&[right_id])
    }
}

fn side_template(owner: &str, other: &str, separator: &str) -> KeyTemplate {
    KeyTemplate::new([
        Segment::Literal(format!("{owner}{separator}")),
        Segment::Direct,
        Segment::Literal(format!("{separator}{other}")),
    ])
}
