use crate::{entity::Entity, path::FieldPath, template::KeyExpr};
use std::fmt::{self, Display};

///
/// FieldSpec
///
/// Source of a hash field, hash value or sorted-set member: either a plain
/// field path or a key expression resolved against the same entity.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldSpec {
    Path(FieldPath),
    Expr(KeyExpr),
}

impl FieldSpec {
    #[must_use]
    pub fn resolve(&self, entity: &Entity) -> Option<String> {
        match self {
            Self::Path(path) => entity.scalar(path),
            Self::Expr(expr) => expr.resolve(entity),
        }
    }
}

impl From<FieldPath> for FieldSpec {
    fn from(path: FieldPath) -> Self {
        Self::Path(path)
    }
}

impl From<KeyExpr> for FieldSpec {
    fn from(expr: KeyExpr) -> Self {
        Self::Expr(expr)
    }
}

impl Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{path}"),
            Self::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

///
/// HashIndex
/// Lookup table: the hash named by `key` maps `field` to `value`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HashIndex {
    pub key: KeyExpr,
    pub field: FieldSpec,
    pub value: FieldSpec,
    pub unique: bool,
}

///
/// SortedSetIndex
/// Ordered membership: the sorted set named by `key` scores `member` by `score`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortedSetIndex {
    pub key: KeyExpr,
    pub score: FieldPath,
    pub member: FieldSpec,
}

///
/// IndexKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IndexKind {
    Hash(HashIndex),
    SortedSet(SortedSetIndex),
}

///
/// IndexDescriptor
///
/// Immutable runtime description of one derived index. The name is unique
/// within its entity model and only used for diagnostics and registration.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexDescriptor {
    pub name: String,
    pub kind: IndexKind,
}

impl IndexDescriptor {
    #[must_use]
    pub fn hash(name: impl Into<String>, index: HashIndex) -> Self {
        Self {
            name: name.into(),
            kind: IndexKind::Hash(index),
        }
    }

    #[must_use]
    pub fn sorted_set(name: impl Into<String>, index: SortedSetIndex) -> Self {
        Self {
            name: name.into(),
            kind: IndexKind::SortedSet(index),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &KeyExpr {
        match &self.kind {
            IndexKind::Hash(index) => &index.key,
            IndexKind::SortedSet(index) => &index.key,
        }
    }

    #[must_use]
    pub const fn is_unique(&self) -> bool {
        matches!(&self.kind, IndexKind::Hash(index) if index.unique)
    }
}

impl Display for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IndexKind::Hash(index) => {
                if index.unique {
                    f.write_str("UNIQUE ")?;
                }
                write!(
                    f,
                    "HASH {} {}({} -> {})",
                    self.name, index.key, index.field, index.value
                )
            }
            IndexKind::SortedSet(index) => write!(
                f,
                "ZSET {} {}({} by {})",
                self.name, index.key, index.member, index.score
            ),
        }
    }
}
