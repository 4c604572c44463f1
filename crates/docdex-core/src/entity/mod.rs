//! Module: entity
//! Responsibility: read-only entity snapshots and the scalar projections that
//! index keys, hash fields, members and scores are built from.
//! Does not own: validation or defaults (lifecycle collaborators).

mod patch;


use crate::{error::InternalError, path::FieldPath};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use patch::merge_patch;

///
/// Entity
///
/// Point-in-time copy of one entity's attributes. Index maintenance reads
/// snapshots only; it never mutates them.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    #[must_use]
    pub const fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Deep read of the value at `path`.
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(&self.0)
    }

    /// True when `path` resolves to a non-null value.
    #[must_use]
    pub fn has(&self, path: &FieldPath) -> bool {
        self.get(path).is_some_and(|value| !value.is_null())
    }

    /// Textual projection of the value at `path`, or `None` when the value is
    /// absent or not indexable.
    #[must_use]
    pub fn scalar(&self, path: &FieldPath) -> Option<String> {
        self.get(path).and_then(scalar_text)
    }

    /// Numeric projection of the value at `path` for use as a sorted-set score.
    ///
    /// Absent and null values yield `Ok(None)`; present values that cannot be
    /// read as a finite number are rejected.
    pub fn score(&self, path: &FieldPath) -> Result<Option<f64>, InternalError> {
        let Some(value) = self.get(path) else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }

        scalar_score(value).map(Some).ok_or_else(|| {
            InternalError::index_unsupported(format!(
                "score field '{path}' does not hold a finite number: {value}"
            ))
        })
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    pub fn set(&mut self, path: &FieldPath, value: impl Into<Value>) {
        path.assign(&mut self.0, value.into());
    }

    /// Apply a JSON merge patch on top of this snapshot.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        merge_patch(&mut self.0, patch);
    }

    /// Encode the primary record payload.
    pub fn to_record(&self) -> Result<String, InternalError> {
        serde_json::to_string(&self.0).map_err(|err| {
            InternalError::serialize_internal(format!("entity encode failed: {err}"))
        })
    }

    /// Decode a primary record payload.
    pub fn from_record(record: &str) -> Result<Self, InternalError> {
        let value: Value = serde_json::from_str(record).map_err(|err| {
            InternalError::serialize_corruption(format!("entity record decode failed: {err}"))
        })?;

        Self::try_from(value)
    }
}

impl TryFrom<Value> for Entity {
    type Error = InternalError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(attributes) => Ok(Self(attributes)),
            other => Err(InternalError::serialize_corruption(format!(
                "entity must be a JSON object, found {}",
                value_kind(&other)
            ))),
        }
    }
}

impl From<Map<String, Value>> for Entity {
    fn from(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        entity.into_value()
    }
}

/// Textual projection used for keys, hash fields and members.
///
/// Strings are copied verbatim, numbers and booleans use their canonical JSON
/// text. Null, arrays and objects are not indexable.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric projection used for sorted-set scores.
#[must_use]
pub fn scalar_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    score.is_finite().then_some(score)
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
