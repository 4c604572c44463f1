//! Module: path
//! Responsibility: dotted field paths and deep reads over entity attributes.
//! Does not own: scalar projection of the value found (see `entity`).

use crate::error::InternalError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PATH_SEPARATOR: char = '.';

///
/// FieldPath
///
/// Dotted path into an entity's attribute tree (`profile.address.city`).
/// Every segment is non-empty. Resolution never errors; an absent
/// intermediate segment simply yields `None`.
///

#[derive(
    Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[display("{_0}")]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(String);

impl FieldPath {
    pub fn parse(raw: impl Into<String>) -> Result<Self, InternalError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(InternalError::schema_unsupported("field path is empty"));
        }
        if raw.split(PATH_SEPARATOR).any(str::is_empty) {
            return Err(InternalError::schema_unsupported(format!(
                "field path '{raw}' contains an empty segment"
            )));
        }

        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR)
    }

    /// Read the value addressed by this path, if every segment is present.
    #[must_use]
    pub fn resolve<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        let mut segments = self.segments();
        let mut current = root.get(segments.next()?)?;

        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        Some(current)
    }

    /// Write `value` at this path, creating intermediate objects as needed.
    /// A non-object intermediate is replaced by an object.
    pub fn assign(&self, root: &mut Map<String, Value>, value: Value) {
        let segments: Vec<&str> = self.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = root;
        for segment in parents {
            let slot = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(next) = slot else {
                return;
            };
            current = next;
        }

        current.insert((*last).to_string(), value);
    }
}

impl TryFrom<String> for FieldPath {
    type Error = InternalError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = InternalError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.0
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse(".a").is_err());
        assert!(FieldPath::parse("a.").is_err());
        assert!(FieldPath::parse("a.b").is_ok());
    }

    #[test]
    fn resolve_reads_nested_fields() {
        let root = object(json!({ "profile": { "address": { "city": "Oslo" } } }));
        let path = FieldPath::parse("profile.address.city").unwrap();

        assert_eq!(path.resolve(&root), Some(&json!("Oslo")));
    }

    #[test]
    fn resolve_yields_none_for_absent_or_scalar_intermediates() {
        let root = object(json!({ "profile": "flat", "other": {} }));

        assert_eq!(FieldPath::parse("profile.city").unwrap().resolve(&root), None);
        assert_eq!(FieldPath::parse("other.city").unwrap().resolve(&root), None);
        assert_eq!(FieldPath::parse("missing").unwrap().resolve(&root), None);
    }

    #[test]
    fn assign_creates_intermediate_objects() {
        let mut root = object(json!({ "profile": 3 }));
        FieldPath::parse("profile.address.city")
            .unwrap()
            .assign(&mut root, json!("Bergen"));

        assert_eq!(
            Value::Object(root),
            json!({ "profile": { "address": { "city": "Bergen" } } })
        );
    }

    #[test]
    fn serde_round_trips_through_plain_strings() {
        let path: FieldPath = serde_json::from_value(json!("a.b")).unwrap();
        assert_eq!(path.as_str(), "a.b");
        assert!(serde_json::from_value::<FieldPath>(json!("a..b")).is_err());
    }
}
