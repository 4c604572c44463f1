use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    /// Construct an InternalError from its classification and message.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a template-origin unsupported error (bad pattern or arity).
    pub(crate) fn template_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Template, message)
    }

    /// Construct a schema-origin unsupported error (bad declaration).
    pub(crate) fn schema_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Schema, message)
    }

    /// Construct a schema-origin conflict (duplicate registration).
    pub(crate) fn schema_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, ErrorOrigin::Schema, message)
    }

    /// Construct an index-origin unsupported error (unindexable value).
    pub(crate) fn index_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Index, message)
    }

    /// Construct an index-origin invariant violation.
    pub(crate) fn index_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Index, message)
    }

    /// Construct a relation-origin invariant violation.
    pub(crate) fn relation_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Relation, message)
    }

    /// Construct a query-origin unsupported error (unknown accessor field).
    pub(crate) fn query_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Query, message)
    }

    /// Construct a serialize-origin internal error.
    pub(crate) fn serialize_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Serialize, message)
    }

    /// Construct a serialize-origin corruption error.
    pub(crate) fn serialize_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Serialize, message)
    }

    /// Construct a standardized unregistered-collection error.
    pub fn unknown_collection(collection: impl AsRef<str>) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Schema,
            format!("collection not registered: '{}'", collection.as_ref()),
        )
    }
}

///
/// ConflictError
///
/// A write would give a uniquely indexed value to a second entity.
/// Raised before any store mutation is attempted.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{field} must be unique ({collection}: '{value}' already belongs to '{owner}')")]
pub struct ConflictError {
    pub collection: String,
    pub field: String,
    pub value: String,
    pub owner: String,
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Corruption,
    NotFound,
    Internal,
    Conflict,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Conflict => "conflict",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Index,
    Query,
    Relation,
    Schema,
    Serialize,
    Store,
    Template,
    Unique,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Index => "index",
            Self::Query => "query",
            Self::Relation => "relation",
            Self::Schema => "schema",
            Self::Serialize => "serialize",
            Self::Store => "store",
            Self::Template => "template",
            Self::Unique => "unique",
        };
        write!(f, "{label}")
    }
}
