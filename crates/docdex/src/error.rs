use derive_more::Display;
use docdex_core::{
    config::ConfigError,
    db::DbError,
    error::{ConflictError, ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
    store::StoreError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.kind, ErrorKind::Conflict)
    }
}

impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(err) => err.into(),
            DbError::Store(err) => err.into(),
            DbError::Internal(err) => err.into(),
        }
    }
}

impl From<ConflictError> for Error {
    fn from(err: ConflictError) -> Self {
        Self::new(ErrorKind::Conflict, ErrorOrigin::Unique, err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::new(ErrorKind::Store, ErrorOrigin::Store, err.to_string())
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match err.class {
            ErrorClass::Conflict => ErrorKind::Conflict,
            ErrorClass::NotFound | ErrorClass::Unsupported => ErrorKind::Invalid,
            ErrorClass::Corruption | ErrorClass::Internal | ErrorClass::InvariantViolation => {
                ErrorKind::Internal
            }
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Invalid, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// A uniquely indexed value already belongs to another entity.
    Conflict,

    /// The store backend failed; passed through unchanged.
    Store,

    /// The request names something undeclared or malformed.
    Invalid,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
/// Public origin taxonomy.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
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

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Index => Self::Index,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Relation => Self::Relation,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Serialize => Self::Serialize,
            CoreErrorOrigin::Store => Self::Store,
            CoreErrorOrigin::Template => Self::Template,
            CoreErrorOrigin::Unique => Self::Unique,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_keep_their_message() {
        let err: Error = DbError::Conflict(ConflictError {
            collection: "users".into(),
            field: "email".into(),
            value: "a@x.io".into(),
            owner: "u1".into(),
        })
        .into();

        assert!(err.is_conflict());
        assert_eq!(err.origin, ErrorOrigin::Unique);
        assert!(err.message.starts_with("email must be unique"));
    }

    #[test]
    fn internal_classes_map_to_kinds() {
        let unsupported =
            InternalError::new(ErrorClass::Unsupported, CoreErrorOrigin::Query, "no index");
        let broken =
            InternalError::new(ErrorClass::InvariantViolation, CoreErrorOrigin::Index, "bad");

        assert_eq!(Error::from(unsupported).kind, ErrorKind::Invalid);
        assert_eq!(Error::from(broken).kind, ErrorKind::Internal);
    }

    #[test]
    fn store_errors_pass_through() {
        let err = Error::from(DbError::Store(StoreError::Unavailable("down".into())));

        assert_eq!(err.kind, ErrorKind::Store);
        assert_eq!(err.message, "store unavailable: down");
    }
}
