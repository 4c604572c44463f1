use thiserror::Error as ThisError;

///
/// StoreError
///
/// Failure reported by a store backend. Passed through the indexing layer
/// unchanged.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("WRONGTYPE operation against key '{key}' holding the wrong kind of value")]
    WrongType { key: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
