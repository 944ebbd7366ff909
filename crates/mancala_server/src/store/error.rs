//! Store error types.

use derive_more::{Display, Error};

/// Category of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreErrorKind {
    /// A conditional write lost against a concurrent writer.
    #[display("conflict")]
    Conflict,
    /// An insert collided with an existing unique key.
    #[display("duplicate")]
    Duplicate,
    /// Anything else from the backend.
    #[display("backend")]
    Backend,
}

/// Store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store {} error: {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// Failure category.
    pub kind: StoreErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Backend failure.
    #[track_caller]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Backend, message)
    }

    /// Lost compare-and-swap.
    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Conflict, message)
    }

    /// Unique key collision.
    #[track_caller]
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Duplicate, message)
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::duplicate(format!("Unique constraint violated: {}", info.message()))
            }
            other => Self::backend(format!("Diesel error: {}", other)),
        }
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::backend(format!("Connection error: {}", err))
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::backend(format!("Corrupt record: {}", err))
    }
}
