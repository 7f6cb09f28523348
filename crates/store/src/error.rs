//! Store Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use exn::ResultExt;
use solder_storage::error::Error as StorageError;

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Bad input; never worth retrying.
    #[display("validation failed: {_0}")]
    Validation(#[error(not(source))] String),
    /// Duplicate link or slug, or a delete blocked by rows still referencing the target.
    #[display("conflict: {_0}")]
    Conflict(#[error(not(source))] String),
    /// Missing entity, link or blob.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A manifest field had to be left out. Only raised inside manifest synthesis.
    #[display("partial data: {_0}")]
    PartialData(#[error(not(source))] String),
    /// Artifact storage failed; the storage error tree is kept as a child.
    #[display("artifact storage error: {_0}")]
    Storage(#[error(not(source))] String),
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A stored value could not be converted into its model type.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }

    /// Wrap an artifact storage failure, keeping the storage error tree as a
    /// child frame. Validation problems with the upload stay validation
    /// problems.
    #[track_caller]
    pub fn storage(err: StorageError) -> Error {
        use solder_storage::error::ErrorKind as Storage;
        let kind = match &*err {
            Storage::Validation(message) => Self::Validation(message.clone()),
            Storage::NotFound(path) => Self::NotFound(format!("artifact {}", path.display())),
            other => Self::Storage(other.to_string()),
        };
        err.raise(kind)
    }
}

/// Classify SQLx constraint failures into actionable kinds.
///
/// Unique violations raise `unique()`, foreign key violations raise
/// `foreign_key()`, and anything else is a plain
/// [`Database`](ErrorKind::Database) error.
pub(crate) trait SqlxResultExt<T> {
    fn or_constraint(
        self,
        unique: impl FnOnce() -> ErrorKind,
        foreign_key: impl FnOnce() -> ErrorKind,
    ) -> Result<T>;
}
impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    #[track_caller]
    fn or_constraint(
        self,
        unique: impl FnOnce() -> ErrorKind,
        foreign_key: impl FnOnce() -> ErrorKind,
    ) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let kind = match &err {
                    sqlx::Error::Database(db) if db.is_unique_violation() => unique(),
                    sqlx::Error::Database(db) if db.is_foreign_key_violation() => foreign_key(),
                    _ => ErrorKind::Database,
                };
                Err(err).or_raise(|| kind)
            },
        }
    }
}

/// Foreign key failure on delete: the row is still referenced elsewhere.
pub(crate) fn still_referenced(kind: &str) -> impl FnOnce() -> ErrorKind + '_ {
    move || ErrorKind::Conflict(format!("{kind} is still referenced; unlink or delete its dependents first"))
}
