// Errors - what the query layer reports back
//
// Bad query parameters never show up here: they are corrected to defaults
// where they are parsed. What remains is what the caller has to decide on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A cascade create found no row matching the declared parent.
    #[error("{parent} not found")]
    ParentNotFound { parent: &'static str },

    /// Input rejected before reaching the store.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// Anything the store reports, passed through untouched.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A statement could not be built.
    #[error("query build error: {0}")]
    Query(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ParentNotFound { .. })
    }

    /// Unique or foreign key violation reported by SQLite.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::Store(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    pub(crate) fn required(field: &'static str) -> Self {
        Error::Invalid {
            field,
            reason: "must not be empty".to_string(),
        }
    }
}
