// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// Database connection failed.
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),
    /// Initialization error.
    #[error("Initialization error: {0}")]
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    #[error("Foreign key enforcement is not enabled")]
    ForeignKeyEnforcementNotEnabled,
    /// The database is locked by another writer and the busy timeout elapsed.
    #[error("Database busy: {0}")]
    Busy(String),
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// The requested record was not found.
    #[error("{resource} {id} not found")]
    NotFound {
        /// The kind of record.
        resource: String,
        /// The identifier that did not resolve.
        id: i64,
    },
    /// A conditional write found a different version than the one loaded.
    #[error("{resource} {id} changed concurrently (expected version {expected_version})")]
    VersionConflict {
        /// The kind of record.
        resource: String,
        /// The record identifier.
        id: i64,
        /// The version the write was conditioned on.
        expected_version: i64,
    },
    /// A uniqueness constraint rejected a write.
    #[error("Uniqueness constraint violated: {0}")]
    UniqueViolation(String),
    /// A check, foreign key or append-only constraint rejected a write.
    #[error("Integrity constraint violated: {0}")]
    IntegrityViolation(String),
    /// A stored value could not be decoded into a domain value.
    #[error("Corrupt {resource} {id}: {detail}")]
    CorruptRecord {
        /// The kind of record.
        resource: String,
        /// The record identifier.
        id: i64,
        /// What could not be decoded.
        detail: String,
    },
    /// A write would remove entries from an append-only history.
    #[error("History of {resource} {id} would be rewritten: stored {stored}, given {given}")]
    HistoryRewrite {
        /// The kind of record.
        resource: String,
        /// The record identifier.
        id: i64,
        /// Number of stored entries.
        stored: usize,
        /// Number of entries in the record being written.
        given: usize,
    },
    /// A registration request is invalid.
    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),
    /// A registration change conflicts with stored state.
    #[error("Registration conflict: {0}")]
    RegistrationConflict(String),
}

impl PersistenceError {
    /// Returns true if repeating the operation from a fresh load may succeed.
    ///
    /// Constraint, version and decoding failures are not retryable: they
    /// describe the data, not the transport.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Busy(_) | Self::DatabaseError(_) | Self::QueryFailed(_)
        )
    }

    pub(crate) fn not_found(resource: &str, id: i64) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id,
        }
    }

    pub(crate) fn corrupt(resource: &str, id: i64, detail: impl std::fmt::Display) -> Self {
        Self::CorruptRecord {
            resource: resource.to_string(),
            id,
            detail: detail.to_string(),
        }
    }
}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound {
                resource: String::from("record"),
                id: 0,
            },
            diesel::result::Error::DatabaseError(kind, info) => {
                let message: String = info.message().to_string();
                match kind {
                    DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(message),
                    DatabaseErrorKind::CheckViolation
                    | DatabaseErrorKind::ForeignKeyViolation
                    | DatabaseErrorKind::NotNullViolation => Self::IntegrityViolation(message),
                    _ if message.contains("constraint failed")
                        || message.contains("append-only")
                        || message.contains("never deleted") =>
                    {
                        Self::IntegrityViolation(message)
                    }
                    _ if message.contains("locked") || message.contains("busy") => {
                        Self::Busy(message)
                    }
                    _ => Self::DatabaseError(message),
                }
            }
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
