// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the engine boundary.

use quarters::CoreError;
use quarters_audit::AuditSinkError;
use quarters_persistence::PersistenceError;

/// Errors returned to callers of the engine.
///
/// The first four variants are caller-recoverable and never retried.
/// `ConsistencyViolation` indicates a bug or corrupted data and is never
/// retried. `Persistence` covers storage, audit sink and timeout failures;
/// every staged write has been rolled back when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Malformed or missing input.
    #[error("Invalid input for field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// A human-readable description.
        message: String,
    },
    /// The actor lacks the capability, edge role or party standing.
    #[error("Unauthorized: {action}: {reason}")]
    Authorization {
        /// The attempted action.
        action: String,
        /// Why it was denied.
        reason: String,
    },
    /// The request conflicts with the current state of a record.
    #[error("State conflict: {reason}")]
    StateConflict {
        /// What conflicted.
        reason: String,
    },
    /// A referenced record does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// The kind of record.
        resource: String,
        /// The identifier that did not resolve.
        id: i64,
    },
    /// A stored invariant is, or would be, broken.
    #[error("Consistency violation ({invariant}): {detail}")]
    ConsistencyViolation {
        /// The invariant concerned.
        invariant: String,
        /// Description of the violation.
        detail: String,
    },
    /// Storage, audit sink or deadline failure. Nothing was committed.
    #[error("Persistence failure: {message}")]
    Persistence {
        /// Description of the failure.
        message: String,
        /// Whether repeating the call may succeed.
        retryable: bool,
    },
}

impl EngineError {
    /// Returns true if the caller may repeat the request as is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence {
                retryable: true,
                ..
            }
        )
    }

    pub(crate) fn unauthorized(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Authorization {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

/// Translates a core error into an engine error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> EngineError {
    match err {
        CoreError::Validation { field, message } => EngineError::Validation { field, message },
        CoreError::Unauthorized { action, reason } => EngineError::Authorization { action, reason },
        CoreError::StateConflict { reason } => EngineError::StateConflict { reason },
        CoreError::NotFound { resource, id } => EngineError::NotFound { resource, id },
        CoreError::ConsistencyViolation { invariant, detail } => {
            EngineError::ConsistencyViolation { invariant, detail }
        }
    }
}

/// Translates a persistence error into an engine error.
///
/// Version conflicts and uniqueness violations mean another writer got
/// there first and are reported as state conflicts. Rejections by schema
/// constraints mean a planned change slipped past the core's checks and
/// are consistency violations.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> EngineError {
    match err {
        PersistenceError::NotFound { resource, id } => EngineError::NotFound { resource, id },
        PersistenceError::VersionConflict { .. }
        | PersistenceError::UniqueViolation(_)
        | PersistenceError::RegistrationConflict(_) => {
            EngineError::StateConflict {
                reason: err.to_string(),
            }
        }
        PersistenceError::IntegrityViolation(_) => EngineError::ConsistencyViolation {
            invariant: String::from("storage-constraint"),
            detail: err.to_string(),
        },
        PersistenceError::HistoryRewrite { .. } => EngineError::ConsistencyViolation {
            invariant: String::from("append-only-history"),
            detail: err.to_string(),
        },
        PersistenceError::CorruptRecord { .. } => EngineError::ConsistencyViolation {
            invariant: String::from("decodable-record"),
            detail: err.to_string(),
        },
        PersistenceError::InvalidRegistration(message) => EngineError::Validation {
            field: String::from("registration"),
            message,
        },
        other => EngineError::Persistence {
            retryable: other.is_retryable(),
            message: other.to_string(),
        },
    }
}

/// Translates an audit sink failure into an engine error.
#[must_use]
pub fn translate_sink_error(err: AuditSinkError) -> EngineError {
    let retryable: bool = matches!(err, AuditSinkError::Unavailable(_));
    EngineError::Persistence {
        message: err.to_string(),
        retryable,
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        translate_core_error(err)
    }
}

impl From<PersistenceError> for EngineError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

impl From<AuditSinkError> for EngineError {
    fn from(err: AuditSinkError) -> Self {
        translate_sink_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict_is_a_state_conflict() {
        let err = translate_persistence_error(PersistenceError::VersionConflict {
            resource: String::from("unit"),
            id: 4,
            expected_version: 2,
        });
        assert!(matches!(err, EngineError::StateConflict { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_busy_database_is_retryable() {
        let err = translate_persistence_error(PersistenceError::Busy(String::from("locked")));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_integrity_violation_is_escalated() {
        let err = translate_persistence_error(PersistenceError::IntegrityViolation(
            String::from("CHECK constraint failed"),
        ));
        assert!(matches!(err, EngineError::ConsistencyViolation { .. }));
    }

    #[test]
    fn test_sink_errors() {
        assert!(translate_sink_error(AuditSinkError::Unavailable(String::from("down"))).is_retryable());
        assert!(!translate_sink_error(AuditSinkError::Poisoned(String::from("panic"))).is_retryable());
    }
}
