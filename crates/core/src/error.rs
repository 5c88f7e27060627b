// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use quarters_domain::DomainError;

/// Errors that can occur while planning a document change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Malformed or missing input.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// A human-readable description.
        message: String,
    },
    /// The actor may not perform the action.
    #[error("Not authorized to {action}: {reason}")]
    Unauthorized {
        /// The attempted action.
        action: String,
        /// Why it was denied.
        reason: String,
    },
    /// The action conflicts with the current state of a record.
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
    /// Completing the change would break, or has found broken, a stored
    /// invariant.
    #[error("Consistency violation ({invariant}): {detail}")]
    ConsistencyViolation {
        /// The invariant concerned.
        invariant: String,
        /// Description of the violation.
        detail: String,
    },
}

impl CoreError {
    /// Shorthand for a `StateConflict`.
    #[must_use]
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::StateConflict {
            reason: reason.into(),
        }
    }

    /// Shorthand for an `Unauthorized`.
    #[must_use]
    pub fn unauthorized(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `NotFound`.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, id: i64) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }
}

/// Translates a domain error into the core taxonomy.
///
/// Parse and payload errors are validation failures, occupancy rule
/// failures are state conflicts, and invariant mismatches are consistency
/// violations.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> CoreError {
    if err.is_consistency_violation() {
        let invariant: &str = match &err {
            DomainError::OccupancyStateMismatch { .. } => "occupied-iff-current-occupancy",
            DomainError::BackReferenceMismatch { .. } => "reference-iff-tenure",
            _ => "bidirectional-occupant-pointer",
        };
        return CoreError::ConsistencyViolation {
            invariant: invariant.to_string(),
            detail: err.to_string(),
        };
    }

    if err.is_state_conflict() {
        return CoreError::StateConflict {
            reason: err.to_string(),
        };
    }

    let field: String = match &err {
        DomainError::InvalidPayload { field, .. } => field.clone(),
        DomainError::DateParseError { .. } => String::from("date"),
        DomainError::InvalidOccupancyInterval { .. } => String::from("effective_date"),
        DomainError::InvalidRole(_) => String::from("role"),
        _ => String::from("value"),
    };
    let message: String = match err {
        DomainError::InvalidPayload { message, .. } => message,
        other => other.to_string(),
    };
    CoreError::Validation { field, message }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}
