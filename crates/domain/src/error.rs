// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::unit::{OperationalState, UnitId, UnitKind};
use crate::user::UserId;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A role string does not name a known role.
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    /// A tenure status string is not recognized.
    #[error("Invalid tenure status: {0}")]
    InvalidTenureStatus(String),
    /// A unit kind string is not recognized.
    #[error("Invalid unit kind: {0}")]
    InvalidUnitKind(String),
    /// An operational state string is not recognized.
    #[error("Invalid operational state: {0}")]
    InvalidOperationalState(String),
    /// A document type string is not recognized.
    #[error("Invalid document type: {0}")]
    InvalidDocumentType(String),
    /// A document state string is not recognized.
    #[error("Invalid document state: {0}")]
    InvalidDocumentState(String),
    /// A payload field is missing or malformed.
    #[error("Invalid payload field '{field}': {message}")]
    InvalidPayload {
        /// The offending field.
        field: String,
        /// A human-readable description.
        message: String,
    },
    /// A date could not be parsed.
    #[error("Failed to parse date '{date_string}': {error}")]
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// An occupancy would end before it started.
    #[error("Occupancy of unit {unit} cannot end on {exited_on} before it began on {entered_on}")]
    InvalidOccupancyInterval {
        /// The unit.
        unit: UnitId,
        /// Entry date of the occupancy.
        entered_on: time::Date,
        /// The rejected exit date.
        exited_on: time::Date,
    },
    /// The unit already has an active occupant.
    #[error("Unit {unit} is already occupied by user {occupant}")]
    UnitAlreadyOccupied {
        /// The unit.
        unit: UnitId,
        /// The current occupant.
        occupant: UserId,
    },
    /// The unit has no active occupant.
    #[error("Unit {unit} has no active occupant")]
    UnitNotOccupied {
        /// The unit.
        unit: UnitId,
    },
    /// The user already holds an active occupancy of the same kind.
    #[error("User {user} already occupies {kind} unit {unit}; it must be vacated first")]
    OccupantAlreadyHoldsUnit {
        /// The user.
        user: UserId,
        /// The kind of resource.
        kind: UnitKind,
        /// The unit the user currently holds.
        unit: UnitId,
    },
    /// The unit's operational state does not accept a new occupant.
    #[error("Unit {unit} cannot be assigned while {state}")]
    UnitNotAssignable {
        /// The unit.
        unit: UnitId,
        /// The blocking state.
        state: OperationalState,
    },
    /// The requested operational state change is not allowed.
    #[error("Unit {unit} cannot move from {from} to {to}: {reason}")]
    InvalidOperationalStateChange {
        /// The unit.
        unit: UnitId,
        /// The current state.
        from: OperationalState,
        /// The requested state.
        to: OperationalState,
        /// Why the change is rejected.
        reason: String,
    },
    /// The user has been deactivated.
    #[error("User {0} is deactivated")]
    UserDeactivated(UserId),
    /// A unit's operational state disagrees with its occupancy record.
    #[error("Unit {unit} is {state} but current occupancy presence is {has_occupancy}")]
    OccupancyStateMismatch {
        /// The unit.
        unit: UnitId,
        /// The recorded operational state.
        state: OperationalState,
        /// Whether a current occupancy exists.
        has_occupancy: bool,
    },
    /// A user's unit reference disagrees with their tenure status.
    #[error("User {user} has {kind} reference {assigned:?} inconsistent with its tenure status")]
    BackReferenceMismatch {
        /// The user.
        user: UserId,
        /// The kind of resource.
        kind: UnitKind,
        /// The stored unit reference.
        assigned: Option<UnitId>,
    },
    /// A unit's occupant and that user's unit reference disagree.
    #[error("Unit {unit} and user {user} disagree about occupancy: {detail}")]
    OccupantPointerMismatch {
        /// The unit.
        unit: UnitId,
        /// The user.
        user: UserId,
        /// Which side disagrees.
        detail: String,
    },
}

impl DomainError {
    /// Returns true if this error indicates broken stored invariants rather
    /// than a caller mistake or a conflicting request.
    #[must_use]
    pub const fn is_consistency_violation(&self) -> bool {
        matches!(
            self,
            Self::OccupancyStateMismatch { .. }
                | Self::BackReferenceMismatch { .. }
                | Self::OccupantPointerMismatch { .. }
        )
    }

    /// Returns true if this error indicates a conflict with the current state
    /// of a unit or user.
    #[must_use]
    pub const fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::UnitAlreadyOccupied { .. }
                | Self::UnitNotOccupied { .. }
                | Self::OccupantAlreadyHoldsUnit { .. }
                | Self::UnitNotAssignable { .. }
                | Self::InvalidOperationalStateChange { .. }
                | Self::UserDeactivated(_)
        )
    }
}
