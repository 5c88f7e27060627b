// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Occupancy consistency checks.
//!
//! These functions never mutate. They are run against every unit and user
//! touched by a planned change before it is persisted, and by the
//! full-database consistency scan.

use crate::error::DomainError;
use crate::unit::{OperationalState, Unit};
use crate::user::User;

/// Checks that a unit's operational state agrees with its occupancy.
///
/// # Errors
///
/// Returns `DomainError::OccupancyStateMismatch` if the unit is `Occupied`
/// without a current occupancy or has a current occupancy while in any
/// other state.
pub fn verify_unit(unit: &Unit) -> Result<(), DomainError> {
    let has_occupancy = unit.occupancy.is_occupied();
    let marked_occupied = unit.operational_state == OperationalState::Occupied;
    if has_occupancy == marked_occupied {
        Ok(())
    } else {
        Err(DomainError::OccupancyStateMismatch {
            unit: unit.id,
            state: unit.operational_state,
            has_occupancy,
        })
    }
}

/// Checks that each of a user's unit references agrees with its tenure status.
///
/// # Errors
///
/// Returns `DomainError::BackReferenceMismatch` for the first kind whose
/// reference and status disagree.
pub fn verify_user(user: &User) -> Result<(), DomainError> {
    for kind in crate::unit::UnitKind::ALL {
        let assigned = user.assigned_unit(kind);
        if assigned.is_some() != user.status(kind).holds_unit() {
            return Err(DomainError::BackReferenceMismatch {
                user: user.id,
                kind,
                assigned,
            });
        }
    }
    Ok(())
}

/// Checks both directions of the occupant pointer between a unit and a user.
///
/// Only meaningful when either side points at the other; unrelated pairs
/// pass trivially.
///
/// # Errors
///
/// Returns `DomainError::OccupantPointerMismatch` when exactly one side
/// points at the other.
pub fn verify_pair(unit: &Unit, user: &User) -> Result<(), DomainError> {
    let unit_points_at_user = unit.is_occupied_by(user.id);
    let user_points_at_unit = user.assigned_unit(unit.kind) == Some(unit.id);

    match (unit_points_at_user, user_points_at_unit) {
        (true, false) => Err(DomainError::OccupantPointerMismatch {
            unit: unit.id,
            user: user.id,
            detail: format!("user does not reference the {} unit", unit.kind),
        }),
        (false, true) => Err(DomainError::OccupantPointerMismatch {
            unit: unit.id,
            user: user.id,
            detail: String::from("unit is not occupied by the user"),
        }),
        _ => Ok(()),
    }
}
