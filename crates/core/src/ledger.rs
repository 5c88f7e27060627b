// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The occupancy ledger.
//!
//! These primitives are the only code that changes a unit's occupancy, the
//! `occupied`/`available` operational states, or a user's unit reference
//! and tenure status. They work on copies: the inputs are never modified,
//! and a returned change is complete and verified or not returned at all.

use crate::error::{CoreError, translate_domain_error};
use quarters_domain::{
    DomainError, Occupancy, OperationalState, Unit, User, verify_pair, verify_unit, verify_user,
};
use time::Date;
use tracing::debug;

/// Reason recorded when an occupant is displaced by a new assignment.
pub const DISPLACED_REASON: &str = "reassigned";

/// Parameters of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRequest {
    /// Date the occupancy starts.
    pub effective_date: Date,
    /// Expected vacate date.
    pub expected_vacate_date: Option<Date>,
    /// Reason recorded with the occupancy.
    pub reason: Option<String>,
    /// Allow closing the current occupant's occupancy first.
    pub displace: bool,
}

/// A verified occupancy change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerChange {
    /// The unit after the change.
    pub unit: Unit,
    /// The occupant (assigned or vacated) after the change.
    pub occupant: User,
    /// The displaced former occupant, if any.
    pub displaced: Option<User>,
}

fn verified(result: Result<(), DomainError>) -> Result<(), CoreError> {
    result.map_err(translate_domain_error)
}

fn verify_before(unit: &Unit, users: &[&User]) -> Result<(), CoreError> {
    verified(verify_unit(unit))?;
    for user in users {
        verified(verify_user(user))?;
        verified(verify_pair(unit, user))?;
    }
    Ok(())
}

fn verify_after(change: &LedgerChange) -> Result<(), CoreError> {
    verify_before(&change.unit, &[&change.occupant])?;
    if let Some(displaced) = &change.displaced {
        verified(verify_user(displaced))?;
        verified(verify_pair(&change.unit, displaced))?;
    }
    Ok(())
}

/// Assigns `occupant` to `unit`.
///
/// `current_occupant` must be the user the unit's current occupancy points
/// at, when there is one; it is only modified when `request.displace` is
/// set.
///
/// # Errors
///
/// * `StateConflict` if the unit does not accept assignment, is occupied
///   and displacement was not requested, or the occupant already holds a
///   unit of the same kind.
/// * `ConsistencyViolation` if the stored records already disagree, or the
///   supplied current occupant is not the unit's occupant.
pub fn assign(
    unit: &Unit,
    occupant: &User,
    current_occupant: Option<&User>,
    request: &AssignRequest,
) -> Result<LedgerChange, CoreError> {
    if !occupant.is_active {
        return Err(translate_domain_error(DomainError::UserDeactivated(
            occupant.id,
        )));
    }
    if !unit.operational_state.accepts_assignment() {
        return Err(translate_domain_error(DomainError::UnitNotAssignable {
            unit: unit.id,
            state: unit.operational_state,
        }));
    }
    if let Some(held) = occupant.assigned_unit(unit.kind) {
        return Err(translate_domain_error(DomainError::OccupantAlreadyHoldsUnit {
            user: occupant.id,
            kind: unit.kind,
            unit: held,
        }));
    }

    let mut new_unit: Unit = unit.clone();
    let mut displaced: Option<User> = None;

    if let Some(existing) = unit.occupancy.occupant() {
        if !request.displace {
            return Err(translate_domain_error(DomainError::UnitAlreadyOccupied {
                unit: unit.id,
                occupant: existing,
            }));
        }
        let former: &User = current_occupant
            .filter(|user| user.id == existing)
            .ok_or_else(|| CoreError::ConsistencyViolation {
                invariant: String::from("bidirectional-occupant-pointer"),
                detail: format!(
                    "unit {} is occupied by user {existing}, whose record was not supplied",
                    unit.id
                ),
            })?;
        verify_before(unit, &[former])?;

        new_unit
            .occupancy
            .close(unit.id, request.effective_date, DISPLACED_REASON)?;
        let mut former: User = former.clone();
        former.end_tenure(unit.kind);
        debug!(unit = %unit.id, displaced = %former.id, "Displacing current occupant");
        displaced = Some(former);
    } else {
        verify_before(unit, &[])?;
    }
    verified(verify_user(occupant))?;

    new_unit.occupancy.open(
        unit.id,
        Occupancy::new(
            occupant.id,
            request.effective_date,
            request.expected_vacate_date,
            request.reason.clone(),
        ),
    )?;
    new_unit.operational_state = OperationalState::Occupied;

    let mut new_occupant: User = occupant.clone();
    new_occupant.begin_tenure(unit.kind, unit.id);

    let change = LedgerChange {
        unit: new_unit,
        occupant: new_occupant,
        displaced,
    };
    verify_after(&change)?;
    Ok(change)
}

/// Vacates `occupant` from `unit`.
///
/// # Errors
///
/// * `StateConflict` if the unit has no occupant or `occupant` is not it.
/// * `ConsistencyViolation` if the stored records already disagree.
pub fn vacate(
    unit: &Unit,
    occupant: &User,
    exited_on: Date,
    reason: &str,
) -> Result<LedgerChange, CoreError> {
    let Some(current) = unit.occupancy.occupant() else {
        return Err(translate_domain_error(DomainError::UnitNotOccupied {
            unit: unit.id,
        }));
    };
    if current != occupant.id {
        return Err(CoreError::conflict(format!(
            "unit {} is occupied by user {current}, not user {}",
            unit.id, occupant.id
        )));
    }
    verify_before(unit, &[occupant])?;

    let mut new_unit: Unit = unit.clone();
    new_unit.occupancy.close(unit.id, exited_on, reason)?;
    new_unit.operational_state = OperationalState::Available;

    let mut new_occupant: User = occupant.clone();
    new_occupant.end_tenure(unit.kind);

    let change = LedgerChange {
        unit: new_unit,
        occupant: new_occupant,
        displaced: None,
    };
    verify_after(&change)?;
    Ok(change)
}

/// Flags the current occupancy's vacate reminder as sent.
///
/// Returns `Ok(None)` when the flag is already set.
///
/// # Errors
///
/// Returns `StateConflict` if the unit has no occupant, and
/// `ConsistencyViolation` if its stored state is inconsistent.
pub fn mark_reminder_sent(unit: &Unit) -> Result<Option<Unit>, CoreError> {
    verified(verify_unit(unit))?;
    let mut new_unit: Unit = unit.clone();
    if new_unit.occupancy.mark_reminder_sent(unit.id)? {
        Ok(Some(new_unit))
    } else {
        Ok(None)
    }
}

/// Changes a unit's operational state outside the occupancy workflow.
///
/// Returns `Ok(None)` when the unit is already in `state`.
///
/// # Errors
///
/// Returns `StateConflict` when the change would set or clear `occupied`
/// (including any change of an occupied unit, which covers decommissioning
/// while occupied) or would revive a decommissioned unit.
pub fn set_operational_state(
    unit: &Unit,
    state: OperationalState,
) -> Result<Option<Unit>, CoreError> {
    verified(verify_unit(unit))?;
    if unit.operational_state == state {
        return Ok(None);
    }

    let reject = |reason: &str| {
        translate_domain_error(DomainError::InvalidOperationalStateChange {
            unit: unit.id,
            from: unit.operational_state,
            to: state,
            reason: reason.to_string(),
        })
    };
    if state == OperationalState::Occupied {
        return Err(reject("occupancy is only established by an assignment"));
    }
    if unit.occupancy.is_occupied() {
        return Err(reject("the unit has a current occupant"));
    }
    if unit.operational_state == OperationalState::Decommissioned {
        return Err(reject("decommissioned units stay decommissioned"));
    }

    let mut new_unit: Unit = unit.clone();
    new_unit.operational_state = state;
    verified(verify_unit(&new_unit))?;
    Ok(Some(new_unit))
}
