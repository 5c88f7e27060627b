// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    District, DomainError, Occupancy, OccupancyRecord, OperationalState, Role, TenureStatus,
    Unit, UnitId, UnitKind, User, UserId, verify_pair, verify_unit, verify_user,
};
use time::macros::date;

fn create_test_unit(occupant: Option<i64>) -> Unit {
    let mut occupancy = OccupancyRecord::vacant();
    let mut operational_state = OperationalState::Available;
    if let Some(user) = occupant {
        occupancy
            .open(
                UnitId::new(1),
                Occupancy::new(UserId::new(user), date!(2026 - 01 - 01), None, None),
            )
            .unwrap();
        operational_state = OperationalState::Occupied;
    }

    Unit {
        id: UnitId::new(1),
        kind: UnitKind::Housing,
        code: String::from("K01"),
        district: District::new("Norte"),
        description: String::from("Two-bedroom"),
        operational_state,
        occupancy,
        version: 1,
    }
}

fn create_test_user(assigned: Option<i64>) -> User {
    User {
        id: UserId::new(7),
        display_name: String::from("U1"),
        role: Role::Applicant,
        district: None,
        housing_status: if assigned.is_some() {
            TenureStatus::Active
        } else {
            TenureStatus::None
        },
        lodging_status: TenureStatus::None,
        assigned_housing_unit: assigned.map(UnitId::new),
        assigned_lodging_unit: None,
        is_active: true,
        version: 1,
    }
}

#[test]
fn test_consistent_pair_passes() {
    let unit = create_test_unit(Some(7));
    let user = create_test_user(Some(1));

    assert!(verify_unit(&unit).is_ok());
    assert!(verify_user(&user).is_ok());
    assert!(verify_pair(&unit, &user).is_ok());
}

#[test]
fn test_occupied_state_without_occupancy_is_detected() {
    let mut unit = create_test_unit(None);
    unit.operational_state = OperationalState::Occupied;

    assert!(matches!(
        verify_unit(&unit),
        Err(DomainError::OccupancyStateMismatch {
            has_occupancy: false,
            ..
        })
    ));
}

#[test]
fn test_status_without_reference_is_detected() {
    let mut user = create_test_user(None);
    user.housing_status = TenureStatus::Pending;

    let error = verify_user(&user).unwrap_err();

    assert!(error.is_consistency_violation());
    assert_eq!(
        error,
        DomainError::BackReferenceMismatch {
            user: UserId::new(7),
            kind: UnitKind::Housing,
            assigned: None,
        }
    );
}

#[test]
fn test_one_sided_pointer_is_detected() {
    let unit = create_test_unit(Some(7));
    let user = create_test_user(None);

    assert!(matches!(
        verify_pair(&unit, &user),
        Err(DomainError::OccupantPointerMismatch { .. })
    ));

    let unit = create_test_unit(None);
    let user = create_test_user(Some(1));
    assert!(matches!(
        verify_pair(&unit, &user),
        Err(DomainError::OccupantPointerMismatch { .. })
    ));
}

#[test]
fn test_unrelated_pair_passes() {
    let unit = create_test_unit(Some(99));
    let user = create_test_user(None);

    assert!(verify_pair(&unit, &user).is_ok());
}
