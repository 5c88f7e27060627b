// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{fixture, norte, occupy_in_db};
use crate::{Persistence, PersistenceError};
use quarters_domain::{OperationalState, Role, TenureStatus, UnitKind, UserId};

#[test]
fn test_registered_user_starts_without_tenure() {
    let mut db = Persistence::new_in_memory().unwrap();

    let user = db.register_user("  U1  ", Role::Applicant, None).unwrap();

    assert_eq!(user.display_name, "U1");
    assert_eq!(user.housing_status, TenureStatus::None);
    assert_eq!(user.lodging_status, TenureStatus::None);
    assert_eq!(user.assigned_housing_unit, None);
    assert!(user.is_active);
    assert_eq!(user.version, 1);
    assert_eq!(db.get_user(user.id).unwrap(), user);
}

#[test]
fn test_district_roles_require_a_district() {
    let mut db = Persistence::new_in_memory().unwrap();

    let missing = db.register_user("Inspector", Role::Inspector, None);
    assert!(matches!(
        missing,
        Err(PersistenceError::InvalidRegistration(_))
    ));

    let inspector = db
        .register_user("Inspector", Role::Inspector, Some(&norte()))
        .unwrap();
    assert_eq!(inspector.district, Some(norte()));
}

#[test]
fn test_unit_codes_are_unique_per_kind() {
    let mut db = Persistence::new_in_memory().unwrap();

    let unit = db
        .register_unit(UnitKind::Housing, "K01", &norte(), "")
        .unwrap();
    assert_eq!(unit.operational_state, OperationalState::Available);
    assert!(!unit.occupancy.is_occupied());

    let duplicate = db.register_unit(UnitKind::Housing, "K01", &norte(), "");
    assert!(matches!(duplicate, Err(PersistenceError::UniqueViolation(_))));

    let lodging = db.register_unit(UnitKind::Lodging, "K01", &norte(), "");
    assert!(lodging.is_ok());
    assert_eq!(
        db.find_unit_by_code(UnitKind::Housing, "K01").unwrap(),
        Some(unit)
    );
}

#[test]
fn test_deactivation_is_idempotent_and_keeps_the_user() {
    let mut db = Persistence::new_in_memory().unwrap();
    let user = db.register_user("U1", Role::Applicant, None).unwrap();

    let deactivated = db.deactivate_user(user.id).unwrap().unwrap();
    assert!(!deactivated.is_active);
    assert_eq!(deactivated.version, 2);

    assert_eq!(db.deactivate_user(user.id).unwrap(), None);
    assert!(!db.get_user(user.id).unwrap().is_active);
}

#[test]
fn test_unknown_user_is_not_found() {
    let mut db = Persistence::new_in_memory().unwrap();

    assert!(matches!(
        db.get_user(UserId::new(404)),
        Err(PersistenceError::NotFound { id: 404, .. })
    ));
    assert!(matches!(
        db.deactivate_user(UserId::new(404)),
        Err(PersistenceError::NotFound { .. })
    ));
}

#[test]
fn test_tenant_cannot_be_deactivated() {
    let mut f = fixture();
    let (_, tenant) = occupy_in_db(&mut f.db, &f.unit, &f.applicant);

    let result = f.db.deactivate_user(tenant.id);

    assert!(matches!(
        result,
        Err(PersistenceError::RegistrationConflict(_))
    ));
    let stored = f.db.get_user(tenant.id).unwrap();
    assert!(stored.is_active);
    assert_eq!(stored.version, tenant.version);
}

#[test]
fn test_bootstrap_only_registers_into_an_empty_store() {
    let mut db = Persistence::new_in_memory().unwrap();

    let first = db
        .bootstrap_first_user("Luis", Role::AdminGeneral, None)
        .unwrap();
    assert_eq!(first.role, Role::AdminGeneral);

    let second = db.bootstrap_first_user("Ana", Role::AdminGeneral, None);
    assert!(matches!(
        second,
        Err(PersistenceError::RegistrationConflict(_))
    ));
    assert_eq!(db.snapshot().unwrap().0, vec![first]);
}
