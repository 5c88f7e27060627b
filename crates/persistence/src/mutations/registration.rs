// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Administrative registration.
//!
//! Registration happens outside the workflow engine: new users start with
//! no tenure, new units start available and unoccupied. Neither path can
//! create occupancy.

use diesel::SqliteConnection;
use diesel::prelude::*;
use quarters_domain::{District, Role, TenureStatus, Unit, UnitKind, User, UserId};
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{NewUnitRow, NewUserRow};
use crate::diesel_schema::{units, users};
use crate::error::PersistenceError;
use crate::mutations::records::write_user;
use crate::queries;

/// Registers a new user with no tenure.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `display_name` - The user's display name
/// * `role` - The user's role
/// * `district` - Required for inspectors and district chiefs
///
/// # Errors
///
/// Returns `InvalidRegistration` if the name is blank or a district-scoped
/// role has no district.
pub fn register_user(
    conn: &mut SqliteConnection,
    display_name: &str,
    role: Role,
    district: Option<&District>,
) -> Result<User, PersistenceError> {
    let display_name: &str = display_name.trim();
    if display_name.is_empty() {
        return Err(PersistenceError::InvalidRegistration(String::from(
            "display name must not be empty",
        )));
    }
    let district: Option<&str> = district.map(District::as_str).filter(|d| !d.is_empty());
    if role.requires_district() && district.is_none() {
        return Err(PersistenceError::InvalidRegistration(format!(
            "role '{role}' requires a district"
        )));
    }

    diesel::insert_into(users::table)
        .values(NewUserRow {
            display_name,
            role: role.as_str(),
            district,
        })
        .execute(conn)?;
    let user_id: i64 = get_last_insert_rowid(conn)?;

    info!(user_id, role = %role, "Registered user");
    queries::users::load_user(conn, UserId::new(user_id))
}

/// Registers a new, available unit.
///
/// # Errors
///
/// Returns `InvalidRegistration` if the code or district is blank, and
/// `UniqueViolation` if a unit of the same kind already carries the code.
pub fn register_unit(
    conn: &mut SqliteConnection,
    kind: UnitKind,
    code: &str,
    district: &District,
    description: &str,
) -> Result<Unit, PersistenceError> {
    let code: &str = code.trim();
    if code.is_empty() {
        return Err(PersistenceError::InvalidRegistration(String::from(
            "unit code must not be empty",
        )));
    }
    if district.as_str().is_empty() {
        return Err(PersistenceError::InvalidRegistration(String::from(
            "unit district must not be empty",
        )));
    }

    diesel::insert_into(units::table)
        .values(NewUnitRow {
            kind: kind.as_str(),
            code,
            district: district.as_str(),
            description,
        })
        .execute(conn)?;
    let unit_id: i64 = get_last_insert_rowid(conn)?;

    info!(unit_id, kind = %kind, code, "Registered unit");
    queries::units::load_unit(conn, quarters_domain::UnitId::new(unit_id))
}

/// Registers the first user of an empty store.
///
/// # Errors
///
/// Returns `RegistrationConflict` if any user already exists, and the
/// errors of [`register_user`] otherwise.
pub fn bootstrap_first_user(
    conn: &mut SqliteConnection,
    display_name: &str,
    role: Role,
    district: Option<&District>,
) -> Result<User, PersistenceError> {
    let existing: i64 = users::table.count().get_result(conn)?;
    if existing > 0 {
        return Err(PersistenceError::RegistrationConflict(format!(
            "{existing} user(s) already registered"
        )));
    }
    register_user(conn, display_name, role, district)
}

/// Deactivates a user. Deactivated users keep their records and can no
/// longer act or be named titular of new documents, so a user holding a
/// unit must vacate it first.
///
/// Returns `Ok(None)` if the user was already inactive.
///
/// # Errors
///
/// Returns `NotFound` for an unknown user, `RegistrationConflict` while the
/// user holds a housing or lodging tenure, and `VersionConflict` if the
/// user changed concurrently.
pub fn deactivate_user(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<Option<User>, PersistenceError> {
    let mut user: User = queries::users::load_user(conn, user_id)?;
    if !user.is_active {
        return Ok(None);
    }
    if user.housing_status != TenureStatus::None || user.lodging_status != TenureStatus::None {
        return Err(PersistenceError::RegistrationConflict(format!(
            "user {user_id} still holds a tenure; vacate it first"
        )));
    }
    user.is_active = false;
    let written: User = write_user(conn, &user)?;

    info!(user_id = user_id.value(), "Deactivated user");
    Ok(Some(written))
}
